#![forbid(unsafe_code)]

//! Windowed frames-per-second estimate.

use std::time::{Duration, Instant};

/// Minimum span a published FPS value averages over.
pub const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Counts frames and republishes the average once per window.
///
/// Between windows [`fps`](Self::fps) keeps returning the last published
/// value; it is 0 until the first window closes.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    window_start: Instant,
    frames: u32,
    fps: f64,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self::with_window(now, FPS_WINDOW)
    }

    pub fn with_window(now: Instant, window: Duration) -> Self {
        Self {
            window,
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Record one frame at `now`. Returns the new average when a window
    /// closes.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window || elapsed.is_zero() {
            return None;
        }
        let ms = elapsed.as_millis().max(1) as f64;
        self.fps = f64::from(self.frames) * 1000.0 / ms;
        self.frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_until_first_window_closes() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::new(t0);
        for i in 1..10 {
            assert_eq!(fps.tick(t0 + Duration::from_millis(i * 40)), None);
        }
        assert_eq!(fps.fps(), 0.0);
    }

    #[test]
    fn averages_over_the_window() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::new(t0);
        // 30 frames in 500 ms.
        let mut published = None;
        for i in 1..=30u64 {
            published = fps.tick(t0 + Duration::from_micros(i * 500_000 / 30));
        }
        assert_eq!(published, Some(60.0));
        assert_eq!(fps.fps(), 60.0);
    }

    #[test]
    fn value_holds_between_windows() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::with_window(t0, Duration::from_millis(100));
        fps.tick(t0 + Duration::from_millis(100));
        assert_eq!(fps.fps(), 10.0);
        assert_eq!(fps.tick(t0 + Duration::from_millis(150)), None);
        assert_eq!(fps.fps(), 10.0);
        // Two frames over the next 100 ms window.
        assert_eq!(fps.tick(t0 + Duration::from_millis(200)), Some(20.0));
    }

    #[test]
    fn clock_going_backwards_is_ignored() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut fps = FpsCounter::new(t0);
        assert_eq!(fps.tick(t0 - Duration::from_millis(800)), None);
    }
}
