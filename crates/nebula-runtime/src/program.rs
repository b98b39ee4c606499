#![forbid(unsafe_code)]

//! Frame loop: clock, scheduler, presentation, and stop handling.
//!
//! Stop requests and run limits are checked only between frames; a frame
//! that has started is always computed and presented.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use nebula_render::{PixelBuffer, PixelSource};

use crate::fps::FpsCounter;
use crate::scheduler::{FrameScheduler, FrameStats};

// =============================================================================
// Presentation seam
// =============================================================================

/// Per-frame metadata handed to a [`FrameSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Zero-based frame index within this run.
    pub index: u64,
    /// Time in seconds the frame was computed for.
    pub t: f32,
    /// Last published FPS average (0 until the first window closes).
    pub fps: f64,
    pub stats: FrameStats,
}

/// Receives each completed frame.
pub trait FrameSink {
    fn present(&mut self, frame: &PixelBuffer, info: &FrameInfo) -> io::Result<()>;

    /// Called once after the last frame.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Stop handle
// =============================================================================

/// Cloneable stop flag shared with signal handlers and input threads.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to exit after the in-flight frame.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Loop configuration and results
// =============================================================================

/// Where frame times come from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimeBase {
    /// Seconds since the loop started, from a monotonic clock.
    #[default]
    Monotonic,
    /// `index * step`; reproducible runs independent of machine speed.
    FixedStep(Duration),
}

/// Optional bounds on a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopLimits {
    pub max_frames: Option<u64>,
    pub max_duration: Option<Duration>,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    FrameLimit,
    TimeLimit,
}

impl StopReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::FrameLimit => "frame-limit",
            Self::TimeLimit => "time-limit",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`FrameLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
    /// Checksum of the last presented frame, if any.
    pub last_checksum: Option<u64>,
}

impl RunSummary {
    pub fn average_fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Errors that end a run early.
#[derive(Debug)]
pub enum RunError {
    /// The sink failed to present a frame.
    Present { frame: u64, source: io::Error },
    /// The sink failed to shut down.
    Finish(io::Error),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present { frame, source } => {
                write!(f, "failed to present frame {frame}: {source}")
            }
            Self::Finish(e) => write!(f, "failed to finish presentation: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Present { source, .. } => Some(source),
            Self::Finish(e) => Some(e),
        }
    }
}

// =============================================================================
// FrameLoop
// =============================================================================

/// Drives a [`FrameScheduler`] until stopped or a limit is reached.
pub struct FrameLoop<S> {
    scheduler: FrameScheduler<S>,
    stop: StopHandle,
    limits: LoopLimits,
    time_base: TimeBase,
}

impl<S: PixelSource> FrameLoop<S> {
    pub fn new(scheduler: FrameScheduler<S>) -> Self {
        Self {
            scheduler,
            stop: StopHandle::new(),
            limits: LoopLimits::default(),
            time_base: TimeBase::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Share an existing stop flag instead of the loop's own.
    #[must_use]
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn scheduler(&self) -> &FrameScheduler<S> {
        &self.scheduler
    }

    /// Compute and present frames until a stop request or limit.
    pub fn run<K: FrameSink + ?Sized>(&mut self, sink: &mut K) -> Result<RunSummary, RunError> {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start);
        let mut frames = 0u64;

        tracing::info!(
            max_frames = ?self.limits.max_frames,
            max_duration_ms = ?self.limits.max_duration.map(|d| d.as_millis() as u64),
            time_base = ?self.time_base,
            "frame loop started"
        );

        let reason = loop {
            if self.stop.is_stop_requested() {
                break StopReason::Requested;
            }
            if self.limits.max_frames.is_some_and(|max| frames >= max) {
                break StopReason::FrameLimit;
            }
            if self.limits.max_duration.is_some_and(|max| start.elapsed() >= max) {
                break StopReason::TimeLimit;
            }

            let t = match self.time_base {
                TimeBase::Monotonic => start.elapsed().as_secs_f32(),
                TimeBase::FixedStep(step) => step.as_secs_f32() * frames as f32,
            };
            self.scheduler.compute_frame(t);
            if let Some(avg) = fps.tick(Instant::now()) {
                tracing::debug!(fps = avg, frame = frames, "fps");
            }
            let info = FrameInfo {
                index: frames,
                t,
                fps: fps.fps(),
                stats: self.scheduler.stats(),
            };
            let frame = self.scheduler.frame();
            sink.present(frame, &info).map_err(|source| RunError::Present {
                frame: frames,
                source,
            })?;
            frames += 1;
        };

        let elapsed = start.elapsed();
        sink.finish().map_err(RunError::Finish)?;
        // The scheduler still holds the last presented frame.
        let summary = RunSummary {
            frames,
            elapsed,
            reason,
            last_checksum: (frames > 0).then(|| self.scheduler.frame().checksum()),
        };
        tracing::info!(
            frames,
            reason = %reason,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            average_fps = summary.average_fps(),
            "frame loop stopped"
        );
        Ok(summary)
    }
}

impl<S> fmt::Debug for FrameLoop<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLoop")
            .field("scheduler", &self.scheduler)
            .field("stop", &self.stop)
            .field("limits", &self.limits)
            .field("time_base", &self.time_base)
            .finish()
    }
}
