#![forbid(unsafe_code)]

//! The per-pixel color source consumed by the frame scheduler.

use crate::color::PackedArgb;

/// A pure function from `(x, y, t)` to a pixel.
///
/// Implementations must be deterministic and free of shared mutable state:
/// the scheduler calls [`sample`](Self::sample) concurrently from many
/// workers, in no particular order, and expects the same pixel for the same
/// inputs every time.
pub trait PixelSource: Sync {
    /// Color of pixel `(x, y)` at `t` seconds.
    fn sample(&self, x: u32, y: u32, t: f32) -> PackedArgb;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str {
        "pixel-source"
    }
}

impl<F> PixelSource for F
where
    F: Fn(u32, u32, f32) -> PackedArgb + Sync,
{
    #[inline]
    fn sample(&self, x: u32, y: u32, t: f32) -> PackedArgb {
        self(x, y, t)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}
