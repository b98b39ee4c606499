#![forbid(unsafe_code)]

//! Frame production.
//!
//! [`FrameScheduler`] turns a [`PixelSource`](nebula_render::PixelSource) into
//! complete frames, tile by tile, on a dedicated worker pool.
//! [`FrameLoop`] drives it against a clock and hands each frame to a
//! [`FrameSink`].

pub mod fps;
pub mod program;
pub mod scheduler;

pub use fps::{FPS_WINDOW, FpsCounter};
pub use program::{
    FrameInfo, FrameLoop, FrameSink, LoopLimits, RunError, RunSummary, StopHandle, StopReason,
    TimeBase,
};
pub use scheduler::{ExecutionMode, FrameScheduler, FrameStats, RenderPath, SchedulerError};
