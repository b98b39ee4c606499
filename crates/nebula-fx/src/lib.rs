#![forbid(unsafe_code)]

//! Procedural nebula field.
//!
//! - [`noise`]: seeded integer hash, trilinear value noise, fBm and ridged fBm.
//! - [`palette`]: shade-to-color ramps.
//! - [`sampler`]: the per-pixel pipeline (warp, swirl, shade, grade, stars).
//!
//! Everything here is a pure function of its inputs and the immutable
//! [`NoiseField`]; the same `(x, y, t)` always yields the same pixel.

pub mod noise;
pub mod palette;
pub mod sampler;

pub use noise::{NoiseField, hash_u32, smootherstep};
pub use sampler::NebulaFx;
