#![forbid(unsafe_code)]

//! Render kernel: packed pixels, color math, frame buffers, and the pixel source seam.

pub mod buffer;
pub mod color;
pub mod hsl;
pub mod source;

pub use buffer::{LowResBuffer, PixelBuffer, low_res_dims, upscale_nearest, upscale_nearest_row};
pub use color::{PackedArgb, Rgb};
pub use hsl::{
    Hsl, boost_saturation, hsl_to_rgb, hue_drift, rgb_to_hsl, rotate_hue, seed_hue_offset,
    shift_hue,
};
pub use source::PixelSource;
