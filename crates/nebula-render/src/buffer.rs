#![forbid(unsafe_code)]

//! Frame buffers.
//!
//! [`PixelBuffer`] is the row-major frame handed to presentation. Every
//! pixel is overwritten each frame. [`LowResBuffer`] holds the reduced
//! resolution render that is upscaled into the frame when the render scale
//! is below 1; it keeps its allocation across frames of the same size.

use crate::color::PackedArgb;

/// Row-major grid of packed pixels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<PackedArgb>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![PackedArgb::TRANSPARENT; width as usize * height as usize],
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Change dimensions, keeping the allocation when it is large enough.
    ///
    /// Returns `true` if the backing storage had to grow.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        let len = width as usize * height as usize;
        let grew = len > self.pixels.capacity();
        self.width = width;
        self.height = height;
        self.pixels.resize(len, PackedArgb::TRANSPARENT);
        grew
    }

    #[inline]
    pub fn pixels(&self) -> &[PackedArgb] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [PackedArgb] {
        &mut self.pixels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<PackedArgb> {
        if x < self.width && y < self.height {
            self.pixels
                .get(y as usize * self.width as usize + x as usize)
                .copied()
        } else {
            None
        }
    }

    /// Row `y`. Panics if `y` is out of range.
    #[inline]
    pub fn row(&self, y: u32) -> &[PackedArgb] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.pixels[start..start + w]
    }

    /// FNV-1a over dimensions and pixel values. Stable across runs and
    /// toolchains, used for frame logging and golden comparisons.
    pub fn checksum(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;
        let mut hash = OFFSET;
        let mut feed = |word: u32| {
            for byte in word.to_le_bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(PRIME);
            }
        };
        feed(self.width);
        feed(self.height);
        for px in &self.pixels {
            feed(px.0);
        }
        hash
    }

    /// Pixels as raw little-endian ARGB8888 bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|px| px.to_le_bytes()).collect()
    }
}

/// Dimensions of the reduced-resolution grid for `scale`. Never below 1×1.
#[inline]
pub fn low_res_dims(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let sw = (width as f32 * scale).floor() as u32;
    let sh = (height as f32 * scale).floor() as u32;
    (sw.max(1), sh.max(1))
}

/// Full-resolution coordinate sampled for low-res index `s`.
///
/// Samples the center of the footprint the low-res pixel covers, clamped to
/// the last valid coordinate.
#[inline]
pub fn low_res_source_coord(s: u32, scale: f32, limit: u32) -> u32 {
    let c = ((s as f32 + 0.5) / scale) as u32;
    c.min(limit.saturating_sub(1))
}

/// Nearest low-res index for full-resolution coordinate `c`.
#[inline]
pub fn nearest_low_res_index(c: u32, scale: f32, low_res_len: u32) -> u32 {
    ((c as f32 * scale) as u32).min(low_res_len.saturating_sub(1))
}

/// Reduced-resolution render target, reused across frames.
#[derive(Debug, Clone, Default)]
pub struct LowResBuffer {
    buffer: PixelBuffer,
    scale: f32,
}

impl LowResBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the buffer for a `width × height` frame rendered at `scale`.
    ///
    /// Returns `true` if the low-res dimensions changed. Same dimensions
    /// leave the buffer (and its allocation) untouched.
    pub fn ensure(&mut self, width: u32, height: u32, scale: f32) -> bool {
        let (sw, sh) = low_res_dims(width, height, scale);
        self.scale = scale;
        if sw == self.buffer.width() && sh == self.buffer.height() {
            return false;
        }
        self.buffer.resize(sw, sh);
        true
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[inline]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }
}

/// Fill one destination row from the low-res buffer by nearest mapping.
pub fn upscale_nearest_row(src: &PixelBuffer, dst_row: &mut [PackedArgb], y: u32, scale: f32) {
    if src.is_empty() {
        return;
    }
    let sy = nearest_low_res_index(y, scale, src.height());
    let src_row = src.row(sy);
    let sw = src.width();
    for (x, px) in dst_row.iter_mut().enumerate() {
        let sx = nearest_low_res_index(x as u32, scale, sw);
        *px = src_row[sx as usize];
    }
}

/// Upscale `src` into every row of `dst`.
pub fn upscale_nearest(src: &PixelBuffer, dst: &mut PixelBuffer, scale: f32) {
    let width = dst.width() as usize;
    if width == 0 {
        return;
    }
    for (y, row) in dst.pixels_mut().chunks_exact_mut(width).enumerate() {
        upscale_nearest_row(src, row, y as u32, scale);
    }
}
