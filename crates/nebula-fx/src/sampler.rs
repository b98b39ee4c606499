#![forbid(unsafe_code)]

//! Animated nebula pixel sampler.
//!
//! # Pipeline
//!
//! For pixel `(x, y)` at time `t`:
//!
//! 1. Normalize to a centered plane: `s = (x / W - 0.5) * 1.9`.
//! 2. Two-band domain warp driven by four value-noise lookups.
//! 3. Swirl around the center; the angle grows with radius and time.
//! 4. Shade from fBm plus ridged fBm, contrast stretch, central glow, gamma.
//! 5. Shade to color through the selected palette.
//! 6. Saturation boost, then seed and time dependent hue rotation.
//! 7. Sparse twinkling stars, added with saturation.
//!
//! Every constant below is part of the image: changing one changes every
//! frame for every seed.

use nebula_core::{Config, Palette};
use nebula_render::color::{PackedArgb, Rgb};
use nebula_render::hsl::{SATURATION_BOOST, boost_saturation, hsl_to_rgb, rgb_to_hsl, shift_hue};
use nebula_render::source::PixelSource;

use crate::noise::{NoiseField, hash_u32};
use crate::palette::shade_color;

// Normalization.
const PLANE_SPAN: f32 = 1.9;

// Domain warp: (frequency, time rate, amplitude, x offset, y offset) per band.
const WARP_LOW: WarpBand = WarpBand {
    freq: 0.9,
    time_rate: 0.6,
    amp: 0.42,
    x_offset: 2.1,
    y_offset: 3.7,
};
const WARP_HIGH: WarpBand = WarpBand {
    freq: 1.7,
    time_rate: 1.1,
    amp: 0.18,
    x_offset: 5.3,
    y_offset: 4.2,
};

// Swirl.
const SWIRL_STRENGTH: f32 = 0.65;
const SWIRL_FALLOFF: f32 = 0.9;
const SWIRL_SPIN: f32 = 0.18;

// Shading.
const RIDGE_FREQ: f32 = 1.8;
const BASE_WEIGHT: f32 = 0.55;
const RIDGE_WEIGHT: f32 = 0.45;
const RIDGE_EXPONENT: f32 = 1.5;
const CONTRAST_GAIN: f32 = 1.28;
const CONTRAST_BIAS: f32 = 0.14;
const GLOW_STRENGTH: f32 = 0.28;
const GLOW_FALLOFF: f32 = 1.1;
const GAMMA: f32 = 1.4;

// Stars.
const STAR_HASH_X: u32 = 2_654_435_761;
const STAR_HASH_Y: u32 = 1_013_904_223;
const STAR_THRESHOLD: f32 = 0.9980;
const STAR_BASE: f32 = 210.0;
const STAR_TWINKLE: f32 = 45.0;

#[derive(Debug, Clone, Copy)]
struct WarpBand {
    freq: f32,
    time_rate: f32,
    amp: f32,
    x_offset: f32,
    y_offset: f32,
}

impl WarpBand {
    /// Signed `[-1, 1]` displacement for both axes.
    #[inline]
    fn displace(&self, field: &NoiseField, sx: f32, sy: f32, z: f32) -> (f32, f32) {
        let (fx, fy, fz) = (sx * self.freq, sy * self.freq, z * self.time_rate);
        let dx = field.value_noise3(fx + self.x_offset, fy, fz) * 2.0 - 1.0;
        let dy = field.value_noise3(fx, fy + self.y_offset, fz) * 2.0 - 1.0;
        (dx, dy)
    }
}

/// Per-pixel nebula sampler.
///
/// Immutable after construction; safe to share across render workers.
#[derive(Debug, Clone)]
pub struct NebulaFx {
    field: NoiseField,
    width: u32,
    height: u32,
    octaves: u32,
    zspeed: f32,
    palette: Palette,
}

impl NebulaFx {
    pub fn new(config: &Config) -> Self {
        let field = NoiseField::new(config);
        let (base1, base2) = field.base_colors();
        tracing::debug!(
            seed = config.seed,
            palette = %config.palette,
            base1 = ?base1,
            base2 = ?base2,
            "nebula field ready"
        );
        Self {
            field,
            width: config.width,
            height: config.height,
            octaves: config.octaves.max(1),
            zspeed: config.zspeed,
            palette: config.palette,
        }
    }

    /// Centered plane coordinates of pixel `(x, y)`.
    #[inline]
    pub fn normalize(&self, x: u32, y: u32) -> (f32, f32) {
        let u = x as f32 / self.width.max(1) as f32;
        let v = y as f32 / self.height.max(1) as f32;
        ((u - 0.5) * PLANE_SPAN, (v - 0.5) * PLANE_SPAN)
    }

    /// Two-band domain warp of plane point `(sx, sy)` at noise depth `z`.
    #[inline]
    pub fn warp(&self, sx: f32, sy: f32, z: f32) -> (f32, f32) {
        let (w1x, w1y) = WARP_LOW.displace(&self.field, sx, sy, z);
        let (w2x, w2y) = WARP_HIGH.displace(&self.field, sx, sy, z);
        (
            sx + w1x * WARP_LOW.amp + w2x * WARP_HIGH.amp,
            sy + w1y * WARP_LOW.amp + w2y * WARP_HIGH.amp,
        )
    }

    /// Scalar shade in `[0, 1]` for swirled point `(rx, ry)`; `r2` is the
    /// squared radius of the warped point before the swirl.
    #[inline]
    pub fn shade(&self, rx: f32, ry: f32, z: f32, r2: f32) -> f32 {
        let base = self.field.fbm(rx, ry, z, self.octaves);
        let ridged = self
            .field
            .ridged_fbm(rx * RIDGE_FREQ, ry * RIDGE_FREQ, z, self.octaves);
        let v0 = ((base + 1.0) * 0.5).clamp(0.0, 1.0);

        let mut shade = BASE_WEIGHT * v0 + RIDGE_WEIGHT * ridged.powf(RIDGE_EXPONENT);
        shade = (shade * CONTRAST_GAIN - CONTRAST_BIAS).clamp(0.0, 1.0);
        let glow = GLOW_STRENGTH * (-r2 * GLOW_FALLOFF).exp();
        shade = (shade + glow).clamp(0.0, 1.0);
        shade.powf(GAMMA)
    }

    /// Palette lookup, saturation boost, and hue rotation.
    #[inline]
    pub fn colorize(&self, shade: f32, t: f32) -> Rgb {
        let rgb = shade_color(self.palette, shade, self.field.base_colors());
        let boosted = hsl_to_rgb(boost_saturation(rgb_to_hsl(rgb), SATURATION_BOOST));
        hsl_to_rgb(shift_hue(rgb_to_hsl(boosted), self.field.seed(), t))
    }

    /// Star brightness at `(x, y)`, or `None` for the ~99.8% of pixels
    /// without one.
    #[inline]
    pub fn sparkle(&self, x: u32, y: u32, t: f32) -> Option<u8> {
        let h = star_hash(&self.field, x, y);
        if star_roll(h) <= STAR_THRESHOLD {
            return None;
        }
        let rate = 4.0 + (h % 997) as f32 * 0.012;
        let twinkle = 0.5 + 0.5 * (t * rate).sin();
        Some((STAR_BASE + STAR_TWINKLE * twinkle) as u8)
    }

    /// Whether `(x, y)` hosts a star. Independent of time.
    #[inline]
    pub fn is_star(&self, x: u32, y: u32) -> bool {
        star_roll(star_hash(&self.field, x, y)) > STAR_THRESHOLD
    }

    /// Full pipeline for one pixel.
    pub fn sample_rgb(&self, x: u32, y: u32, t: f32) -> Rgb {
        let (sx, sy) = self.normalize(x, y);
        let z = t * self.zspeed;
        let (wx, wy) = self.warp(sx, sy, z);

        let r2 = wx * wx + wy * wy;
        let (rx, ry) = swirl(wx, wy, r2, t);

        let rgb = self.colorize(self.shade(rx, ry, z, r2), t);
        match self.sparkle(x, y, t) {
            Some(star) => rgb.add_saturating(star),
            None => rgb,
        }
    }
}

impl PixelSource for NebulaFx {
    #[inline]
    fn sample(&self, x: u32, y: u32, t: f32) -> PackedArgb {
        self.sample_rgb(x, y, t).pack()
    }

    fn name(&self) -> &'static str {
        "nebula"
    }
}

/// Rotate `(wx, wy)` by an angle that rises towards the rim and with time.
#[inline]
pub fn swirl(wx: f32, wy: f32, r2: f32, t: f32) -> (f32, f32) {
    let angle = SWIRL_STRENGTH * (1.0 - (-r2 * SWIRL_FALLOFF).exp()) + SWIRL_SPIN * t;
    let (sn, cs) = (angle.sin(), angle.cos());
    (cs * wx - sn * wy, sn * wx + cs * wy)
}

#[inline]
fn star_hash(field: &NoiseField, x: u32, y: u32) -> u32 {
    hash_u32(
        x.wrapping_mul(STAR_HASH_X) ^ y.wrapping_mul(STAR_HASH_Y),
        field.seed(),
    )
}

#[inline]
fn star_roll(h: u32) -> f32 {
    (h & 0x00ff_ffff) as f32 / 0x00ff_ffff as f32
}
