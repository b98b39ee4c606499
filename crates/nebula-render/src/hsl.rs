#![forbid(unsafe_code)]

//! HSL color math.
//!
//! Hue is in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
//! Conversions back to 8-bit channels clamp to `[0, 1]` and truncate, so
//! a round trip through HSL lands within one step of the input.

use crate::color::Rgb;

/// Saturation multiplier applied before hue rotation.
pub const SATURATION_BOOST: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsl {
    /// Degrees.
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Convert 8-bit RGB to HSL.
///
/// Achromatic input (all channels equal) yields `h = 0, s = 0`.
pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let r = rgb.r as f32 / 255.0;
    let g = rgb.g as f32 / 255.0;
    let b = rgb.b as f32 / 255.0;
    let max = r.max(g.max(b));
    let min = r.min(g.min(b));
    let l = (max + min) * 0.5;
    if max == min {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    Hsl { h: h * 60.0, s, l }
}

#[inline]
fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[inline]
fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

/// Convert HSL back to 8-bit RGB. Hue wraps modulo 360, including negatives.
pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let h = hsl.h.rem_euclid(360.0) / 360.0;
    let (s, l) = (hsl.s, hsl.l);
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Rgb::new(
        to_byte(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_channel(p, q, h)),
        to_byte(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

/// Multiply saturation by `factor`, capped at 1.
#[inline]
pub fn boost_saturation(hsl: Hsl, factor: f32) -> Hsl {
    Hsl {
        s: (hsl.s * factor).min(1.0),
        ..hsl
    }
}

/// Shift hue by `degrees`. The result is left unwrapped; [`hsl_to_rgb`]
/// wraps it.
#[inline]
pub fn rotate_hue(hsl: Hsl, degrees: f32) -> Hsl {
    Hsl {
        h: hsl.h + degrees,
        ..hsl
    }
}

/// Seed-dependent base hue offset in degrees.
#[inline]
pub fn seed_hue_offset(seed: u32) -> f32 {
    (seed % 360) as f32 * 0.25
}

/// Slow hue oscillation over time, within +/-35 degrees.
#[inline]
pub fn hue_drift(t: f32) -> f32 {
    35.0 * (t * 0.17).sin()
}

/// Apply the seed offset, then the drift. Two separate additions, so the
/// rounding matches a per-step hue update.
#[inline]
pub fn shift_hue(hsl: Hsl, seed: u32, t: f32) -> Hsl {
    rotate_hue(rotate_hue(hsl, seed_hue_offset(seed)), hue_drift(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_have_expected_hues() {
        let red = rgb_to_hsl(Rgb::new(255, 0, 0));
        assert_eq!((red.h, red.s, red.l), (0.0, 1.0, 0.5));
        assert_eq!(rgb_to_hsl(Rgb::new(0, 255, 0)).h, 120.0);
        assert_eq!(rgb_to_hsl(Rgb::new(0, 0, 255)).h, 240.0);
    }

    #[test]
    fn grays_are_achromatic() {
        for v in [0u8, 1, 77, 128, 254, 255] {
            let hsl = rgb_to_hsl(Rgb::new(v, v, v));
            assert_eq!(hsl.h, 0.0);
            assert_eq!(hsl.s, 0.0);
            let back = hsl_to_rgb(hsl);
            assert_eq!(back.r, back.g);
            assert_eq!(back.g, back.b);
            assert!(back.r.abs_diff(v) <= 1, "gray {v} came back as {}", back.r);
        }
    }

    #[test]
    fn negative_and_large_hues_wrap() {
        let base = Hsl {
            h: 30.0,
            s: 0.8,
            l: 0.5,
        };
        let wrapped_neg = hsl_to_rgb(Hsl { h: -330.0, ..base });
        let wrapped_pos = hsl_to_rgb(Hsl { h: 390.0, ..base });
        assert_eq!(hsl_to_rgb(base), wrapped_neg);
        assert_eq!(hsl_to_rgb(base), wrapped_pos);
    }

    #[test]
    fn saturation_boost_caps_at_one() {
        let hsl = Hsl {
            h: 10.0,
            s: 0.5,
            l: 0.4,
        };
        assert!((boost_saturation(hsl, SATURATION_BOOST).s - 0.7).abs() < 1e-6);
        assert_eq!(boost_saturation(Hsl { s: 0.9, ..hsl }, 1.4).s, 1.0);
    }

    #[test]
    fn rotate_hue_adds_degrees() {
        let hsl = rotate_hue(
            Hsl {
                h: 350.0,
                s: 1.0,
                l: 0.5,
            },
            20.0,
        );
        assert_eq!(hsl.h, 370.0);
        assert_eq!(hsl_to_rgb(hsl), hsl_to_rgb(Hsl { h: 10.0, ..hsl }));
    }

    #[test]
    fn hue_shift_at_time_zero_is_seed_only() {
        assert_eq!(seed_hue_offset(0), 0.0);
        assert_eq!(seed_hue_offset(100), 25.0);
        assert_eq!(seed_hue_offset(460), 25.0);
        assert_eq!(hue_drift(0.0), 0.0);
        let swing = hue_drift(std::f32::consts::FRAC_PI_2 / 0.17);
        assert!((swing - 35.0).abs() < 1e-3);

        let hsl = Hsl {
            h: 200.0,
            s: 0.5,
            l: 0.5,
        };
        assert_eq!(shift_hue(hsl, 100, 0.0).h, 225.0);
    }
}
