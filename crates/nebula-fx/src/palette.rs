#![forbid(unsafe_code)]

//! Shade-to-color ramps.
//!
//! [`Palette::Seeded`] blends the two seed-derived base colors; the fixed
//! ramps ignore the seed. Saturation boost and hue drift are applied
//! afterwards by the sampler regardless of palette.

use nebula_core::Palette;
use nebula_render::color::Rgb;

/// Evenly spaced stops for the `nebula` ramp at 0, 1/4, 1/2, 3/4, 1.
const NEBULA_STOPS: [Rgb; 5] = [
    Rgb::new(0, 0, 5),
    Rgb::new(10, 25, 140),
    Rgb::new(100, 20, 200),
    Rgb::new(210, 30, 120),
    Rgb::new(255, 185, 80),
];

/// Map `shade` in `[0, 1]` to a color. Out-of-range shades are clamped.
pub fn shade_color(palette: Palette, shade: f32, base: (Rgb, Rgb)) -> Rgb {
    let t = shade.clamp(0.0, 1.0);
    match palette {
        Palette::Seeded => base.0.lerp(base.1, t),
        Palette::Nebula => nebula(t),
        Palette::Inferno => inferno(t),
        Palette::Ice => ice(t),
        Palette::Bw => {
            let k = (t * 255.0) as u8;
            Rgb::new(k, k, k)
        }
    }
}

fn nebula(t: f32) -> Rgb {
    let segment = if t < 0.25 {
        0
    } else if t < 0.5 {
        1
    } else if t < 0.75 {
        2
    } else {
        3
    };
    let k = (t - segment as f32 * 0.25) / 0.25;
    NEBULA_STOPS[segment].lerp(NEBULA_STOPS[segment + 1], k)
}

fn inferno(t: f32) -> Rgb {
    let inv = 1.0 - t;
    Rgb::new(
        (20.0 + 235.0 * t) as u8,
        (10.0 + 120.0 * t.powf(1.2)) as u8,
        (5.0 + 30.0 * inv * inv) as u8,
    )
}

fn ice(t: f32) -> Rgb {
    Rgb::new(
        (20.0 + 40.0 * (1.0 - t)) as u8,
        (80.0 + 140.0 * t) as u8,
        (140.0 + 115.0 * t) as u8,
    )
}
