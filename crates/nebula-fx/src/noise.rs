#![forbid(unsafe_code)]

//! Seeded lattice value noise.
//!
//! The hash and the lattice multipliers are fixed integer functions, not a
//! pluggable RNG: other implementations of this field reproduce the same
//! images only if every constant and shift below matches bit for bit.

use nebula_core::Config;
use nebula_render::color::Rgb;

const HASH_MUL_A: u32 = 0x27d4_eb2d;
const HASH_MUL_B: u32 = 0x85eb_ca6b;

const LATTICE_X: u32 = 73_856_093;
const LATTICE_Y: u32 = 19_349_663;
const LATTICE_Z: u32 = 83_492_791;

// Stand-ins for the two halves of the 64-bit value the base colors are
// keyed on; together with the seed they pick the two palette endpoints.
const BASE_SALT_1: u32 = 0x9e37_79b9;
const BASE_SALT_2: u32 = 0x7f4a_7c15;
const BASE_SEED_MUL_1: u32 = 1234;
const BASE_SEED_MUL_2: u32 = 5678;

/// Integer mix keyed by `seed`.
#[inline]
pub const fn hash_u32(mut x: u32, seed: u32) -> u32 {
    x ^= seed;
    x = x.wrapping_mul(HASH_MUL_A);
    x ^= x >> 15;
    x = x.wrapping_mul(HASH_MUL_B);
    x ^= x >> 13;
    x
}

/// Quintic ease `6t^5 - 15t^4 + 10t^3`.
#[inline]
pub fn smootherstep(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Lift a hash byte out of the darkest range.
#[inline]
const fn lift(byte: u32) -> u8 {
    (50 + (byte & 0xff) % 180) as u8
}

#[inline]
const fn rgb_from_hash(h: u32) -> Rgb {
    Rgb::new(lift(h), lift(h >> 8), lift(h >> 16))
}

/// Immutable noise parameters plus the two seed-derived base colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseField {
    seed: u32,
    lacunarity: f32,
    persistence: f32,
    base_colors: (Rgb, Rgb),
}

impl NoiseField {
    pub fn new(config: &Config) -> Self {
        Self::with_params(config.seed, config.lacunarity, config.persistence)
    }

    pub fn with_params(seed: u32, lacunarity: f32, persistence: f32) -> Self {
        let h1 = hash_u32(BASE_SALT_1 ^ seed.wrapping_mul(BASE_SEED_MUL_1), seed);
        let h2 = hash_u32(BASE_SALT_2 ^ seed.wrapping_mul(BASE_SEED_MUL_2), seed);
        Self {
            seed,
            lacunarity,
            persistence,
            base_colors: (rgb_from_hash(h1), rgb_from_hash(h2)),
        }
    }

    #[inline]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// The dark-end and bright-end colors of the seeded palette.
    #[inline]
    pub const fn base_colors(&self) -> (Rgb, Rgb) {
        self.base_colors
    }

    #[inline]
    pub const fn hash(&self, x: u32) -> u32 {
        hash_u32(x, self.seed)
    }

    #[inline]
    fn corner(&self, xi: i32, yi: i32, zi: i32) -> f32 {
        let h = self.hash(
            (xi as u32).wrapping_mul(LATTICE_X)
                ^ (yi as u32).wrapping_mul(LATTICE_Y)
                ^ (zi as u32).wrapping_mul(LATTICE_Z),
        );
        (h & 0xffff) as f32 / 65535.0
    }

    /// Trilinear value noise in `[0, 1]`.
    pub fn value_noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;
        let zi = z.floor() as i32;
        let u = smootherstep(x - xi as f32);
        let v = smootherstep(y - yi as f32);
        let w = smootherstep(z - zi as f32);
        let (x1, y1, z1) = (xi.wrapping_add(1), yi.wrapping_add(1), zi.wrapping_add(1));

        let c000 = self.corner(xi, yi, zi);
        let c100 = self.corner(x1, yi, zi);
        let c010 = self.corner(xi, y1, zi);
        let c110 = self.corner(x1, y1, zi);
        let c001 = self.corner(xi, yi, z1);
        let c101 = self.corner(x1, yi, z1);
        let c011 = self.corner(xi, y1, z1);
        let c111 = self.corner(x1, y1, z1);

        let x00 = lerp(c000, c100, u);
        let x10 = lerp(c010, c110, u);
        let x01 = lerp(c001, c101, u);
        let x11 = lerp(c011, c111, u);
        let y0 = lerp(x00, x10, v);
        let y1 = lerp(x01, x11, v);
        lerp(y0, y1, w)
    }

    /// Sum `octaves` layers of `layer(noise)`, normalized by total amplitude.
    #[inline]
    fn fractal<F>(&self, x: f32, y: f32, z: f32, octaves: u32, layer: F) -> f32
    where
        F: Fn(f32) -> f32,
    {
        let mut amp = 1.0f32;
        let mut freq = 1.0f32;
        let mut sum = 0.0f32;
        let mut norm = 0.0f32;
        for _ in 0..octaves.max(1) {
            let n = self.value_noise3(x * freq, y * freq, z * freq);
            sum += layer(n) * amp;
            norm += amp;
            amp *= self.persistence;
            freq *= self.lacunarity;
        }
        sum / norm.max(1e-6)
    }

    /// Fractal Brownian motion, roughly `[-1, 1]`.
    pub fn fbm(&self, x: f32, y: f32, z: f32, octaves: u32) -> f32 {
        self.fractal(x, y, z, octaves, |n| n * 2.0 - 1.0)
    }

    /// Ridged fBm in `[0, 1]`; each layer is `(1 - |2n - 1|)^2`.
    pub fn ridged_fbm(&self, x: f32, y: f32, z: f32, octaves: u32) -> f32 {
        self.fractal(x, y, z, octaves, |n| {
            let ridge = 1.0 - (n * 2.0 - 1.0).abs();
            ridge * ridge
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(seed: u32) -> NoiseField {
        NoiseField::with_params(seed, 2.0, 0.5)
    }

    #[test]
    fn hash_matches_reference_values() {
        assert_eq!(hash_u32(0, 0), 0);
        assert_eq!(hash_u32(1, 0), 0x08dc_adcb);
        assert_eq!(hash_u32(0, 42), 0x5132_b854);
        assert_eq!(hash_u32(1, 42), 0x615f_54ba);
        assert_eq!(hash_u32(12345, 42), 0x9738_69d2);
        assert_eq!(hash_u32(u32::MAX, 42), 0x6845_6af2);
        assert_eq!(hash_u32(12345, 7), 0x0026_010c);
    }

    #[test]
    fn base_colors_are_a_function_of_seed() {
        assert_eq!(
            field(42).base_colors(),
            (Rgb::new(56, 115, 95), Rgb::new(190, 136, 53))
        );
        assert_eq!(
            field(0).base_colors(),
            (Rgb::new(106, 75, 63), Rgb::new(101, 118, 99))
        );
        assert_eq!(
            field(7).base_colors(),
            (Rgb::new(149, 216, 209), Rgb::new(77, 215, 183))
        );
        // Octave tuning does not move the palette.
        assert_eq!(
            NoiseField::with_params(42, 3.0, 0.9).base_colors(),
            field(42).base_colors()
        );
    }

    #[test]
    fn base_color_channels_are_lifted() {
        for seed in 0..500 {
            let (a, b) = field(seed).base_colors();
            for c in [a.r, a.g, a.b, b.r, b.g, b.b] {
                assert!((50..230).contains(&c), "seed {seed}: channel {c}");
            }
        }
    }

    #[test]
    fn smootherstep_endpoints_and_midpoint() {
        assert_eq!(smootherstep(0.0), 0.0);
        assert_eq!(smootherstep(1.0), 1.0);
        assert_eq!(smootherstep(0.5), 0.5);
    }

    #[test]
    fn lattice_points_return_corner_hash() {
        let f = field(42);
        for (x, y, z) in [(0i32, 0i32, 0i32), (3, -2, 5), (-7, 11, -1)] {
            let h = f.hash(
                (x as u32).wrapping_mul(LATTICE_X)
                    ^ (y as u32).wrapping_mul(LATTICE_Y)
                    ^ (z as u32).wrapping_mul(LATTICE_Z),
            );
            let expect = (h & 0xffff) as f32 / 65535.0;
            assert_eq!(f.value_noise3(x as f32, y as f32, z as f32), expect);
        }
    }

    #[test]
    fn value_noise_stays_in_unit_range() {
        let f = field(1234);
        for i in 0..2000 {
            let x = i as f32 * 0.173 - 150.0;
            let y = i as f32 * -0.091 + 20.0;
            let z = i as f32 * 0.037;
            let n = f.value_noise3(x, y, z);
            assert!((-1e-6..=1.0 + 1e-6).contains(&n), "noise({x},{y},{z}) = {n}");
        }
    }

    #[test]
    fn value_noise_is_continuous_across_cells() {
        let f = field(9);
        let eps = 1e-3;
        let left = f.value_noise3(1.0 - eps, 0.4, 0.2);
        let right = f.value_noise3(1.0 + eps, 0.4, 0.2);
        assert!((left - right).abs() < 0.01);
    }

    #[test]
    fn zero_octaves_behave_like_one() {
        let f = field(3);
        assert_eq!(f.fbm(0.3, 0.7, 0.1, 0), f.fbm(0.3, 0.7, 0.1, 1));
        assert_eq!(f.ridged_fbm(0.3, 0.7, 0.1, 0), f.ridged_fbm(0.3, 0.7, 0.1, 1));
    }

    #[test]
    fn single_octave_fbm_is_rescaled_noise() {
        let f = field(3);
        let n = f.value_noise3(0.3, 0.7, 0.1);
        assert_eq!(f.fbm(0.3, 0.7, 0.1, 1), n * 2.0 - 1.0);
        let ridge = 1.0 - (n * 2.0 - 1.0).abs();
        assert_eq!(f.ridged_fbm(0.3, 0.7, 0.1, 1), ridge * ridge);
    }

    #[test]
    fn fractal_ranges_hold_for_all_octave_counts() {
        let f = NoiseField::with_params(77, 1.9, 0.65);
        for octaves in 1..=12 {
            for i in 0..200 {
                let x = i as f32 * 0.31 - 30.0;
                let y = i as f32 * 0.17 + 4.0;
                let fbm = f.fbm(x, y, 0.5, octaves);
                let ridged = f.ridged_fbm(x, y, 0.5, octaves);
                assert!((-1.05..=1.05).contains(&fbm), "fbm {fbm} at {octaves} octaves");
                assert!(
                    (-1e-6..=1.0 + 1e-6).contains(&ridged),
                    "ridged {ridged} at {octaves} octaves"
                );
            }
        }
    }
}
