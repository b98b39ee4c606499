#![forbid(unsafe_code)]

//! Packed pixel type.
//!
//! # Layout
//!
//! ```text
//! [31-24: alpha][23-16: red][15-8: green][7-0: blue]
//! ```
//!
//! This is the ARGB8888 layout display pipelines expect for 32-bit streaming
//! textures. On a little-endian host the in-memory byte order is B, G, R, A.

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel linear blend, truncating towards zero.
    ///
    /// `t = 0` yields `self`, `t = 1` yields `other`.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        #[inline]
        fn mix(a: u8, b: u8, t: f32) -> u8 {
            (a as f32 * (1.0 - t) + b as f32 * t) as u8
        }
        Self::new(
            mix(self.r, other.r, t),
            mix(self.g, other.g, t),
            mix(self.b, other.b, t),
        )
    }

    /// Add `amount` to every channel, saturating at 255.
    #[inline]
    pub const fn add_saturating(self, amount: u8) -> Self {
        Self::new(
            self.r.saturating_add(amount),
            self.g.saturating_add(amount),
            self.b.saturating_add(amount),
        )
    }

    /// Pack as an opaque pixel.
    #[inline]
    pub const fn pack(self) -> PackedArgb {
        PackedArgb::rgb(self.r, self.g, self.b)
    }
}

/// One ARGB8888 pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct PackedArgb(pub u32);

impl PackedArgb {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self(0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color (alpha = 255).
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(255, r, g, b)
    }

    #[inline]
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    #[inline]
    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    /// Color channels without alpha.
    #[inline]
    pub const fn to_rgb(self) -> Rgb {
        Rgb::new(self.r(), self.g(), self.b())
    }

    /// Raw bytes in little-endian order (`[b, g, r, a]`), ready for an
    /// ARGB8888 texture upload.
    #[inline]
    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub const fn is_opaque(self) -> bool {
        self.a() == 255
    }
}

impl From<Rgb> for PackedArgb {
    #[inline]
    fn from(rgb: Rgb) -> Self {
        rgb.pack()
    }
}

impl From<PackedArgb> for u32 {
    #[inline]
    fn from(px: PackedArgb) -> Self {
        px.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_lives_in_the_high_byte() {
        let px = PackedArgb::argb(0x11, 0x22, 0x33, 0x44);
        assert_eq!(px.0, 0x1122_3344);
        assert_eq!(PackedArgb::rgb(1, 2, 3).0, 0xFF01_0203);
    }

    #[test]
    fn every_channel_value_round_trips() {
        for v in 0..=255u8 {
            let px = PackedArgb::rgb(v, 255 - v, v / 2);
            assert_eq!((px.a(), px.r(), px.g(), px.b()), (255, v, 255 - v, v / 2));
        }
    }

    #[test]
    fn le_bytes_are_bgra() {
        assert_eq!(PackedArgb::rgb(10, 20, 30).to_le_bytes(), [30, 20, 10, 255]);
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(200, 100, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 100, 100));
    }

    #[test]
    fn add_saturating_clamps_at_white() {
        assert_eq!(
            Rgb::new(10, 200, 255).add_saturating(100),
            Rgb::new(110, 255, 255)
        );
    }

    #[test]
    fn constants() {
        assert!(PackedArgb::BLACK.is_opaque());
        assert!(!PackedArgb::TRANSPARENT.is_opaque());
        assert_eq!(PackedArgb::WHITE.to_rgb(), Rgb::new(255, 255, 255));
        assert_eq!(u32::from(PackedArgb::BLACK), 0xFF00_0000);
    }
}
