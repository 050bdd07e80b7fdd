use bytemuck::{Pod, Zeroable};

/// Straight-alpha RGBA color.
///
/// A plain value type: it crosses the native boundary as four packed `f32`
/// in `r, g, b, a` order and carries no native allocation. Components are
/// conventionally in `[0, 1]` but are not clamped.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Creates a color from a packed `0xRRGGBBAA` value.
    #[inline]
    pub fn from_hex(hex: u32) -> Self {
        let [r, g, b, a] = hex.to_be_bytes();
        Self::from_u8(r, g, b, a)
    }

    #[inline]
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Packs into `0xRRGGBBAA`, clamping each channel to `[0, 1]`.
    pub fn to_hex(self) -> u32 {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        u32::from_be_bytes([q(self.r), q(self.g), q(self.b), q(self.a)])
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    #[inline]
    pub const fn from_array([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r, g, b, a)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool { (a - b).abs() <= f32::EPSILON }

    #[test]
    fn from_hex_red() {
        let c = Color::from_hex(0xFF0000FF);
        assert!(approx(c.r, 1.0));
        assert!(approx(c.g, 0.0));
        assert!(approx(c.b, 0.0));
        assert!(approx(c.a, 1.0));
    }

    #[test]
    fn from_hex_matches_named_constants() {
        assert_eq!(Color::from_hex(0x000000ff), Color::BLACK);
        assert_eq!(Color::from_hex(0xffffffff), Color::WHITE);
        assert_eq!(Color::from_hex(0x00ff00ff), Color::GREEN);
        assert_eq!(Color::from_hex(0x0000ffff), Color::BLUE);
    }

    #[test]
    fn hex_packing_is_stable() {
        for hex in [0x00000000u32, 0x12345678, 0xdeadbeef, 0xffffffff] {
            assert_eq!(Color::from_hex(hex).to_hex(), hex);
        }
    }

    #[test]
    fn to_hex_clamps_out_of_range() {
        assert_eq!(Color::new(2.0, -1.0, 0.5, 1.0).to_hex(), 0xff0080ff);
    }

    #[test]
    fn layout_is_four_packed_floats() {
        assert_eq!(core::mem::size_of::<Color>(), 16);
        let lanes: &[f32] = bytemuck::cast_slice(core::slice::from_ref(&Color::RED));
        assert_eq!(lanes, &[1.0, 0.0, 0.0, 1.0]);
    }
}
