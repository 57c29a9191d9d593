//! Packed color helpers
//!
//! Color planes store one `u32` per pixel in ARGB8888 order (0xAARRGGBB).
//! Shaders work in normalized `[f32; 4]` RGBA, so most of this module is
//! conversion between the two representations.

/// Color operation utilities
pub struct ColorOps;

impl ColorOps {
    /// Pack a normalized RGBA color into ARGB8888
    ///
    /// Channels are clamped to `[0, 1]` and rounded to the nearest 8-bit value.
    /// NaN channels pack as 0.
    ///
    /// ```
    /// use prism_core::graphics::ColorOps;
    ///
    /// assert_eq!(ColorOps::pack([1.0, 0.0, 0.0, 1.0]), 0xFFFF0000);
    /// ```
    #[inline]
    pub fn pack(rgba: [f32; 4]) -> u32 {
        let [r, g, b, a] = rgba.map(Self::unit_to_byte);
        Self::from_argb(a, r, g, b)
    }

    /// Unpack ARGB8888 into normalized RGBA
    #[inline]
    pub fn unpack(color: u32) -> [f32; 4] {
        [
            Self::red(color) as f32 / 255.0,
            Self::green(color) as f32 / 255.0,
            Self::blue(color) as f32 / 255.0,
            Self::alpha(color) as f32 / 255.0,
        ]
    }

    #[inline]
    fn unit_to_byte(v: f32) -> u8 {
        // `as` saturates and maps NaN to 0
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Linear interpolation between two ARGB colors, per channel
    #[inline]
    pub fn lerp(c0: u32, c1: u32, t: f32) -> u32 {
        let a = Self::unpack(c0);
        let b = Self::unpack(c1);
        Self::pack([
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
            a[3] + (b[3] - a[3]) * t,
        ])
    }

    /// Byte order used by image encoders: `[r, g, b, a]`
    #[inline]
    pub fn to_rgba_bytes(color: u32) -> [u8; 4] {
        [
            Self::red(color),
            Self::green(color),
            Self::blue(color),
            Self::alpha(color),
        ]
    }

    #[inline]
    pub fn red(color: u32) -> u8 {
        ((color >> 16) & 0xFF) as u8
    }

    #[inline]
    pub fn green(color: u32) -> u8 {
        ((color >> 8) & 0xFF) as u8
    }

    #[inline]
    pub fn blue(color: u32) -> u8 {
        (color & 0xFF) as u8
    }

    #[inline]
    pub fn alpha(color: u32) -> u8 {
        ((color >> 24) & 0xFF) as u8
    }

    /// Construct ARGB color from components
    #[inline]
    pub fn from_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
        ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
    }

    /// Construct RGB color with full alpha
    #[inline]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> u32 {
        Self::from_argb(0xFF, r, g, b)
    }
}
