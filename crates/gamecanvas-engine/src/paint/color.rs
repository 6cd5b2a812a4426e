use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

/// Straight-alpha sRGB colour, one byte per channel.
///
/// This matches the framebuffer layout (`image::Rgba<u8>`) byte for byte, so
/// clearing and pixel writes need no conversion beyond reordering.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `0xRRGGBB` into an opaque colour.
    #[inline]
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Channels normalized to `[0, 1]` (still sRGB encoded).
    #[inline]
    pub fn to_f64(self) -> [f64; 4] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
            self.a as f64 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::LIGHT_GRAY
    }
}

impl From<Rgb888> for Color {
    #[inline]
    fn from(c: Rgb888) -> Self {
        Self::rgb(c.r(), c.g(), c.b())
    }
}

impl From<Color> for Rgb888 {
    #[inline]
    fn from(c: Color) -> Self {
        Rgb888::new(c.r, c.g, c.b)
    }
}

impl From<Color> for image::Rgba<u8> {
    #[inline]
    fn from(c: Color) -> Self {
        image::Rgba(c.to_bytes())
    }
}

impl From<image::Rgba<u8>> for Color {
    #[inline]
    fn from(px: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0;
        Self::rgba(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_splits_channels() {
        assert_eq!(Color::from_hex(0xD3D3D3), Color::LIGHT_GRAY);
        assert_eq!(Color::from_hex(0x102030), Color::rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn rgb888_round_trip_is_opaque() {
        let c: Color = Rgb888::new(1, 2, 3).into();
        assert_eq!(c, Color::rgba(1, 2, 3, 255));
    }

    #[test]
    fn rgba_pixel_keeps_alpha() {
        let c = Color::from(image::Rgba([10, 20, 30, 40]));
        assert_eq!(c, Color::rgba(10, 20, 30, 40));
        assert_eq!(image::Rgba::from(c), image::Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn default_is_light_gray() {
        assert_eq!(Color::default(), Color::LIGHT_GRAY);
    }
}
