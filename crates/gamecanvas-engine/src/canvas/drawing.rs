use core::convert::Infallible;

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use image::RgbaImage;

use crate::paint::Color;

use super::Framebuffer;

/// Drawing handle bound to the canvas framebuffer.
///
/// Any `embedded-graphics` drawable can target it directly:
///
/// ```rust,ignore
/// Circle::new(Point::new(10, 10), 8)
///     .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
///     .draw(&mut ctx.canvas)?;
/// ```
///
/// Coordinates are translated by `origin`: world-space contexts subtract the
/// viewport origin, screen-space contexts (overlay) use `(0, 0)`.
///
/// The handle borrows the framebuffer, so it cannot outlive a tick or be held
/// across a viewport resize.
pub struct DrawingContext<'a> {
    target: &'a mut Framebuffer,
    origin: Point,
}

impl<'a> DrawingContext<'a> {
    /// Context drawing in framebuffer pixels.
    #[inline]
    pub fn screen(target: &'a mut Framebuffer) -> Self {
        Self { target, origin: Point::zero() }
    }

    /// Context drawing in world coordinates seen through a viewport at `origin`.
    #[inline]
    pub fn world(target: &'a mut Framebuffer, origin: Point) -> Self {
        Self { target, origin }
    }

    /// World position mapped to the top-left pixel of the framebuffer.
    #[inline]
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Framebuffer size in pixels.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    /// Fills the whole buffer, ignoring the origin.
    pub fn clear(&mut self, color: Color) {
        self.target.fill(color);
    }

    pub fn set_pixel(&mut self, at: Point, color: Color) {
        let p = at - self.origin;
        self.target.blend(p.x, p.y, color);
    }

    pub fn draw_line(&mut self, from: Point, to: Point, color: Color, width: u32) {
        let Ok(()) = Line::new(from, to)
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::from(color), width))
            .draw(self);
    }

    /// Fills a rectangle. Translucent colours are blended over what is
    /// already there.
    pub fn fill_rect(&mut self, top_left: Point, size: Size, color: Color) {
        let rect = Rectangle::new(top_left, size);
        if color.a == u8::MAX {
            let Ok(()) = rect
                .into_styled(PrimitiveStyle::with_fill(Rgb888::from(color)))
                .draw(self);
            return;
        }
        for p in rect.points() {
            let p = p - self.origin;
            self.target.blend(p.x, p.y, color);
        }
    }

    /// Draws `text` in the built-in 6x10 monospace font, `at` being the
    /// top-left corner of the first glyph.
    pub fn draw_text(&mut self, text: &str, at: Point, color: Color) {
        let style = MonoTextStyle::new(&FONT_6X10, Rgb888::from(color));
        let Ok(_) = Text::with_baseline(text, at, style, Baseline::Top).draw(self);
    }

    /// Blends an RGBA image with its top-left corner at `at`.
    pub fn draw_image(&mut self, image: &RgbaImage, at: Point) {
        let base = at - self.origin;
        for (x, y, px) in image.enumerate_pixels() {
            self.target.blend(
                base.x + x as i32,
                base.y + y as i32,
                Color::from(*px),
            );
        }
    }
}

impl DrawTarget for DrawingContext<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let p = point - self.origin;
            self.target.put(p.x, p.y, color.into());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.target.fill(color.into());
        Ok(())
    }
}

impl OriginDimensions for DrawingContext<'_> {
    fn size(&self) -> Size {
        let (w, h) = self.target.size();
        Size::new(w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> Framebuffer {
        let mut fb = Framebuffer::allocate(8, 8).unwrap();
        fb.fill(Color::BLACK);
        fb
    }

    #[test]
    fn line_lands_in_buffer() {
        let mut fb = buffer();
        DrawingContext::screen(&mut fb).draw_line(
            Point::new(0, 0),
            Point::new(7, 7),
            Color::RED,
            1,
        );
        assert_eq!(fb.pixel(0, 0), Some(Color::RED));
        assert_eq!(fb.pixel(7, 7), Some(Color::RED));
        assert_eq!(fb.pixel(7, 0), Some(Color::BLACK));
    }

    #[test]
    fn world_context_subtracts_origin() {
        let mut fb = buffer();
        DrawingContext::world(&mut fb, Point::new(10, 5)).fill_rect(
            Point::new(10, 5),
            Size::new(1, 1),
            Color::WHITE,
        );
        assert_eq!(fb.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(fb.pixel(1, 0), Some(Color::BLACK));
    }

    #[test]
    fn offscreen_primitives_are_clipped() {
        let mut fb = buffer();
        DrawingContext::screen(&mut fb).fill_rect(
            Point::new(-4, -4),
            Size::new(20, 2),
            Color::WHITE,
        );
        assert!(fb.as_bytes().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn translucent_fill_blends() {
        let mut fb = buffer();
        DrawingContext::screen(&mut fb).fill_rect(
            Point::new(1, 1),
            Size::new(2, 2),
            Color::rgba(255, 255, 255, 128),
        );
        assert_eq!(fb.pixel(1, 1), Some(Color::rgb(128, 128, 128)));
        assert_eq!(fb.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn draw_image_skips_transparent_pixels() {
        let mut fb = buffer();
        let mut sprite = RgbaImage::new(2, 1);
        sprite.put_pixel(0, 0, image::Rgba([0, 0, 255, 255]));
        sprite.put_pixel(1, 0, image::Rgba([255, 255, 255, 0]));
        DrawingContext::screen(&mut fb).draw_image(&sprite, Point::new(3, 3));
        assert_eq!(fb.pixel(3, 3), Some(Color::BLUE));
        assert_eq!(fb.pixel(4, 3), Some(Color::BLACK));
    }

    #[test]
    fn text_writes_some_pixels() {
        let mut fb = Framebuffer::allocate(32, 12).unwrap();
        fb.fill(Color::BLACK);
        DrawingContext::screen(&mut fb).draw_text("A", Point::zero(), Color::WHITE);
        assert!(fb.as_bytes().chunks_exact(4).any(|px| px == [255, 255, 255, 255]));
    }
}
