//! Canvas: the surface owner.
//!
//! Owns the off-screen framebuffer, the settings hooks can tune (frame rate,
//! background, viewport origin) and the [`World`] of registered templates.
//!
//! Invariant: the framebuffer dimensions always equal the viewport size.
//! The viewport size is derived from the framebuffer, and only
//! [`Canvas::resize_viewport`] replaces the framebuffer.

mod drawing;
mod error;
mod framebuffer;
mod settings;

pub use drawing::DrawingContext;
pub use error::CanvasError;
pub use framebuffer::Framebuffer;
pub use settings::CanvasSettings;

use std::sync::Arc;

use embedded_graphics::geometry::Point;

use framebuffer::BufferLedger;

use crate::coords::Viewport;
use crate::entity::World;

/// Framebuffer allocation bookkeeping.
///
/// Buffers count themselves: `allocated` grows when storage is obtained and
/// `released` when a buffer is dropped. `live()` is the number of buffers of
/// this canvas still alive and is `1` between any two public calls.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ResourceStats {
    pub allocated: u64,
    pub released: u64,
}

impl ResourceStats {
    #[inline]
    pub fn live(&self) -> u64 {
        self.allocated - self.released
    }
}

/// Surface owner driven by [`FrameDriver`](crate::core::FrameDriver).
///
/// Resizing is only possible through `&mut Canvas`, which hooks never
/// receive, so a resize cannot happen while a tick is in progress.
#[derive(Debug)]
pub struct Canvas {
    pub(crate) settings: CanvasSettings,
    pub(crate) framebuffer: Framebuffer,
    pub(crate) world: World,
    ledger: Arc<BufferLedger>,
}

impl Canvas {
    /// Creates a canvas with a `width` x `height` viewport and default settings.
    pub fn new(width: i32, height: i32) -> Result<Self, CanvasError> {
        let (w, h) = validate_size(width, height)?;
        let ledger = Arc::new(BufferLedger::default());
        let framebuffer = Framebuffer::allocate_tracked(w, h, &ledger)?;
        log::debug!("canvas created with a {w}x{h} framebuffer");

        Ok(Self {
            settings: CanvasSettings::default(),
            framebuffer,
            world: World::new(),
            ledger,
        })
    }

    /// Canvas with the default 320x240 viewport.
    pub fn with_default_viewport() -> Result<Self, CanvasError> {
        Self::new(Viewport::DEFAULT_WIDTH as i32, Viewport::DEFAULT_HEIGHT as i32)
    }

    /// Replaces the framebuffer with one of exactly `width` x `height` pixels.
    ///
    /// The new buffer is allocated before the old one is released. On error
    /// the canvas is left untouched: same buffer, same viewport.
    ///
    /// Must not be called while a tick is running; `&mut self` enforces this.
    pub fn resize_viewport(&mut self, width: i32, height: i32) -> Result<(), CanvasError> {
        let (w, h) = validate_size(width, height)?;

        let next = Framebuffer::allocate_tracked(w, h, &self.ledger)?;
        let previous = std::mem::replace(&mut self.framebuffer, next);
        let (pw, ph) = previous.size();
        drop(previous);

        log::debug!("viewport resized {pw}x{ph} -> {w}x{h}");
        Ok(())
    }

    /// Current viewport: settings origin plus framebuffer size.
    pub fn viewport(&self) -> Viewport {
        let (x, y) = self.settings.origin;
        let (width, height) = self.framebuffer.size();
        Viewport::new(x, y, width, height)
    }

    /// Drawing handle in framebuffer pixels, valid until the next resize.
    pub fn drawing_context(&mut self) -> DrawingContext<'_> {
        DrawingContext::screen(&mut self.framebuffer)
    }

    /// Drawing handle in world coordinates (translated by the viewport origin).
    pub fn world_drawing_context(&mut self) -> DrawingContext<'_> {
        let (x, y) = self.settings.origin;
        DrawingContext::world(&mut self.framebuffer, Point::new(x, y))
    }

    #[inline]
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    #[inline]
    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    #[inline]
    pub fn settings_mut(&mut self) -> &mut CanvasSettings {
        &mut self.settings
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[inline]
    pub fn resource_stats(&self) -> ResourceStats {
        self.ledger.stats()
    }
}

fn validate_size(width: i32, height: i32) -> Result<(u32, u32), CanvasError> {
    if width <= 0 || height <= 0 {
        return Err(CanvasError::InvalidViewport { width, height });
    }
    Ok((width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Color;

    #[test]
    fn default_viewport_is_320_by_240() {
        let canvas = Canvas::with_default_viewport().unwrap();
        assert_eq!(canvas.viewport(), Viewport::new(0, 0, 320, 240));
        assert_eq!(canvas.settings().fps(), 30);
        assert_eq!(canvas.settings().background, Color::LIGHT_GRAY);
    }

    #[test]
    fn resize_matches_requested_size() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.resize_viewport(64, 48).unwrap();
        assert_eq!(canvas.framebuffer().size(), (64, 48));
        assert_eq!(canvas.viewport().size(), (64, 48));
    }

    #[test]
    fn repeated_resizes_keep_exactly_one_live_buffer() {
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.resize_viewport(20, 20).unwrap();
        canvas.resize_viewport(30, 15).unwrap();

        let stats = canvas.resource_stats();
        assert_eq!(stats.allocated, 3);
        assert_eq!(stats.released, 2);
        assert_eq!(stats.live(), 1);
    }

    #[test]
    fn non_positive_resize_is_rejected_and_buffer_kept() {
        let mut canvas = Canvas::new(12, 9).unwrap();
        canvas.drawing_context().clear(Color::RED);

        for (w, h) in [(0, 10), (10, 0), (-5, 10), (10, -1)] {
            let err = canvas.resize_viewport(w, h).unwrap_err();
            assert!(matches!(err, CanvasError::InvalidViewport { width, height } if width == w && height == h));
        }

        assert_eq!(canvas.framebuffer().size(), (12, 9));
        assert_eq!(canvas.framebuffer().pixel(11, 8), Some(Color::RED));
        assert_eq!(canvas.resource_stats().live(), 1);
        assert_eq!(canvas.resource_stats().allocated, 1);
    }

    #[test]
    fn failed_allocation_keeps_previous_buffer() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.drawing_context().clear(Color::BLUE);

        let err = canvas.resize_viewport(i32::MAX, i32::MAX).unwrap_err();
        assert!(matches!(
            err,
            CanvasError::Allocation { .. } | CanvasError::TooLarge { .. }
        ));

        assert_eq!(canvas.viewport().size(), (4, 4));
        assert_eq!(canvas.framebuffer().pixel(0, 0), Some(Color::BLUE));
        assert_eq!(canvas.resource_stats(), ResourceStats { allocated: 1, released: 0 });
    }

    #[test]
    fn new_rejects_non_positive_size() {
        assert!(matches!(
            Canvas::new(0, 240),
            Err(CanvasError::InvalidViewport { width: 0, height: 240 })
        ));
    }

    #[test]
    fn viewport_origin_follows_settings() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        canvas.settings_mut().origin = (3, -2);
        assert_eq!(canvas.viewport(), Viewport::new(3, -2, 8, 8));
    }
}
