/// Viewport rectangle in framebuffer pixels.
///
/// `width`/`height` always match the dimensions of the canvas framebuffer;
/// only `Canvas::resize_viewport` changes them. `x`/`y` are the viewport
/// origin in world space and are free for the application to move.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const DEFAULT_WIDTH: u32 = 320;
    pub const DEFAULT_HEIGHT: u32 = 240;

    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub const fn size(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0, Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}
