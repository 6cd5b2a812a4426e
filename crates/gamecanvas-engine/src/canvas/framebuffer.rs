use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbaImage;

use crate::paint::Color;

use super::{CanvasError, ResourceStats};

/// Allocation and release counters shared by the buffers of one canvas.
///
/// A tracked buffer counts itself as allocated once its storage exists and
/// as released when it is dropped.
#[derive(Debug, Default)]
pub(crate) struct BufferLedger {
    allocated: AtomicU64,
    released: AtomicU64,
}

impl BufferLedger {
    pub(crate) fn stats(&self) -> ResourceStats {
        ResourceStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

/// Off-screen RGBA8 pixel buffer accumulating one frame.
///
/// Rows are tightly packed (`4 * width` bytes per row), top row first.
pub struct Framebuffer {
    image: RgbaImage,
    ledger: Option<Arc<BufferLedger>>,
}

impl Framebuffer {
    /// Allocates a buffer of exactly `width` x `height` pixels, cleared to
    /// transparent black.
    ///
    /// Storage is reserved fallibly so an oversized request is reported
    /// instead of aborting the process.
    pub fn allocate(width: u32, height: u32) -> Result<Self, CanvasError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(CanvasError::TooLarge { width, height })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|source| CanvasError::Allocation { width, height, source })?;
        data.resize(len, 0);

        let image = RgbaImage::from_raw(width, height, data)
            .ok_or(CanvasError::TooLarge { width, height })?;

        Ok(Self { image, ledger: None })
    }

    /// Like [`allocate`](Self::allocate), counted in `ledger` until dropped.
    pub(crate) fn allocate_tracked(
        width: u32,
        height: u32,
        ledger: &Arc<BufferLedger>,
    ) -> Result<Self, CanvasError> {
        let mut fb = Self::allocate(width, height)?;
        ledger.allocated.fetch_add(1, Ordering::Relaxed);
        fb.ledger = Some(Arc::clone(ledger));
        Ok(fb)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Raw RGBA bytes, ready for upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Borrow as an `image` buffer, e.g. to encode a screenshot.
    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Colour at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image
            .get_pixel_checked(x, y)
            .map(|p| Color::from(*p))
    }

    /// Overwrites every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.image.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    /// Writes one pixel; out-of-bounds writes are dropped.
    #[inline]
    pub(crate) fn put(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x < self.width() && y < self.height() {
            self.image.put_pixel(x, y, color.into());
        }
    }

    /// Source-over blend of `color` onto the pixel at `(x, y)`.
    pub(crate) fn blend(&mut self, x: i32, y: i32, color: Color) {
        match color.a {
            0 => {}
            255 => self.put(x, y, color),
            a => {
                if x < 0 || y < 0 {
                    return;
                }
                let Some(dst) = self.image.get_pixel_mut_checked(x as u32, y as u32) else {
                    return;
                };
                let a = a as u32;
                let inv = 255 - a;
                let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
                dst[0] = mix(color.r, dst[0]);
                dst[1] = mix(color.g, dst[1]);
                dst[2] = mix(color.b, dst[2]);
                dst[3] = (a + (dst[3] as u32 * inv + 127) / 255).min(255) as u8;
            }
        }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if let Some(ledger) = &self.ledger {
            ledger.released.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framebuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
