use std::collections::TryReserveError;

/// Configuration and resource errors raised by [`Canvas`](super::Canvas).
///
/// None of these leave the canvas half-updated: the previous framebuffer and
/// settings stay in place whenever an error is returned.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// Viewport dimensions must both be positive.
    #[error("invalid viewport size {width}x{height}: width and height must be positive")]
    InvalidViewport { width: i32, height: i32 },

    /// Frame rate must be at least one tick per second.
    #[error("invalid frame rate {0}: must be at least 1 tick per second")]
    InvalidFrameRate(u32),

    /// The pixel count does not fit the address space.
    #[error("framebuffer {width}x{height} exceeds the addressable size")]
    TooLarge { width: u32, height: u32 },

    /// The allocator refused the pixel storage.
    #[error("failed to allocate a {width}x{height} framebuffer")]
    Allocation {
        width: u32,
        height: u32,
        #[source]
        source: TryReserveError,
    },
}
