//! Coordinate types shared by the canvas, instances and the presenter.
//!
//! Canonical space:
//! - framebuffer pixels
//! - origin top-left
//! - +X right, +Y down

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
