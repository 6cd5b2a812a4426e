//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the frame driver
//! and the wgpu presenter.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
