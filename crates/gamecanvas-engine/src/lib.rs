//! gamecanvas engine crate.
//!
//! A fixed-rate update/draw loop over an off-screen RGBA framebuffer, with a
//! template/instance entity model and a native winit + wgpu host.
//!
//! Typical setup:
//! 1. build a [`canvas::Canvas`] and register [`entity::Template`]s in its world
//! 2. wrap it in a [`core::FrameDriver`] and bind the global hooks
//! 3. hand the driver to [`window::Runtime::run`], or call
//!    [`core::FrameDriver::poll`] yourself with any
//!    [`present::PresentationSurface`]

pub mod canvas;
pub mod coords;
pub mod core;
pub mod device;
pub mod entity;
pub mod logging;
pub mod paint;
pub mod present;
pub mod time;
pub mod window;
