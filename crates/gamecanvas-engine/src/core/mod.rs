//! Core loop contracts.
//!
//! This module defines the frame driver and the contexts its hooks receive.
//! Hooks only ever see the pieces of the canvas a phase is allowed to touch,
//! never the canvas itself.

mod ctx;
mod driver;
mod error;
mod hooks;
mod phase;

pub use ctx::{DrawCtx, GlobalDrawCtx, GlobalUpdateCtx, UpdateCtx};
pub use driver::FrameDriver;
pub use error::TickError;
pub use hooks::{GlobalDrawFn, GlobalHooks, GlobalUpdateFn};
pub use phase::Phase;
