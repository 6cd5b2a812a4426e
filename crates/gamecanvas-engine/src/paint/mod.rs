//! Colour model shared by the canvas and the presenter.
//!
//! The canvas stores straight-alpha sRGB bytes; the presenter samples them
//! through an sRGB texture so no manual gamma handling is needed.

pub mod color;

pub use color::Color;
