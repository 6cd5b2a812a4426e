//! Frame presentation.
//!
//! The loop only needs somewhere to hand each finished framebuffer. Anything
//! that can show (or record) a frame implements [`PresentationSurface`]; the
//! native host uses [`WgpuPresenter`].

mod wgpu_presenter;

pub use wgpu_presenter::{letterbox_scale, WgpuPresenter};

use crate::canvas::Framebuffer;

/// Destination of finished frames.
pub trait PresentationSurface {
    /// Shows `frame`. Called once per completed tick, after every hook ran.
    fn present(&mut self, frame: &Framebuffer) -> anyhow::Result<()>;
}

impl<S: PresentationSurface + ?Sized> PresentationSurface for &mut S {
    fn present(&mut self, frame: &Framebuffer) -> anyhow::Result<()> {
        (**self).present(frame)
    }
}
