/// Swapchain image acquired for one presentation.
///
/// Holding the surface texture blocks acquisition of the next one; submit it
/// through [`Gpu::submit`](super::Gpu::submit) promptly.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
