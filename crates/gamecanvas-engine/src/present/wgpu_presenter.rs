use anyhow::bail;
use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;

use crate::canvas::Framebuffer;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::paint::Color;

use super::PresentationSurface;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct BlitUniform {
    scale: [f32; 2],
    _pad: [f32; 2],
}

/// Uploaded copy of the last presented framebuffer.
struct FrameTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Shows canvas frames in a window through wgpu.
///
/// Each presented framebuffer is uploaded to a texture and drawn as a single
/// quad, scaled to the largest size that fits the window without changing the
/// aspect ratio. The remaining area is filled with `letterbox` colour.
///
/// GPU objects are created lazily on first use and recreated only when the
/// surface format or the framebuffer size changes.
pub struct WgpuPresenter<'w> {
    gpu: Gpu<'w>,
    letterbox: Color,

    pipeline: Option<wgpu::RenderPipeline>,
    pipeline_format: Option<wgpu::TextureFormat>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    sampler: Option<wgpu::Sampler>,
    uniform: Option<wgpu::Buffer>,

    frame: Option<FrameTexture>,
    bind_group: Option<wgpu::BindGroup>,
}

impl<'w> WgpuPresenter<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        Self {
            gpu,
            letterbox: Color::BLACK,
            pipeline: None,
            pipeline_format: None,
            bind_group_layout: None,
            sampler: None,
            uniform: None,
            frame: None,
            bind_group: None,
        }
    }

    /// Colour of the bars around the frame.
    pub fn set_letterbox_color(&mut self, color: Color) {
        self.letterbox = color;
    }

    /// Follows a window resize. The frame is redrawn on the next
    /// [`redraw`](Self::redraw) or `present`.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
    }

    /// Draws the last uploaded frame again, e.g. after the window was
    /// resized or exposed between ticks. Does nothing before the first frame.
    pub fn redraw(&mut self) -> anyhow::Result<()> {
        if !self.gpu.is_presentable() {
            return Ok(());
        }
        let Some(frame_size) = self.frame.as_ref().map(|f| f.size) else {
            return Ok(());
        };

        self.write_uniform(frame_size);

        // Nothing to blit yet; leave the swapchain texture unacquired.
        let (Some(pipeline), Some(bind_group)) = (self.pipeline.as_ref(), self.bind_group.as_ref())
        else {
            return Ok(());
        };

        let mut target = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => match self.gpu.handle_surface_error(err) {
                SurfaceErrorAction::Fatal => bail!("surface is unusable (out of memory)"),
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    return Ok(());
                }
            },
        };

        {
            let clear = clear_color(self.letterbox, self.gpu.surface_format().is_srgb());
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("gamecanvas present pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.draw(0..6, 0..1);
        }

        self.gpu.submit(target);
        Ok(())
    }

    fn upload(&mut self, frame: &Framebuffer) {
        self.ensure_pipeline();
        self.ensure_sampler();
        self.ensure_uniform();
        self.ensure_texture(frame.size());
        self.ensure_bindings();

        let Some(tex) = self.frame.as_ref() else { return };
        let (width, height) = tex.size;

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
    }

    fn write_uniform(&self, frame_size: (u32, u32)) {
        let Some(uniform) = self.uniform.as_ref() else { return };
        let data = BlitUniform {
            scale: letterbox_scale(frame_size, self.gpu.size()),
            _pad: [0.0; 2],
        };
        self.gpu.queue().write_buffer(uniform, 0, bytemuck::bytes_of(&data));
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    /// Texture format matching the surface's colour encoding. Framebuffer
    /// bytes are sRGB, so an sRGB surface gets an sRGB texture and the
    /// round-trip is lossless.
    fn texture_format(&self) -> wgpu::TextureFormat {
        if self.gpu.surface_format().is_srgb() {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }

    fn ensure_pipeline(&mut self) {
        let surface_format = self.gpu.surface_format();
        if self.pipeline_format == Some(surface_format) && self.pipeline.is_some() {
            return;
        }

        let device = self.gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("gamecanvas blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gamecanvas blit bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<BlitUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("gamecanvas blit pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("gamecanvas blit pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("blit pipeline built for {surface_format:?}");

        self.pipeline_format = Some(surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bgl);
        self.bind_group = None;
    }

    fn ensure_sampler(&mut self) {
        if self.sampler.is_some() {
            return;
        }
        // Nearest keeps pixel art crisp when scaled up.
        self.sampler = Some(self.gpu.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some("gamecanvas blit sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_uniform(&mut self) {
        if self.uniform.is_some() {
            return;
        }
        self.uniform = Some(self.gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("gamecanvas blit ubo"),
            size: std::mem::size_of::<BlitUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
    }

    fn ensure_texture(&mut self, size: (u32, u32)) {
        if self.frame.as_ref().is_some_and(|f| f.size == size) {
            return;
        }

        let (width, height) = size;
        let texture = self.gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("gamecanvas frame texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("frame texture (re)created at {width}x{height}");

        self.frame = Some(FrameTexture { texture, view, size });
        self.bind_group = None;
    }

    fn ensure_bindings(&mut self) {
        if self.bind_group.is_some() {
            return;
        }

        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(uniform) = self.uniform.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };
        let Some(frame) = self.frame.as_ref() else { return };

        let bind_group = self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gamecanvas blit bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&frame.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        self.bind_group = Some(bind_group);
    }
}

impl PresentationSurface for WgpuPresenter<'_> {
    fn present(&mut self, frame: &Framebuffer) -> anyhow::Result<()> {
        self.upload(frame);
        self.redraw()
    }
}

/// Clear value for `color` on a target of the given encoding.
///
/// wgpu clear colours are linear; an sRGB target encodes them on store, so
/// the sRGB bytes of `color` are decoded first. Alpha is always linear.
fn clear_color(color: Color, srgb_target: bool) -> wgpu::Color {
    let [r, g, b, a] = color.to_f64();
    if !srgb_target {
        return wgpu::Color { r, g, b, a };
    }
    wgpu::Color {
        r: srgb_to_linear(r),
        g: srgb_to_linear(g),
        b: srgb_to_linear(b),
        a,
    }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Scale applied to a full-window quad so a `frame`-sized image fits inside
/// `window` with its aspect ratio preserved.
///
/// One component is always `1.0`; the other shrinks the axis that has spare
/// room. Degenerate sizes yield `[1.0, 1.0]`.
pub fn letterbox_scale(frame: (u32, u32), window: PhysicalSize<u32>) -> [f32; 2] {
    let (fw, fh) = frame;
    if fw == 0 || fh == 0 || window.width == 0 || window.height == 0 {
        return [1.0, 1.0];
    }

    let frame_aspect = fw as f32 / fh as f32;
    let window_aspect = window.width as f32 / window.height as f32;

    if window_aspect > frame_aspect {
        [frame_aspect / window_aspect, 1.0]
    } else {
        [1.0, window_aspect / frame_aspect]
    }
}
