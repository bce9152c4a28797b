use std::sync::Arc;

use bytemuck::Pod;
use winit::window::Window;

use crate::config::RendererConfig;
use crate::device::{drawable_size, Gpu};
use crate::error::{AfferentError, Result};
use crate::window::NativeWindow;

use super::animated::AnimatedBuffers;
use super::draw3d::OceanGrid;
use super::pipeline::{build_pipelines, BindLayouts, DrawMode, PipelineTable};
use super::pool::{BufferKind, BufferPool, PoolStats, WgpuAllocator, WrapperRing};
use super::targets::{FrameTargets, TargetCache, TargetSpec};

/// A GPU texture bound together with its sampler.
pub struct GpuTexture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) bind_group: wgpu::BindGroup,
}

/// A GPU buffer and the number of elements it holds.
#[derive(Debug, Clone)]
pub struct GpuBuffer {
    pub(crate) buffer: wgpu::Buffer,
    pub(crate) count: u32,
}

impl GpuBuffer {
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }
}

/// State of the frame between `begin_frame` and `end_frame`.
pub(super) struct Frame {
    // Dropped before the encoder is finished.
    pub(super) pass: wgpu::RenderPass<'static>,
    encoder: wgpu::CommandEncoder,
    surface: wgpu::SurfaceTexture,
    pub(super) msaa: bool,
}

/// Owns the GPU device, every pipeline and all per-frame resources.
///
/// Lifecycle: `begin_frame` → draw calls → `end_frame`. Draw calls issued
/// outside a frame are ignored. Malformed draw input is a silent no-op.
pub struct Renderer {
    window: Arc<Window>,
    pub(super) gpu: Gpu,
    pub(super) pipelines: PipelineTable<wgpu::RenderPipeline>,
    pub(super) layouts: BindLayouts,
    pub(super) sampler: wgpu::Sampler,
    pub(super) pool: BufferPool<WgpuAllocator>,
    pub(super) wrappers: WrapperRing<(GpuBuffer, GpuBuffer)>,
    targets: TargetCache<FrameTargets>,
    msaa_enabled: bool,
    drawable_scale: f32,
    pub(super) screen: (f32, f32),
    pub(super) frame: Option<Frame>,
    pub(super) animated: AnimatedBuffers,
    pub(super) ocean: Option<OceanGrid>,
}

impl Renderer {
    /// Creates the GPU context for `window` and builds every pipeline.
    pub fn new(window: &NativeWindow, config: RendererConfig) -> Result<Self> {
        let handle = window.handle();
        let gpu = pollster::block_on(Gpu::new(Arc::clone(&handle), config.gpu.clone()))?;
        let format = gpu.surface_format();

        let msaa_samples = if gpu.supports_sample_count(format, config.msaa_samples)
            && gpu.supports_sample_count(super::pipeline::DEPTH_FORMAT, config.msaa_samples)
        {
            Some(config.msaa_samples)
        } else if matches!(config.msaa_samples, 2 | 4 | 8) {
            log::warn!(
                "adapter cannot render {format:?} at {}x MSAA; MSAA disabled",
                config.msaa_samples
            );
            None
        } else {
            // Rejected by the pipeline table with a proper error.
            Some(config.msaa_samples)
        };

        let layouts = BindLayouts::new(gpu.device());
        let pipelines = build_pipelines(gpu.device(), format, &layouts, msaa_samples)?;

        let sampler = gpu.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some("afferent sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let pool = BufferPool::new(WgpuAllocator::new(gpu.device().clone()), config.pool.clone());
        let wrappers = WrapperRing::new(config.pool.wrapper_slots);
        let (w, h) = gpu.drawable_size();

        log::info!("renderer ready ({format:?}, msaa x{})", pipelines.msaa_samples());

        Ok(Self {
            window: handle,
            gpu,
            pipelines,
            layouts,
            sampler,
            pool,
            wrappers,
            targets: TargetCache::default(),
            msaa_enabled: config.msaa_enabled,
            drawable_scale: 0.0,
            screen: (w as f32, h as f32),
            frame: None,
            animated: AnimatedBuffers::default(),
            ocean: None,
        })
    }

    // ── toggles ───────────────────────────────────────────────────────────

    /// Enables or disables MSAA from the next `begin_frame`.
    pub fn set_msaa(&mut self, enabled: bool) {
        self.msaa_enabled = enabled;
    }

    #[inline]
    pub fn msaa_enabled(&self) -> bool {
        self.msaa_enabled
    }

    /// Sets the drawable scale from the next `begin_frame` (`0.0` = native).
    pub fn set_drawable_scale(&mut self, scale: f32) {
        self.drawable_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    #[inline]
    pub fn drawable_scale(&self) -> f32 {
        self.drawable_scale
    }

    /// Drawable size in pixels used for NDC conversion.
    #[inline]
    pub fn screen_size(&self) -> (f32, f32) {
        self.screen
    }

    #[inline]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    #[inline]
    pub fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    // ── frame lifecycle ───────────────────────────────────────────────────

    /// Acquires the next drawable and opens a pass cleared to `clear`.
    ///
    /// An error means this frame must be skipped; the renderer stays usable.
    pub fn begin_frame(&mut self, clear: [f32; 4]) -> Result<()> {
        if self.frame.take().is_some() {
            log::warn!("begin_frame called twice; discarding the unfinished frame");
            self.reset_frame_resources();
        }

        let physical = self.window.inner_size();
        let (w, h) = drawable_size(
            (physical.width, physical.height),
            self.window.scale_factor(),
            self.drawable_scale,
        );
        if w == 0 || h == 0 {
            return Err(AfferentError::Device("drawable has zero size".into()));
        }
        self.gpu.resize(w, h);

        let surface = match self.gpu.acquire() {
            Ok(t) => t,
            Err(e) => {
                let msg = e.to_string();
                let action = self.gpu.handle_surface_error(e);
                log::debug!("surface acquire failed ({action:?}): {msg}");
                return Err(AfferentError::Device(format!("surface unavailable: {msg}")));
            }
        };
        if surface.suboptimal {
            log::trace!("surface texture is suboptimal");
        }

        let msaa = self.msaa_enabled && self.pipelines.msaa_samples() > 1;
        let spec = TargetSpec {
            width: surface.texture.width(),
            height: surface.texture.height(),
            sample_count: self.pipelines.sample_count(msaa),
        };
        let format = self.gpu.surface_format();
        let device = self.gpu.device();
        let targets = self
            .targets
            .ensure(spec, |s| FrameTargets::new(device, format, s));

        let surface_view = surface
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("afferent frame encoder"),
        });

        let clear = wgpu::Color {
            r: f64::from(clear[0]),
            g: f64::from(clear[1]),
            b: f64::from(clear[2]),
            a: f64::from(clear[3]),
        };
        let color = match &targets.msaa_color {
            Some(msaa_view) => wgpu::RenderPassColorAttachment {
                view: msaa_view,
                resolve_target: Some(&surface_view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Discard,
                },
                depth_slice: None,
            },
            None => wgpu::RenderPassColorAttachment {
                view: &surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            },
        };

        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("afferent frame pass"),
                color_attachments: &[Some(color)],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.screen = (spec.width as f32, spec.height as f32);
        self.frame = Some(Frame {
            pass,
            encoder,
            surface,
            msaa,
        });
        Ok(())
    }

    /// Closes the pass, submits and presents, then recycles pooled buffers.
    pub fn end_frame(&mut self) -> Result<()> {
        let Some(frame) = self.frame.take() else {
            log::trace!("end_frame outside a frame ignored");
            return Ok(());
        };
        let Frame {
            pass,
            encoder,
            surface,
            ..
        } = frame;
        drop(pass);

        self.gpu.queue().submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface.present();

        self.reset_frame_resources();
        Ok(())
    }

    fn reset_frame_resources(&mut self) {
        self.pool.reset_frame();
        self.wrappers.reset();
    }

    // ── helpers for the draw families ─────────────────────────────────────

    /// Whether a draw may be recorded; logs when it may not.
    pub(super) fn accepts_draw(&self, what: &str) -> bool {
        if self.frame.is_none() {
            log::trace!("{what} outside a frame ignored");
            return false;
        }
        true
    }

    /// Whether a buffer of `len` bytes is within the device limit; logs when
    /// it is not.
    pub(super) fn buffer_fits(&self, len: u64, what: &str) -> bool {
        let limit = self.gpu.device().limits().max_buffer_size;
        if len > limit {
            log::warn!("{what}: {len} bytes exceeds the device buffer limit of {limit}");
            return false;
        }
        true
    }

    /// Whether a `width x height` texture is within the device limit; logs
    /// when it is not.
    pub(super) fn texture_fits(&self, width: u32, height: u32, what: &str) -> bool {
        let limit = self.gpu.device().limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            log::warn!("{what}: {width}x{height} exceeds the device texture limit of {limit}");
            return false;
        }
        true
    }

    /// Copies `bytes` into a pooled buffer unused this frame.
    ///
    /// `None` when `bytes` is larger than the device can allocate.
    pub(super) fn upload(&mut self, kind: BufferKind, bytes: &[u8]) -> Option<wgpu::Buffer> {
        let buffer = self.pool.acquire(kind, bytes.len() as u64)?;
        self.gpu.queue().write_buffer(&buffer, 0, bytes);
        Some(buffer)
    }

    /// Uploads `value` into a pooled uniform buffer and binds it.
    pub(super) fn uniform_bind_group<T: Pod>(&mut self, value: &T) -> Option<wgpu::BindGroup> {
        let buffer = self.upload(BufferKind::Uniform, bytemuck::bytes_of(value))?;
        let group = self
            .gpu
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("afferent uniform bind group"),
                layout: &self.layouts.uniform,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
        Some(group)
    }

    /// Binds `mode`'s pipeline in the open pass and hands the pass to `record`.
    pub(super) fn record(
        &mut self,
        mode: DrawMode,
        record: impl FnOnce(&mut wgpu::RenderPass<'static>),
    ) {
        let Some(frame) = self.frame.as_mut() else { return };
        frame.pass.set_pipeline(self.pipelines.get(mode, frame.msaa));
        record(&mut frame.pass);
    }

    /// Creates a sampled texture plus its bind group.
    pub(super) fn create_texture(
        &self,
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> GpuTexture {
        let device = self.gpu.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        GpuTexture {
            texture,
            bind_group,
        }
    }

    /// Writes rows `y0..y1` of a tightly packed image into `texture`.
    pub(super) fn write_rows(
        &self,
        texture: &wgpu::Texture,
        pixels: &[u8],
        bytes_per_pixel: u32,
        rows: std::ops::Range<u32>,
    ) {
        let width = texture.width();
        let row_bytes = width * bytes_per_pixel;
        let start = rows.start as usize * row_bytes as usize;
        let end = rows.end as usize * row_bytes as usize;
        let Some(data) = pixels.get(start..end) else { return };
        if data.is_empty() {
            return;
        }
        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: rows.start,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row_bytes),
                rows_per_image: Some(rows.end - rows.start),
            },
            wgpu::Extent3d {
                width,
                height: rows.end - rows.start,
                depth_or_array_layers: 1,
            },
        );
    }
}
