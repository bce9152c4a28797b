//! Pipeline construction for every draw mode, in single-sampled and MSAA
//! variants.

use crate::error::{AfferentError, Result};

use super::layout;

/// Depth format of every render pass.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth behaviour baked into a pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DepthMode {
    /// Test and write (3D meshes).
    Enabled,
    /// Always pass, never write (2D drawn over or under 3D).
    Disabled,
    /// Test but never write, so the translucent surface does not occlude itself.
    Ocean,
}

impl DepthMode {
    fn state(self) -> wgpu::DepthStencilState {
        let (depth_write_enabled, depth_compare) = match self {
            DepthMode::Enabled => (true, wgpu::CompareFunction::Less),
            DepthMode::Disabled => (false, wgpu::CompareFunction::Always),
            DepthMode::Ocean => (false, wgpu::CompareFunction::LessEqual),
        };
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

/// Bind groups a pipeline expects.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingKind {
    None,
    /// Group 0: uniform buffer.
    Uniform,
    /// Group 0: uniform buffer, group 1: texture + sampler.
    Textured,
    /// Group 0: texture + sampler.
    TextureOnly,
}

/// Every kind of draw the renderer can issue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawMode {
    Basic,
    Text,
    Sprite,
    InstancedRect,
    InstancedTriangle,
    InstancedCircle,
    AnimatedRect,
    AnimatedTriangle,
    AnimatedCircle,
    Orbital,
    DynamicCircle,
    DynamicRect,
    DynamicTriangle,
    Mesh3D,
    Mesh3DTextured,
    Ocean,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Shader {
    Basic,
    Text,
    Sprite,
    Instanced,
    Animated,
    Orbital,
    Dynamic,
    Mesh3D,
    Mesh3DTextured,
    Ocean,
}

impl Shader {
    const ALL: [Shader; 10] = [
        Shader::Basic,
        Shader::Text,
        Shader::Sprite,
        Shader::Instanced,
        Shader::Animated,
        Shader::Orbital,
        Shader::Dynamic,
        Shader::Mesh3D,
        Shader::Mesh3DTextured,
        Shader::Ocean,
    ];

    fn source(self) -> &'static str {
        match self {
            Shader::Basic => include_str!("shaders/basic.wgsl"),
            Shader::Text => include_str!("shaders/text.wgsl"),
            Shader::Sprite => include_str!("shaders/sprite.wgsl"),
            Shader::Instanced => include_str!("shaders/instanced.wgsl"),
            Shader::Animated => include_str!("shaders/animated.wgsl"),
            Shader::Orbital => include_str!("shaders/orbital.wgsl"),
            Shader::Dynamic => include_str!("shaders/dynamic.wgsl"),
            Shader::Mesh3D => include_str!("shaders/mesh3d.wgsl"),
            Shader::Mesh3DTextured => include_str!("shaders/mesh3d_textured.wgsl"),
            Shader::Ocean => include_str!("shaders/ocean.wgsl"),
        }
    }
}

impl DrawMode {
    pub const COUNT: usize = 16;

    pub const ALL: [DrawMode; Self::COUNT] = [
        DrawMode::Basic,
        DrawMode::Text,
        DrawMode::Sprite,
        DrawMode::InstancedRect,
        DrawMode::InstancedTriangle,
        DrawMode::InstancedCircle,
        DrawMode::AnimatedRect,
        DrawMode::AnimatedTriangle,
        DrawMode::AnimatedCircle,
        DrawMode::Orbital,
        DrawMode::DynamicCircle,
        DrawMode::DynamicRect,
        DrawMode::DynamicTriangle,
        DrawMode::Mesh3D,
        DrawMode::Mesh3DTextured,
        DrawMode::Ocean,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn depth(self) -> DepthMode {
        match self {
            DrawMode::Mesh3D | DrawMode::Mesh3DTextured => DepthMode::Enabled,
            DrawMode::Ocean => DepthMode::Ocean,
            _ => DepthMode::Disabled,
        }
    }

    pub fn binding(self) -> BindingKind {
        match self {
            DrawMode::Basic
            | DrawMode::InstancedRect
            | DrawMode::InstancedTriangle
            | DrawMode::InstancedCircle => BindingKind::None,
            DrawMode::Text => BindingKind::TextureOnly,
            DrawMode::Sprite | DrawMode::Mesh3DTextured => BindingKind::Textured,
            _ => BindingKind::Uniform,
        }
    }

    fn shader(self) -> Shader {
        match self {
            DrawMode::Basic => Shader::Basic,
            DrawMode::Text => Shader::Text,
            DrawMode::Sprite => Shader::Sprite,
            DrawMode::InstancedRect | DrawMode::InstancedTriangle | DrawMode::InstancedCircle => {
                Shader::Instanced
            }
            DrawMode::AnimatedRect | DrawMode::AnimatedTriangle | DrawMode::AnimatedCircle => {
                Shader::Animated
            }
            DrawMode::Orbital => Shader::Orbital,
            DrawMode::DynamicCircle | DrawMode::DynamicRect | DrawMode::DynamicTriangle => {
                Shader::Dynamic
            }
            DrawMode::Mesh3D => Shader::Mesh3D,
            DrawMode::Mesh3DTextured => Shader::Mesh3DTextured,
            DrawMode::Ocean => Shader::Ocean,
        }
    }

    /// `(vertex, fragment)` entry points.
    fn entry_points(self) -> (&'static str, &'static str) {
        match self {
            DrawMode::InstancedRect | DrawMode::AnimatedRect | DrawMode::DynamicRect => {
                ("vs_rect", "fs_main")
            }
            DrawMode::InstancedTriangle
            | DrawMode::AnimatedTriangle
            | DrawMode::DynamicTriangle => ("vs_triangle", "fs_main"),
            DrawMode::InstancedCircle | DrawMode::AnimatedCircle | DrawMode::DynamicCircle => {
                ("vs_circle", "fs_circle")
            }
            _ => ("vs_main", "fs_main"),
        }
    }

    fn vertex_buffers(self) -> Vec<wgpu::VertexBufferLayout<'static>> {
        match self {
            DrawMode::Basic => vec![layout::Vertex::layout()],
            DrawMode::Text => vec![layout::text_vertex_layout()],
            DrawMode::Sprite => vec![layout::sprite_layout()],
            DrawMode::InstancedRect | DrawMode::InstancedTriangle | DrawMode::InstancedCircle => {
                vec![layout::instance_layout()]
            }
            DrawMode::AnimatedRect | DrawMode::AnimatedTriangle | DrawMode::AnimatedCircle => {
                vec![layout::animated_layout()]
            }
            DrawMode::Orbital => vec![layout::orbital_layout()],
            DrawMode::DynamicCircle => vec![layout::dynamic_circle_layout()],
            DrawMode::DynamicRect | DrawMode::DynamicTriangle => {
                vec![layout::dynamic_shape_layout()]
            }
            DrawMode::Mesh3D => vec![layout::MeshVertex::layout()],
            DrawMode::Mesh3DTextured => vec![layout::TexturedMeshVertex::layout()],
            // Grid positions come from the vertex index.
            DrawMode::Ocean => Vec::new(),
        }
    }
}

/// One pipeline per `(DrawMode, msaa)` pair.
pub struct PipelineTable<P> {
    single: Vec<P>,
    msaa: Vec<P>,
    msaa_samples: u32,
}

impl<P: Clone> PipelineTable<P> {
    /// Builds every pipeline through `build(mode, sample_count)`.
    ///
    /// With `msaa_samples == None` the MSAA half aliases the single-sampled
    /// pipelines.
    pub fn build<F>(msaa_samples: Option<u32>, mut build: F) -> Result<Self>
    where
        F: FnMut(DrawMode, u32) -> Result<P>,
    {
        if let Some(n) = msaa_samples
            && !matches!(n, 2 | 4 | 8)
        {
            return Err(AfferentError::Pipeline(format!(
                "unsupported MSAA sample count {n}"
            )));
        }

        let single = DrawMode::ALL
            .iter()
            .map(|&m| build(m, 1))
            .collect::<Result<Vec<_>>>()?;

        let msaa = match msaa_samples {
            Some(n) => DrawMode::ALL
                .iter()
                .map(|&m| build(m, n))
                .collect::<Result<Vec<_>>>()?,
            None => single.clone(),
        };

        Ok(Self {
            single,
            msaa,
            msaa_samples: msaa_samples.unwrap_or(1),
        })
    }
}

impl<P> PipelineTable<P> {
    #[inline]
    pub fn get(&self, mode: DrawMode, msaa: bool) -> &P {
        let half = if msaa { &self.msaa } else { &self.single };
        &half[mode.index()]
    }

    /// Sample count of the MSAA half (1 when MSAA is unavailable).
    #[inline]
    pub fn msaa_samples(&self) -> u32 {
        self.msaa_samples
    }

    /// Sample count a frame with the given toggle renders at.
    #[inline]
    pub fn sample_count(&self, msaa: bool) -> u32 {
        if msaa { self.msaa_samples } else { 1 }
    }
}

/// Bind group layouts shared by all pipelines.
pub(crate) struct BindLayouts {
    pub uniform: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
}

impl BindLayouts {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let uniform = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("afferent uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("afferent texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self { uniform, texture }
    }
}

fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState::ALPHA_BLENDING
}

/// Compiles every shader and builds the full pipeline table.
pub(crate) fn build_pipelines(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    layouts: &BindLayouts,
    msaa_samples: Option<u32>,
) -> Result<PipelineTable<wgpu::RenderPipeline>> {
    let modules: Vec<(Shader, wgpu::ShaderModule)> = Shader::ALL
        .iter()
        .map(|&s| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("afferent shader"),
                source: wgpu::ShaderSource::Wgsl(s.source().into()),
            });
            (s, module)
        })
        .collect();

    let none = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("afferent pipeline layout (none)"),
        bind_group_layouts: &[],
        immediate_size: 0,
    });
    let uniform = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("afferent pipeline layout (uniform)"),
        bind_group_layouts: &[&layouts.uniform],
        immediate_size: 0,
    });
    let textured = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("afferent pipeline layout (textured)"),
        bind_group_layouts: &[&layouts.uniform, &layouts.texture],
        immediate_size: 0,
    });
    let texture_only = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("afferent pipeline layout (texture)"),
        bind_group_layouts: &[&layouts.texture],
        immediate_size: 0,
    });

    let table = PipelineTable::build(msaa_samples, |mode, samples| {
        let module = modules
            .iter()
            .find(|(s, _)| *s == mode.shader())
            .map(|(_, m)| m)
            .ok_or_else(|| AfferentError::Pipeline(format!("no shader for {mode:?}")))?;

        let pipeline_layout = match mode.binding() {
            BindingKind::None => &none,
            BindingKind::Uniform => &uniform,
            BindingKind::Textured => &textured,
            BindingKind::TextureOnly => &texture_only,
        };

        let (vs, fs) = mode.entry_points();
        let buffers = mode.vertex_buffers();

        Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("afferent pipeline"),
            layout: Some(pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some(vs),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some(fs),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(alpha_blend()),
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
            depth_stencil: Some(mode.depth().state()),
            multisample: wgpu::MultisampleState {
                count: samples,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        }))
    })?;

    log::debug!(
        "built {} pipelines for {format:?} (msaa x{})",
        DrawMode::COUNT * if msaa_samples.is_some() { 2 } else { 1 },
        table.msaa_samples()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_table(msaa: Option<u32>) -> Result<PipelineTable<(DrawMode, u32)>> {
        PipelineTable::build(msaa, |mode, samples| Ok((mode, samples)))
    }

    #[test]
    fn draw_mode_indices_are_dense() {
        for (i, m) in DrawMode::ALL.iter().enumerate() {
            assert_eq!(m.index(), i);
        }
    }

    #[test]
    fn msaa_toggle_selects_matching_half() {
        let table = fake_table(Some(4)).unwrap();
        for mode in DrawMode::ALL {
            assert_eq!(table.get(mode, false), &(mode, 1));
            assert_eq!(table.get(mode, true), &(mode, 4));
        }
        assert_eq!(table.sample_count(true), 4);
        assert_eq!(table.sample_count(false), 1);
    }

    #[test]
    fn missing_msaa_aliases_single_sampled_pipelines() {
        let table = fake_table(None).unwrap();
        assert_eq!(table.get(DrawMode::Text, true), &(DrawMode::Text, 1));
        assert_eq!(table.sample_count(true), 1);
    }

    #[test]
    fn invalid_sample_count_is_a_pipeline_error() {
        let err = fake_table(Some(3)).err().unwrap();
        assert!(matches!(err, AfferentError::Pipeline(_)));
    }

    #[test]
    fn build_failure_propagates() {
        let res: Result<PipelineTable<()>> = PipelineTable::build(Some(4), |mode, _| {
            if mode == DrawMode::Ocean {
                Err(AfferentError::Pipeline("ocean".into()))
            } else {
                Ok(())
            }
        });
        assert!(res.is_err());
    }

    // ── mode properties ───────────────────────────────────────────────────

    #[test]
    fn only_3d_modes_touch_depth() {
        assert_eq!(DrawMode::Mesh3D.depth(), DepthMode::Enabled);
        assert_eq!(DrawMode::Mesh3DTextured.depth(), DepthMode::Enabled);
        assert_eq!(DrawMode::Ocean.depth(), DepthMode::Ocean);
        for mode in DrawMode::ALL {
            if !matches!(mode, DrawMode::Mesh3D | DrawMode::Mesh3DTextured | DrawMode::Ocean) {
                assert_eq!(mode.depth(), DepthMode::Disabled, "{mode:?}");
            }
        }
    }

    #[test]
    fn ocean_tests_depth_without_writing() {
        let s = DepthMode::Ocean.state();
        assert!(!s.depth_write_enabled);
        assert_eq!(s.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(DepthMode::Enabled.state().depth_write_enabled);
    }

    #[test]
    fn textured_modes_bind_textures() {
        assert_eq!(DrawMode::Text.binding(), BindingKind::TextureOnly);
        assert_eq!(DrawMode::Sprite.binding(), BindingKind::Textured);
        assert_eq!(DrawMode::Orbital.binding(), BindingKind::Uniform);
        assert_eq!(DrawMode::Basic.binding(), BindingKind::None);
    }

    #[test]
    fn textured_mesh_samples_a_texture_with_depth() {
        let mode = DrawMode::Mesh3DTextured;
        assert_eq!(mode.binding(), BindingKind::Textured);
        assert_eq!(mode.depth(), DepthMode::Enabled);
        assert_eq!(mode.shader(), Shader::Mesh3DTextured);

        let buffers = mode.vertex_buffers();
        assert_eq!(buffers.len(), 1);
        assert_eq!(
            buffers[0].array_stride,
            (layout::TEXTURED_MESH_VERTEX_FLOATS * 4) as u64
        );
        assert_eq!(buffers[0].attributes.len(), 4);
        assert_eq!(buffers[0].attributes[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn only_ocean_has_no_vertex_buffer() {
        for mode in DrawMode::ALL {
            assert_eq!(mode.vertex_buffers().is_empty(), mode == DrawMode::Ocean);
        }
    }
}
