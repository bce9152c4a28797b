//! GPU-visible data layouts shared by the host, the draw calls and WGSL.
//!
//! Instance records are documented in floats because hosts fill them through
//! flat `f32` arrays or a [`crate::FloatBuffer`].

use bytemuck::{Pod, Zeroable};

/// Floats per generic instance: NDC position (2), angle, half size, RGBA.
pub const INSTANCE_FLOATS: usize = 8;
/// Floats per sprite: pixel position (2), rotation, half size, alpha.
pub const SPRITE_FLOATS: usize = 5;
/// Floats per dynamic circle: pixel position (2), hue, radius.
pub const DYNAMIC_CIRCLE_FLOATS: usize = 4;
/// Floats per dynamic rect or triangle: pixel position (2), hue, half size, rotation.
pub const DYNAMIC_SHAPE_FLOATS: usize = 5;
/// Floats per animated instance: pixel position (2), hue, half size, phase, spin.
pub const ANIMATED_FLOATS: usize = 6;
/// Floats per orbital particle.
pub const ORBITAL_FLOATS: usize = 8;
/// Floats per 3D mesh vertex: position (3), normal (3), RGBA.
pub const MESH_VERTEX_FLOATS: usize = 10;
/// Floats per textured 3D mesh vertex: position (3), normal (3), uv (2), RGBA.
pub const TEXTURED_MESH_VERTEX_FLOATS: usize = 12;

/// Returns the first `count` records of `data` as bytes.
///
/// `None` when `count` is zero or `data` holds fewer than `count` records;
/// draw calls treat that as a silent no-op.
pub fn instance_bytes(data: &[f32], count: u32, floats_per_instance: usize) -> Option<&[u8]> {
    if count == 0 || floats_per_instance == 0 {
        return None;
    }
    let needed = (count as usize).checked_mul(floats_per_instance)?;
    let records = data.get(..needed)?;
    Some(bytemuck::cast_slice(records))
}

/// Number of whole vertices in `data`.
///
/// `None` when `data` is empty or not a whole number of vertices.
pub fn vertex_count(data: &[f32], floats_per_vertex: usize) -> Option<u32> {
    if data.is_empty() || floats_per_vertex == 0 || data.len() % floats_per_vertex != 0 {
        return None;
    }
    u32::try_from(data.len() / floats_per_vertex).ok()
}

// ── vertices ──────────────────────────────────────────────────────────────

/// Colored 2D vertex used by the triangle paths.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in NDC.
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Lit 3D mesh vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Lit 3D mesh vertex with texture coordinates.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TexturedMeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl TexturedMeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexturedMeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(crate) fn text_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<crate::text::TextVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRS,
    }
}

// ── instances ─────────────────────────────────────────────────────────────

/// Generic instanced shape.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Center in NDC.
    pub position: [f32; 2],
    /// Rotation in radians.
    pub angle: f32,
    /// Half side length in NDC.
    pub half_size: f32,
    pub color: [f32; 4],
}

/// Sprite placed in pixels.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    pub position: [f32; 2],
    pub rotation: f32,
    pub half_size: f32,
    pub alpha: f32,
}

/// Circle whose position is updated by the host every frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DynamicCircle {
    pub position: [f32; 2],
    /// Base hue in `0..1`.
    pub hue: f32,
    pub radius: f32,
}

/// Rect or triangle whose position is updated by the host every frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DynamicShape {
    pub position: [f32; 2],
    pub hue: f32,
    pub half_size: f32,
    pub rotation: f32,
}

/// Instance uploaded once and animated entirely on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AnimatedInstance {
    pub position: [f32; 2],
    pub hue: f32,
    pub half_size: f32,
    pub phase: f32,
    pub spin: f32,
}

/// Particle orbiting the center stored at upload time.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OrbitalInstance {
    /// Initial angle.
    pub phase: f32,
    /// Orbit radius in pixels.
    pub radius: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
    /// Phase of the radius wobble.
    pub phase_x3: f32,
    /// Phase of the spin.
    pub phase2: f32,
    pub hue: f32,
    pub half_size: f32,
    pub _pad: f32,
}

macro_rules! instance_layout {
    ($ty:ty, $($loc:expr => $fmt:ident),+ $(,)?) => {{
        const ATTRS: &[wgpu::VertexAttribute] = &wgpu::vertex_attr_array![$($loc => $fmt),+];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<$ty>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: ATTRS,
        }
    }};
}

pub(crate) fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    instance_layout!(InstanceData, 0 => Float32x2, 1 => Float32, 2 => Float32, 3 => Float32x4)
}

pub(crate) fn sprite_layout() -> wgpu::VertexBufferLayout<'static> {
    instance_layout!(SpriteInstance, 0 => Float32x2, 1 => Float32, 2 => Float32, 3 => Float32)
}

pub(crate) fn dynamic_circle_layout() -> wgpu::VertexBufferLayout<'static> {
    instance_layout!(DynamicCircle, 0 => Float32x2, 1 => Float32, 2 => Float32)
}

pub(crate) fn dynamic_shape_layout() -> wgpu::VertexBufferLayout<'static> {
    instance_layout!(DynamicShape, 0 => Float32x2, 1 => Float32, 2 => Float32, 3 => Float32)
}

pub(crate) fn animated_layout() -> wgpu::VertexBufferLayout<'static> {
    instance_layout!(
        AnimatedInstance,
        0 => Float32x2, 1 => Float32, 2 => Float32, 3 => Float32, 4 => Float32,
    )
}

pub(crate) fn orbital_layout() -> wgpu::VertexBufferLayout<'static> {
    instance_layout!(OrbitalInstance, 0 => Float32x4, 1 => Float32x4)
}

// ── uniforms ──────────────────────────────────────────────────────────────

/// Uniforms of the animated shape shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AnimationUniforms {
    pub time: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub _pad: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OrbitalUniforms {
    pub time: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Relative radius wobble amplitude.
    pub radius_wobble: f32,
    pub _pad: [f32; 2],
}

/// Uniforms of the dynamic circle/rect/triangle shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct DynamicUniforms {
    pub time: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Hue cycles per second.
    pub hue_speed: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SpriteUniforms {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub _pad: [f32; 2],
}

/// Camera, lighting and fog for the 3D paths. Matrices are column-major.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Scene3DUniforms {
    pub model_view_proj: [f32; 16],
    pub model: [f32; 16],
    /// Direction towards the light, world space.
    pub light_dir: [f32; 3],
    /// Light reaching surfaces facing away from the light, `0..1`.
    pub ambient: f32,
    pub camera_pos: [f32; 3],
    pub fog_start: f32,
    pub fog_color: [f32; 3],
    pub fog_end: f32,
}

/// Projected-grid ocean parameters.
///
/// - `params0`: time, vertical fov, aspect, max distance
/// - `params1`: snap size, NDC overscan, horizon margin, yaw
/// - `params2`: pitch, grid size, near extent, mode
/// - `wave_a[i]`: direction x, direction z, wavenumber, angular speed
/// - `wave_b[i]`: amplitude, steepness, unused, unused
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct OceanUniforms {
    pub scene: Scene3DUniforms,
    pub params0: [f32; 4],
    pub params1: [f32; 4],
    pub params2: [f32; 4],
    pub wave_a: [[f32; 4]; 4],
    pub wave_b: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn record_sizes_match_float_counts() {
        assert_eq!(size_of::<InstanceData>(), INSTANCE_FLOATS * 4);
        assert_eq!(size_of::<SpriteInstance>(), SPRITE_FLOATS * 4);
        assert_eq!(size_of::<DynamicCircle>(), DYNAMIC_CIRCLE_FLOATS * 4);
        assert_eq!(size_of::<DynamicShape>(), DYNAMIC_SHAPE_FLOATS * 4);
        assert_eq!(size_of::<AnimatedInstance>(), ANIMATED_FLOATS * 4);
        assert_eq!(size_of::<OrbitalInstance>(), ORBITAL_FLOATS * 4);
        assert_eq!(size_of::<MeshVertex>(), MESH_VERTEX_FLOATS * 4);
        assert_eq!(size_of::<TexturedMeshVertex>(), TEXTURED_MESH_VERTEX_FLOATS * 4);
    }

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(size_of::<Scene3DUniforms>(), 176);
        assert_eq!(size_of::<OceanUniforms>(), 176 + 3 * 16 + 2 * 64);
        for size in [
            size_of::<AnimationUniforms>(),
            size_of::<OrbitalUniforms>(),
            size_of::<DynamicUniforms>(),
            size_of::<SpriteUniforms>(),
        ] {
            assert_eq!(size % 16, 0);
        }
    }

    // ── input validation ──────────────────────────────────────────────────

    #[test]
    fn instance_bytes_takes_exactly_count_records() {
        let data = [1.0f32; 12];
        let bytes = instance_bytes(&data, 2, DYNAMIC_CIRCLE_FLOATS).unwrap();
        assert_eq!(bytes.len(), 2 * DYNAMIC_CIRCLE_FLOATS * 4);
    }

    #[test]
    fn short_or_empty_input_is_rejected() {
        let data = [0.0f32; 39];
        assert!(instance_bytes(&data, 8, SPRITE_FLOATS).is_none());
        assert!(instance_bytes(&data, 0, SPRITE_FLOATS).is_none());
        assert!(instance_bytes(&[], 1, SPRITE_FLOATS).is_none());
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        assert!(instance_bytes(&[0.0; 8], u32::MAX, usize::MAX / 2).is_none());
    }

    #[test]
    fn vertex_count_requires_whole_vertices() {
        assert_eq!(vertex_count(&[0.0; 30], MESH_VERTEX_FLOATS), Some(3));
        assert_eq!(vertex_count(&[0.0; 31], MESH_VERTEX_FLOATS), None);
        assert_eq!(vertex_count(&[], MESH_VERTEX_FLOATS), None);
    }

    #[test]
    fn instance_bytes_preserve_record_order() {
        let data: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let bytes = instance_bytes(&data, 2, SPRITE_FLOATS).unwrap();
        let back: &[f32] = bytemuck::cast_slice(bytes);
        assert_eq!(back, &data[..]);
    }
}
