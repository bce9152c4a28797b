//! Immediate, instanced, dynamic and sprite draws.

use wgpu::util::DeviceExt;

use crate::error::{AfferentError, Result};
use crate::float_buffer::FloatBuffer;
use crate::texture::Texture;

use super::layout::{
    self, DynamicUniforms, SpriteUniforms, Vertex, DYNAMIC_CIRCLE_FLOATS, DYNAMIC_SHAPE_FLOATS,
    INSTANCE_FLOATS, SPRITE_FLOATS,
};
use super::pipeline::DrawMode;
use super::pool::BufferKind;
use super::renderer::{GpuBuffer, GpuTexture, Renderer};

/// Vertices emitted per instance for quads and triangles.
const QUAD_VERTS: u32 = 6;
const TRIANGLE_VERTS: u32 = 3;

fn verts_per_instance(mode: DrawMode) -> u32 {
    match mode {
        DrawMode::InstancedTriangle | DrawMode::AnimatedTriangle | DrawMode::DynamicTriangle => {
            TRIANGLE_VERTS
        }
        _ => QUAD_VERTS,
    }
}

impl Renderer {
    // ── caller-owned buffers ──────────────────────────────────────────────

    /// Uploads vertices into a buffer the caller keeps across frames.
    pub fn create_vertex_buffer(&self, vertices: &[Vertex]) -> Result<GpuBuffer> {
        if vertices.is_empty() {
            return Err(AfferentError::Buffer("vertex buffer needs at least one vertex".into()));
        }
        if !self.buffer_fits(std::mem::size_of_val(vertices) as u64, "create_vertex_buffer") {
            return Err(AfferentError::Buffer("vertex buffer exceeds the device limit".into()));
        }
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("afferent vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(GpuBuffer {
            buffer,
            count: vertices.len() as u32,
        })
    }

    pub fn create_index_buffer(&self, indices: &[u32]) -> Result<GpuBuffer> {
        if indices.is_empty() {
            return Err(AfferentError::Buffer("index buffer needs at least one index".into()));
        }
        if !self.buffer_fits(std::mem::size_of_val(indices) as u64, "create_index_buffer") {
            return Err(AfferentError::Buffer("index buffer exceeds the device limit".into()));
        }
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("afferent index buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(GpuBuffer {
            buffer,
            count: indices.len() as u32,
        })
    }

    /// Draws `index_count` indices of caller-owned buffers.
    pub fn draw_triangles(&mut self, vertices: &GpuBuffer, indices: &GpuBuffer, index_count: u32) {
        if !self.accepts_draw("draw_triangles") {
            return;
        }
        if index_count == 0 || index_count > indices.count {
            return;
        }
        self.record(DrawMode::Basic, |pass| {
            pass.set_vertex_buffer(0, vertices.buffer.slice(..));
            pass.set_index_buffer(indices.buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        });
    }

    /// Copies vertices and indices into pooled buffers and draws them.
    ///
    /// Empty input is an error, like creating an empty buffer.
    pub fn draw_triangles_immediate(&mut self, vertices: &[Vertex], indices: &[u32]) -> Result<()> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(AfferentError::Buffer("immediate draw needs vertices and indices".into()));
        }
        if !self.accepts_draw("draw_triangles_immediate") {
            return Ok(());
        }

        let (Some(vertex_buffer), Some(index_buffer)) = (
            self.upload(BufferKind::Vertex, bytemuck::cast_slice(vertices)),
            self.upload(BufferKind::Index, bytemuck::cast_slice(indices)),
        ) else {
            return Err(AfferentError::Buffer("immediate draw exceeds the device limit".into()));
        };
        let record = (
            GpuBuffer {
                buffer: vertex_buffer,
                count: vertices.len() as u32,
            },
            GpuBuffer {
                buffer: index_buffer,
                count: indices.len() as u32,
            },
        );

        let unpooled;
        let (vb, ib) = match self.wrappers.acquire(record) {
            Ok(slot) => &*slot,
            Err(record) => {
                log::trace!("wrapper ring exhausted; using an unpooled record");
                unpooled = record;
                &unpooled
            }
        };
        let Some(frame) = self.frame.as_mut() else { return Ok(()) };
        frame
            .pass
            .set_pipeline(self.pipelines.get(DrawMode::Basic, frame.msaa));
        frame.pass.set_vertex_buffer(0, vb.buffer.slice(..));
        frame
            .pass
            .set_index_buffer(ib.buffer.slice(..), wgpu::IndexFormat::Uint32);
        frame.pass.draw_indexed(0..ib.count, 0, 0..1);
        Ok(())
    }

    // ── instanced ─────────────────────────────────────────────────────────

    /// Draws `count` rects from 8-float records in NDC.
    pub fn draw_instanced_rects(&mut self, data: &[f32], count: u32) {
        self.draw_instanced(DrawMode::InstancedRect, data, count);
    }

    pub fn draw_instanced_triangles(&mut self, data: &[f32], count: u32) {
        self.draw_instanced(DrawMode::InstancedTriangle, data, count);
    }

    pub fn draw_instanced_circles(&mut self, data: &[f32], count: u32) {
        self.draw_instanced(DrawMode::InstancedCircle, data, count);
    }

    pub fn draw_instanced_rects_buffer(&mut self, data: &FloatBuffer, count: u32) {
        self.draw_instanced(DrawMode::InstancedRect, data.as_slice(), count);
    }

    pub fn draw_instanced_triangles_buffer(&mut self, data: &FloatBuffer, count: u32) {
        self.draw_instanced(DrawMode::InstancedTriangle, data.as_slice(), count);
    }

    pub fn draw_instanced_circles_buffer(&mut self, data: &FloatBuffer, count: u32) {
        self.draw_instanced(DrawMode::InstancedCircle, data.as_slice(), count);
    }

    fn draw_instanced(&mut self, mode: DrawMode, data: &[f32], count: u32) {
        if !self.accepts_draw("instanced draw") {
            return;
        }
        let Some(bytes) = layout::instance_bytes(data, count, INSTANCE_FLOATS) else { return };
        let Some(instances) = self.upload(BufferKind::Vertex, bytes) else { return };
        let len = bytes.len() as u64;
        self.record(mode, |pass| {
            pass.set_vertex_buffer(0, instances.slice(..len));
            pass.draw(0..verts_per_instance(mode), 0..count);
        });
    }

    // ── dynamic ───────────────────────────────────────────────────────────

    /// Draws circles from 4-float pixel-space records; hue cycles with `time`.
    pub fn draw_dynamic_circles(&mut self, data: &[f32], count: u32, time: f32, hue_speed: f32) {
        self.draw_dynamic(DrawMode::DynamicCircle, data, count, time, hue_speed);
    }

    pub fn draw_dynamic_rects(&mut self, data: &[f32], count: u32, time: f32, hue_speed: f32) {
        self.draw_dynamic(DrawMode::DynamicRect, data, count, time, hue_speed);
    }

    pub fn draw_dynamic_triangles(&mut self, data: &[f32], count: u32, time: f32, hue_speed: f32) {
        self.draw_dynamic(DrawMode::DynamicTriangle, data, count, time, hue_speed);
    }

    /// Zero-copy form of [`draw_dynamic_circles`](Self::draw_dynamic_circles).
    pub fn draw_dynamic_circles_buffer(
        &mut self,
        data: &FloatBuffer,
        count: u32,
        time: f32,
        hue_speed: f32,
    ) {
        self.draw_dynamic(DrawMode::DynamicCircle, data.as_slice(), count, time, hue_speed);
    }

    pub fn draw_dynamic_rects_buffer(
        &mut self,
        data: &FloatBuffer,
        count: u32,
        time: f32,
        hue_speed: f32,
    ) {
        self.draw_dynamic(DrawMode::DynamicRect, data.as_slice(), count, time, hue_speed);
    }

    pub fn draw_dynamic_triangles_buffer(
        &mut self,
        data: &FloatBuffer,
        count: u32,
        time: f32,
        hue_speed: f32,
    ) {
        self.draw_dynamic(DrawMode::DynamicTriangle, data.as_slice(), count, time, hue_speed);
    }

    fn draw_dynamic(&mut self, mode: DrawMode, data: &[f32], count: u32, time: f32, hue_speed: f32) {
        if !self.accepts_draw("dynamic draw") {
            return;
        }
        let stride = match mode {
            DrawMode::DynamicCircle => DYNAMIC_CIRCLE_FLOATS,
            _ => DYNAMIC_SHAPE_FLOATS,
        };
        let Some(bytes) = layout::instance_bytes(data, count, stride) else { return };

        let (canvas_width, canvas_height) = self.screen;
        let Some(uniforms) = self.uniform_bind_group(&DynamicUniforms {
            time,
            canvas_width,
            canvas_height,
            hue_speed,
        }) else {
            return;
        };
        let Some(instances) = self.upload(BufferKind::Vertex, bytes) else { return };
        let len = bytes.len() as u64;
        self.record(mode, |pass| {
            pass.set_bind_group(0, &uniforms, &[]);
            pass.set_vertex_buffer(0, instances.slice(..len));
            pass.draw(0..verts_per_instance(mode), 0..count);
        });
    }

    // ── sprites ───────────────────────────────────────────────────────────

    /// Draws `count` textured quads from 5-float pixel-space records.
    ///
    /// The texture is uploaded on first use.
    pub fn draw_sprites(&mut self, texture: &Texture, data: &[f32], count: u32) {
        if !self.accepts_draw("draw_sprites") {
            return;
        }
        let Some(bytes) = layout::instance_bytes(data, count, SPRITE_FLOATS) else { return };

        let Some(gpu) = self.texture_gpu(texture) else { return };
        let (canvas_width, canvas_height) = self.screen;
        let Some(uniforms) = self.uniform_bind_group(&SpriteUniforms {
            canvas_width,
            canvas_height,
            _pad: [0.0; 2],
        }) else {
            return;
        };
        let Some(instances) = self.upload(BufferKind::Vertex, bytes) else { return };
        let len = bytes.len() as u64;
        self.record(DrawMode::Sprite, |pass| {
            pass.set_bind_group(0, &uniforms, &[]);
            pass.set_bind_group(1, &gpu.bind_group, &[]);
            pass.set_vertex_buffer(0, instances.slice(..len));
            pass.draw(0..QUAD_VERTS, 0..count);
        });
    }

    /// Zero-copy form of [`draw_sprites`](Self::draw_sprites).
    pub fn draw_sprites_buffer(&mut self, texture: &Texture, data: &FloatBuffer, count: u32) {
        self.draw_sprites(texture, data.as_slice(), count);
    }

    /// GPU copy of `texture`, uploaded on first use.
    ///
    /// `None` when the image is larger than the device allows.
    pub(super) fn texture_gpu<'t>(&self, texture: &'t Texture) -> Option<&'t GpuTexture> {
        if let Some(gpu) = texture.gpu.get() {
            return Some(gpu);
        }
        let (width, height) = texture.size();
        if !self.texture_fits(width, height, "texture upload") {
            return None;
        }
        Some(texture.gpu.get_or_init(|| self.upload_texture(texture)))
    }

    fn upload_texture(&self, texture: &Texture) -> GpuTexture {
        let (width, height) = texture.size();
        let gpu = self.create_texture(
            "afferent sprite texture",
            width,
            height,
            wgpu::TextureFormat::Rgba8Unorm,
        );
        self.write_rows(&gpu.texture, texture.rgba(), 4, 0..height);
        log::debug!("uploaded {width}x{height} sprite texture");
        gpu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangles_emit_three_vertices_per_instance() {
        assert_eq!(verts_per_instance(DrawMode::InstancedTriangle), 3);
        assert_eq!(verts_per_instance(DrawMode::DynamicTriangle), 3);
        assert_eq!(verts_per_instance(DrawMode::InstancedRect), 6);
        assert_eq!(verts_per_instance(DrawMode::DynamicCircle), 6);
    }
}
