//! Upload-once draws animated entirely on the GPU.
//!
//! Instance parameters are uploaded into persistent buffers; each frame only
//! a time value (plus canvas size) crosses to the GPU.

use wgpu::util::DeviceExt;

use crate::float_buffer::FloatBuffer;

use super::layout::{self, AnimationUniforms, OrbitalUniforms, ANIMATED_FLOATS, ORBITAL_FLOATS};
use super::pipeline::DrawMode;
use super::renderer::Renderer;

/// Instances living on the GPU until replaced.
pub(crate) struct PersistentInstances {
    buffer: wgpu::Buffer,
    count: u32,
}

/// Persistent buffers of the animated and orbital paths.
#[derive(Default)]
pub(crate) struct AnimatedBuffers {
    rects: Option<PersistentInstances>,
    triangles: Option<PersistentInstances>,
    circles: Option<PersistentInstances>,
    orbital: Option<PersistentInstances>,
    orbital_center: [f32; 2],
}

impl AnimatedBuffers {
    fn slot(&mut self, mode: DrawMode) -> Option<&mut Option<PersistentInstances>> {
        match mode {
            DrawMode::AnimatedRect => Some(&mut self.rects),
            DrawMode::AnimatedTriangle => Some(&mut self.triangles),
            DrawMode::AnimatedCircle => Some(&mut self.circles),
            DrawMode::Orbital => Some(&mut self.orbital),
            _ => None,
        }
    }

    fn get(&self, mode: DrawMode) -> Option<&PersistentInstances> {
        match mode {
            DrawMode::AnimatedRect => self.rects.as_ref(),
            DrawMode::AnimatedTriangle => self.triangles.as_ref(),
            DrawMode::AnimatedCircle => self.circles.as_ref(),
            DrawMode::Orbital => self.orbital.as_ref(),
            _ => None,
        }
    }
}

impl Renderer {
    /// Stores `count` 6-float rect records for [`draw_animated_rects`](Self::draw_animated_rects).
    ///
    /// Replaces anything uploaded before. Malformed input leaves the
    /// previous upload untouched.
    pub fn upload_animated_rects(&mut self, data: &[f32], count: u32) {
        self.upload_persistent(DrawMode::AnimatedRect, data, count, ANIMATED_FLOATS);
    }

    pub fn upload_animated_triangles(&mut self, data: &[f32], count: u32) {
        self.upload_persistent(DrawMode::AnimatedTriangle, data, count, ANIMATED_FLOATS);
    }

    pub fn upload_animated_circles(&mut self, data: &[f32], count: u32) {
        self.upload_persistent(DrawMode::AnimatedCircle, data, count, ANIMATED_FLOATS);
    }

    pub fn upload_animated_rects_buffer(&mut self, data: &FloatBuffer, count: u32) {
        self.upload_animated_rects(data.as_slice(), count);
    }

    pub fn upload_animated_triangles_buffer(&mut self, data: &FloatBuffer, count: u32) {
        self.upload_animated_triangles(data.as_slice(), count);
    }

    pub fn upload_animated_circles_buffer(&mut self, data: &FloatBuffer, count: u32) {
        self.upload_animated_circles(data.as_slice(), count);
    }

    /// Stores orbital particles circling `(center_x, center_y)` in pixels.
    pub fn upload_orbital(&mut self, data: &[f32], count: u32, center_x: f32, center_y: f32) {
        if self.upload_persistent(DrawMode::Orbital, data, count, ORBITAL_FLOATS) {
            self.animated.orbital_center = [center_x, center_y];
        }
    }

    pub fn upload_orbital_buffer(
        &mut self,
        data: &FloatBuffer,
        count: u32,
        center_x: f32,
        center_y: f32,
    ) {
        self.upload_orbital(data.as_slice(), count, center_x, center_y);
    }

    pub fn draw_animated_rects(&mut self, time: f32) {
        self.draw_animated(DrawMode::AnimatedRect, time);
    }

    pub fn draw_animated_triangles(&mut self, time: f32) {
        self.draw_animated(DrawMode::AnimatedTriangle, time);
    }

    pub fn draw_animated_circles(&mut self, time: f32) {
        self.draw_animated(DrawMode::AnimatedCircle, time);
    }

    /// Draws the uploaded orbital particles; `radius_wobble` scales the
    /// per-particle radius oscillation.
    pub fn draw_orbital(&mut self, time: f32, radius_wobble: f32) {
        if !self.accepts_draw("draw_orbital") {
            return;
        }
        let Some(count) = self.animated.get(DrawMode::Orbital).map(|p| p.count) else { return };

        let (canvas_width, canvas_height) = self.screen;
        let [center_x, center_y] = self.animated.orbital_center;
        let Some(uniforms) = self.uniform_bind_group(&OrbitalUniforms {
            time,
            center_x,
            center_y,
            canvas_width,
            canvas_height,
            radius_wobble,
            _pad: [0.0; 2],
        }) else {
            return;
        };
        self.draw_persistent(DrawMode::Orbital, &uniforms, count);
    }

    fn draw_animated(&mut self, mode: DrawMode, time: f32) {
        if !self.accepts_draw("animated draw") {
            return;
        }
        let Some(count) = self.animated.get(mode).map(|p| p.count) else { return };

        let (canvas_width, canvas_height) = self.screen;
        let Some(uniforms) = self.uniform_bind_group(&AnimationUniforms {
            time,
            canvas_width,
            canvas_height,
            _pad: 0.0,
        }) else {
            return;
        };
        self.draw_persistent(mode, &uniforms, count);
    }

    fn draw_persistent(&mut self, mode: DrawMode, uniforms: &wgpu::BindGroup, count: u32) {
        let verts = if mode == DrawMode::AnimatedTriangle { 3 } else { 6 };
        let Some(instances) = self.animated.get(mode) else { return };
        let Some(frame) = self.frame.as_mut() else { return };
        frame.pass.set_pipeline(self.pipelines.get(mode, frame.msaa));
        frame.pass.set_bind_group(0, uniforms, &[]);
        frame.pass.set_vertex_buffer(0, instances.buffer.slice(..));
        frame.pass.draw(0..verts, 0..count);
    }

    /// Returns whether the upload was accepted.
    fn upload_persistent(
        &mut self,
        mode: DrawMode,
        data: &[f32],
        count: u32,
        stride: usize,
    ) -> bool {
        let Some(bytes) = layout::instance_bytes(data, count, stride) else { return false };
        if !self.buffer_fits(bytes.len() as u64, "persistent instance upload") {
            return false;
        }
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("afferent persistent instances"),
                contents: bytes,
                usage: wgpu::BufferUsages::VERTEX,
            });
        let Some(slot) = self.animated.slot(mode) else { return false };
        *slot = Some(PersistentInstances { buffer, count });
        log::debug!("uploaded {count} persistent {mode:?} instances");
        true
    }
}
