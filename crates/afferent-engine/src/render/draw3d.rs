//! Lit 3D meshes and the projected-grid ocean.

use wgpu::util::DeviceExt;

use crate::texture::Texture;

use super::layout::{
    self, OceanUniforms, Scene3DUniforms, MESH_VERTEX_FLOATS, TEXTURED_MESH_VERTEX_FLOATS,
};
use super::pipeline::DrawMode;
use super::pool::BufferKind;
use super::renderer::Renderer;

/// Index buffer of the ocean grid, rebuilt when the grid size changes.
pub(crate) struct OceanGrid {
    buffer: wgpu::Buffer,
    index_count: u32,
    grid_size: u32,
}

/// Index count of a `grid_size x grid_size` grid, or `None` when the grid is
/// degenerate or its indices cannot be addressed with `u32`.
pub(crate) fn ocean_index_count(grid_size: u32) -> Option<u32> {
    if grid_size < 2 {
        return None;
    }
    let cells = u64::from(grid_size - 1);
    let count = cells.checked_mul(cells)?.checked_mul(6)?;
    u32::try_from(count).ok()
}

/// Two triangles per cell of a `grid_size x grid_size` vertex grid,
/// vertices numbered row by row. Empty when [`ocean_index_count`] is `None`.
pub(crate) fn ocean_grid_indices(grid_size: u32) -> Vec<u32> {
    let Some(count) = ocean_index_count(grid_size) else { return Vec::new() };
    let cells = grid_size - 1;
    let mut indices = Vec::with_capacity(count as usize);
    for z in 0..cells {
        for x in 0..cells {
            let i0 = z * grid_size + x;
            let i1 = i0 + 1;
            let i2 = i0 + grid_size;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }
    indices
}

impl Renderer {
    /// Draws an indexed mesh of 10-float vertices (position, normal, RGBA)
    /// with depth testing, directional light and distance fog.
    pub fn draw_mesh_3d(&mut self, vertices: &[f32], indices: &[u32], uniforms: &Scene3DUniforms) {
        if !self.accepts_draw("draw_mesh_3d") {
            return;
        }
        self.draw_mesh(DrawMode::Mesh3D, vertices, MESH_VERTEX_FLOATS, indices, uniforms, None);
    }

    /// Draws an indexed mesh of 12-float vertices (position, normal, uv,
    /// RGBA). The texel is multiplied by the vertex color before lighting.
    ///
    /// The texture is uploaded on first use.
    pub fn draw_mesh_3d_textured(
        &mut self,
        vertices: &[f32],
        indices: &[u32],
        texture: &Texture,
        uniforms: &Scene3DUniforms,
    ) {
        if !self.accepts_draw("draw_mesh_3d_textured") {
            return;
        }
        let Some(gpu) = self.texture_gpu(texture) else { return };
        self.draw_mesh(
            DrawMode::Mesh3DTextured,
            vertices,
            TEXTURED_MESH_VERTEX_FLOATS,
            indices,
            uniforms,
            Some(&gpu.bind_group),
        );
    }

    fn draw_mesh(
        &mut self,
        mode: DrawMode,
        vertices: &[f32],
        stride: usize,
        indices: &[u32],
        uniforms: &Scene3DUniforms,
        texture: Option<&wgpu::BindGroup>,
    ) {
        let Some(vertex_count) = layout::vertex_count(vertices, stride) else { return };
        if indices.is_empty() || indices.iter().any(|&i| i >= vertex_count) {
            return;
        }

        let Some(uniforms) = self.uniform_bind_group(uniforms) else { return };
        let (Some(vertex_buffer), Some(index_buffer)) = (
            self.upload(BufferKind::Vertex, bytemuck::cast_slice(vertices)),
            self.upload(BufferKind::Index, bytemuck::cast_slice(indices)),
        ) else {
            return;
        };
        let vertex_len = std::mem::size_of_val(vertices) as u64;
        let index_len = std::mem::size_of_val(indices) as u64;
        let index_count = indices.len() as u32;

        self.record(mode, |pass| {
            pass.set_bind_group(0, &uniforms, &[]);
            if let Some(texture) = texture {
                pass.set_bind_group(1, texture, &[]);
            }
            pass.set_vertex_buffer(0, vertex_buffer.slice(..vertex_len));
            pass.set_index_buffer(index_buffer.slice(..index_len), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        });
    }

    /// Draws a `grid_size²` ocean surface displaced by Gerstner waves.
    ///
    /// The grid size in `uniforms.params2[1]` is overwritten with `grid_size`.
    /// Grids whose index buffer would not fit the device are skipped.
    pub fn draw_ocean(&mut self, grid_size: u32, uniforms: &OceanUniforms) {
        if !self.accepts_draw("draw_ocean") {
            return;
        }
        if !self.ensure_ocean_index_buffer(grid_size) {
            return;
        }

        let mut uniforms = *uniforms;
        uniforms.params2[1] = grid_size as f32;
        let Some(uniforms) = self.uniform_bind_group(&uniforms) else { return };

        let Some(grid) = self.ocean.as_ref() else { return };
        let Some(frame) = self.frame.as_mut() else { return };
        frame
            .pass
            .set_pipeline(self.pipelines.get(DrawMode::Ocean, frame.msaa));
        frame.pass.set_bind_group(0, &uniforms, &[]);
        frame
            .pass
            .set_index_buffer(grid.buffer.slice(..), wgpu::IndexFormat::Uint32);
        frame.pass.draw_indexed(0..grid.index_count, 0, 0..1);
    }

    /// Returns whether an index buffer for `grid_size` is ready.
    fn ensure_ocean_index_buffer(&mut self, grid_size: u32) -> bool {
        if self.ocean.as_ref().is_some_and(|g| g.grid_size == grid_size) {
            return true;
        }
        let Some(count) = ocean_index_count(grid_size) else {
            if grid_size >= 2 {
                log::warn!("ocean grid {grid_size}x{grid_size} has too many indices; skipped");
            }
            return false;
        };
        let bytes = u64::from(count) * std::mem::size_of::<u32>() as u64;
        if !self.buffer_fits(bytes, "ocean grid") {
            return false;
        }

        let indices = ocean_grid_indices(grid_size);
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("afferent ocean indices"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        log::debug!("built ocean grid {grid_size}x{grid_size} ({count} indices)");
        self.ocean = Some(OceanGrid {
            buffer,
            index_count: count,
            grid_size,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_two_triangles_per_cell() {
        assert_eq!(ocean_grid_indices(2), vec![0, 2, 1, 1, 2, 3]);
        assert_eq!(ocean_grid_indices(4).len(), 3 * 3 * 6);
    }

    #[test]
    fn degenerate_grids_are_empty() {
        assert!(ocean_grid_indices(0).is_empty());
        assert!(ocean_grid_indices(1).is_empty());
    }

    #[test]
    fn index_count_matches_the_generated_grid() {
        assert_eq!(ocean_index_count(4), Some(54));
        assert_eq!(ocean_index_count(4), Some(ocean_grid_indices(4).len() as u32));
        assert_eq!(ocean_index_count(1), None);
    }

    #[test]
    fn grids_past_u32_indices_are_rejected_without_overflow() {
        // 29_999² cells * 6 is about 5.4e9 indices.
        assert_eq!(ocean_index_count(30_000), None);
        assert!(ocean_grid_indices(30_000).is_empty());
        assert_eq!(ocean_index_count(u32::MAX), None);
        assert!(ocean_index_count(26_755).is_some());
        assert_eq!(ocean_index_count(26_756), None);
    }

    #[test]
    fn indices_stay_inside_the_grid() {
        let n = 8;
        assert!(ocean_grid_indices(n).iter().all(|&i| i < n * n));
    }
}
