//! Text drawing through a font's glyph atlas.

use crate::error::{AfferentError, Result};
use crate::text::{Affine, Font, TextPlacement};

use super::pipeline::DrawMode;
use super::pool::BufferKind;
use super::renderer::Renderer;

impl Renderer {
    /// Draws `text` with its baseline origin at `(x, y)` drawable pixels.
    ///
    /// Glyphs are cached on demand; the changed atlas rows are uploaded
    /// before the draw. Glyphs that cannot be cached are skipped.
    pub fn draw_text(
        &mut self,
        font: &mut Font,
        text: &str,
        x: f32,
        y: f32,
        color: [f32; 4],
        transform: Option<Affine>,
    ) -> Result<()> {
        if !self.accepts_draw("draw_text") {
            return Ok(());
        }
        if text.is_empty() {
            return Ok(());
        }

        let (screen_width, screen_height) = self.screen;
        let mesh = font.generate_vertices(
            text,
            &TextPlacement {
                x,
                y,
                color,
                screen_width,
                screen_height,
                transform,
            },
        );

        self.sync_atlas(font)?;
        if mesh.is_empty() {
            return Ok(());
        }

        let (Some(vertices), Some(indices)) = (
            self.upload(BufferKind::TextVertex, bytemuck::cast_slice(&mesh.vertices)),
            self.upload(BufferKind::TextIndex, bytemuck::cast_slice(&mesh.indices)),
        ) else {
            return Ok(());
        };
        let vertex_len = std::mem::size_of_val(mesh.vertices.as_slice()) as u64;
        let index_len = std::mem::size_of_val(mesh.indices.as_slice()) as u64;
        let index_count = mesh.indices.len() as u32;

        let Some(atlas) = font.gpu_atlas.as_ref() else { return Ok(()) };
        self.record(DrawMode::Text, |pass| {
            pass.set_bind_group(0, &atlas.bind_group, &[]);
            pass.set_vertex_buffer(0, vertices.slice(..vertex_len));
            pass.set_index_buffer(indices.slice(..index_len), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        });
        Ok(())
    }

    /// Creates the atlas texture on first use and uploads dirty rows.
    fn sync_atlas(&self, font: &mut Font) -> Result<()> {
        if font.gpu_atlas.is_none() {
            let atlas = font.glyph_cache().atlas();
            let (width, height) = (atlas.width(), atlas.height());
            let max = self.gpu.device().limits().max_texture_dimension_2d;
            if width > max || height > max {
                return Err(AfferentError::Text(format!(
                    "glyph atlas {width}x{height} exceeds the device limit of {max}"
                )));
            }
            font.gpu_atlas = Some(self.create_texture(
                "afferent glyph atlas",
                width,
                height,
                wgpu::TextureFormat::R8Unorm,
            ));
            font.glyph_cache_mut().atlas_mut().mark_all_dirty();
        }

        let Some(rows) = font.glyph_cache_mut().atlas_mut().take_dirty_rows() else {
            return Ok(());
        };
        if let Some(gpu) = font.gpu_atlas.as_ref() {
            log::trace!("uploading atlas rows {rows:?}");
            self.write_rows(&gpu.texture, font.glyph_cache().atlas().pixels(), 1, rows);
        }
        Ok(())
    }
}
