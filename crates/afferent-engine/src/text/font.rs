use std::path::Path;

use crate::config::AtlasConfig;
use crate::error::{AfferentError, Result};
use crate::render::GpuTexture;

use super::glyph_cache::{GlyphCache, GlyphInfo, GlyphRasterizer, RasterizedGlyph};
use super::mesh::{self, TextMesh, TextPlacement};

/// Vertical metrics of a font at its loaded pixel size.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontMetrics {
    pub ascender: f32,
    /// Negative: distance below the baseline.
    pub descender: f32,
    pub line_height: f32,
}

/// A fontdue face pinned to one pixel size.
struct Face {
    font: fontdue::Font,
    px: f32,
}

impl GlyphRasterizer for Face {
    fn rasterize(&self, ch: char) -> Option<RasterizedGlyph> {
        let (m, coverage) = self.font.rasterize(ch, self.px);
        Some(RasterizedGlyph {
            width: m.width as u32,
            height: m.height as u32,
            advance: m.advance_width,
            bearing_x: m.xmin as f32,
            bearing_y: (m.ymin + m.height as i32) as f32,
            coverage,
        })
    }
}

/// A loaded font with its glyph cache and atlas.
///
/// The GPU copy of the atlas is created by the renderer on first use and
/// released when the font is dropped.
pub struct Font {
    face: Face,
    cache: GlyphCache,
    metrics: FontMetrics,
    size: u32,
    pub(crate) gpu_atlas: Option<GpuTexture>,
}

impl Font {
    /// Loads a TrueType/OpenType file at `size` pixels.
    pub fn load(path: impl AsRef<Path>, size: u32) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| AfferentError::Font(format!("{}: {e}", path.display())))?;
        Self::from_bytes(&bytes, size)
    }

    /// Parses font bytes with the default atlas configuration.
    pub fn from_bytes(bytes: &[u8], size: u32) -> Result<Self> {
        Self::from_bytes_with(bytes, size, &AtlasConfig::default())
    }

    pub fn from_bytes_with(bytes: &[u8], size: u32, atlas: &AtlasConfig) -> Result<Self> {
        if size == 0 {
            return Err(AfferentError::Font("font size must be positive".into()));
        }
        let px = size as f32;

        let font = fontdue::Font::from_bytes(
            bytes,
            fontdue::FontSettings {
                scale: px,
                ..fontdue::FontSettings::default()
            },
        )
        .map_err(|e| AfferentError::Font(e.to_string()))?;

        let metrics = match font.horizontal_line_metrics(px) {
            Some(lm) => FontMetrics {
                ascender: lm.ascent,
                descender: lm.descent,
                line_height: lm.new_line_size,
            },
            None => {
                log::debug!("font has no horizontal metrics; estimating from size");
                FontMetrics {
                    ascender: px * 0.8,
                    descender: -px * 0.2,
                    line_height: px * 1.2,
                }
            }
        };

        Ok(Self {
            face: Face { font, px },
            cache: GlyphCache::new(atlas),
            metrics,
            size,
            gpu_atlas: None,
        })
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    #[inline]
    pub fn glyph_cache(&self) -> &GlyphCache {
        &self.cache
    }

    #[inline]
    pub(crate) fn glyph_cache_mut(&mut self) -> &mut GlyphCache {
        &mut self.cache
    }

    /// Caches `ch` into the atlas. See [`GlyphCache::cache_glyph`].
    pub fn cache_glyph(&mut self, ch: char) -> Option<GlyphInfo> {
        self.cache.cache_glyph(&self.face, ch)
    }

    /// Returns `(width, line_height)` of `text` in pixels.
    pub fn measure(&mut self, text: &str) -> (f32, f32) {
        let width = mesh::measure(&mut self.cache, &self.face, text);
        (width, self.metrics.line_height)
    }

    /// Builds the quads for `text`; see [`mesh::generate_vertices`].
    pub fn generate_vertices(&mut self, text: &str, place: &TextPlacement) -> TextMesh {
        mesh::generate_vertices(&mut self.cache, &self.face, text, place)
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("size", &self.size)
            .field("metrics", &self.metrics)
            .field("atlas_full", &self.cache.atlas().is_full())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_a_font_error() {
        let err = Font::from_bytes(b"definitely not a font", 16).unwrap_err();
        assert!(matches!(err, AfferentError::Font(_)));
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = Font::from_bytes(&[], 0).unwrap_err();
        assert!(matches!(err, AfferentError::Font(_)));
    }

    #[test]
    fn missing_file_is_a_font_error() {
        let err = Font::load("/nonexistent/afferent/font.ttf", 16).unwrap_err();
        assert!(matches!(err, AfferentError::Font(_)));
    }
}
