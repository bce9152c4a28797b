//! Fonts, glyph cache and text geometry.
//!
//! Glyphs are rasterized on demand with fontdue into a per-font atlas. Text
//! geometry is produced on the CPU in NDC; the renderer only uploads it.

mod font;
mod glyph_cache;
mod mesh;

pub use font::{Font, FontMetrics};
pub use glyph_cache::{GlyphAtlas, GlyphCache, GlyphInfo, GlyphRasterizer, RasterizedGlyph};
pub use mesh::{generate_vertices, measure, Affine, TextMesh, TextPlacement, TextVertex};
