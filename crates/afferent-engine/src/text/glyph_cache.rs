use std::ops::Range;

use crate::config::AtlasConfig;

/// Pixels left between glyphs and around the atlas edge.
const GLYPH_PADDING: u32 = 1;

/// A single rasterized glyph as produced by a font engine.
#[derive(Debug, Clone, Default)]
pub struct RasterizedGlyph {
    pub width: u32,
    pub height: u32,
    /// Horizontal pen advance in pixels.
    pub advance: f32,
    /// Offset from the pen position to the bitmap's left edge.
    pub bearing_x: f32,
    /// Offset from the baseline up to the bitmap's top edge.
    pub bearing_y: f32,
    /// Row-major coverage, `width * height` bytes.
    pub coverage: Vec<u8>,
}

/// Source of glyph bitmaps.
pub trait GlyphRasterizer {
    /// Rasterizes `ch`, or returns `None` when the engine cannot.
    fn rasterize(&self, ch: char) -> Option<RasterizedGlyph>;
}

/// Cached metrics and atlas placement of one glyph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphInfo {
    pub advance: f32,
    pub bearing_x: f32,
    pub bearing_y: f32,
    pub width: u32,
    pub height: u32,
    pub atlas_x: u32,
    pub atlas_y: u32,
}

impl GlyphInfo {
    /// Whether the glyph has a bitmap to draw (spaces do not).
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Single-channel glyph atlas packed with a shelf cursor.
///
/// The cursor moves left to right and wraps to a new shelf when a glyph does
/// not fit horizontally. Once a glyph does not fit vertically the atlas is
/// full for good; there is no eviction or growth.
pub struct GlyphAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    full: bool,
    dirty_rows: Option<Range<u32>>,
}

impl GlyphAtlas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            full: false,
            dirty_rows: None,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Rows written since the last call, for partial texture uploads.
    pub fn take_dirty_rows(&mut self) -> Option<Range<u32>> {
        self.dirty_rows.take()
    }

    /// Marks every row dirty (e.g. after the GPU copy was recreated).
    pub fn mark_all_dirty(&mut self) {
        self.dirty_rows = Some(0..self.height);
    }

    /// Reserves a `w x h` cell and copies `coverage` into it.
    ///
    /// Returns the cell's top-left corner, or `None` when the atlas is full
    /// or the glyph could never fit. Only the first case fills the atlas.
    fn place(&mut self, w: u32, h: u32, coverage: &[u8]) -> Option<(u32, u32)> {
        if self.full {
            return None;
        }

        if w + 2 * GLYPH_PADDING > self.width || h + 2 * GLYPH_PADDING > self.height {
            log::warn!(
                "{w}x{h} glyph does not fit a {}x{} atlas; skipped",
                self.width,
                self.height
            );
            return None;
        }

        if self.cursor_x + w + GLYPH_PADDING > self.width {
            self.cursor_x = GLYPH_PADDING;
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.row_height = 0;
        }

        if self.cursor_x + w + GLYPH_PADDING > self.width
            || self.cursor_y + h + GLYPH_PADDING > self.height
        {
            log::warn!(
                "glyph atlas is full ({}x{}); further glyphs will not render",
                self.width,
                self.height
            );
            self.full = true;
            return None;
        }

        let (x, y) = (self.cursor_x, self.cursor_y);

        if w > 0 && h > 0 {
            let stride = self.width as usize;
            for row in 0..h as usize {
                let src = &coverage[row * w as usize..(row + 1) * w as usize];
                let dst = (y as usize + row) * stride + x as usize;
                self.pixels[dst..dst + w as usize].copy_from_slice(src);
            }
            self.dirty_rows = Some(match self.dirty_rows.take() {
                Some(r) => r.start.min(y)..r.end.max(y + h),
                None => y..y + h,
            });
        }

        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some((x, y))
    }
}

/// Direct-mapped glyph cache over a [`GlyphAtlas`].
pub struct GlyphCache {
    glyphs: Vec<Option<GlyphInfo>>,
    atlas: GlyphAtlas,
}

impl GlyphCache {
    pub fn new(config: &AtlasConfig) -> Self {
        Self {
            glyphs: vec![None; config.max_codepoint as usize],
            atlas: GlyphAtlas::new(config.width, config.height),
        }
    }

    /// Codepoints at or above this bound are unsupported.
    #[inline]
    pub fn max_codepoint(&self) -> u32 {
        self.glyphs.len() as u32
    }

    #[inline]
    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    #[inline]
    pub fn atlas_mut(&mut self) -> &mut GlyphAtlas {
        &mut self.atlas
    }

    /// Returns the glyph for `ch`, rasterizing it into the atlas on first use.
    ///
    /// `None` means the glyph is unsupported, the engine failed, or the atlas
    /// is full; callers skip the glyph.
    pub fn cache_glyph<R>(&mut self, rasterizer: &R, ch: char) -> Option<GlyphInfo>
    where
        R: GlyphRasterizer + ?Sized,
    {
        let slot = ch as usize;
        if slot >= self.glyphs.len() {
            return None;
        }
        if let Some(info) = self.glyphs[slot] {
            return Some(info);
        }

        let glyph = rasterizer.rasterize(ch)?;
        if glyph.coverage.len() < glyph.width as usize * glyph.height as usize {
            log::debug!("rasterizer returned a short bitmap for {ch:?}");
            return None;
        }

        let (atlas_x, atlas_y) = self.atlas.place(glyph.width, glyph.height, &glyph.coverage)?;

        let info = GlyphInfo {
            advance: glyph.advance,
            bearing_x: glyph.bearing_x,
            bearing_y: glyph.bearing_y,
            width: glyph.width,
            height: glyph.height,
            atlas_x,
            atlas_y,
        };
        self.glyphs[slot] = Some(info);
        Some(info)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Every glyph is a solid `size x size` square advancing `size + 2`.
    /// Spaces have no bitmap.
    pub(crate) struct BoxRasterizer {
        pub size: u32,
        pub calls: Cell<usize>,
    }

    impl BoxRasterizer {
        pub(crate) fn new(size: u32) -> Self {
            Self { size, calls: Cell::new(0) }
        }
    }

    impl GlyphRasterizer for BoxRasterizer {
        fn rasterize(&self, ch: char) -> Option<RasterizedGlyph> {
            self.calls.set(self.calls.get() + 1);
            let s = if ch == ' ' { 0 } else { self.size };
            Some(RasterizedGlyph {
                width: s,
                height: s,
                advance: (self.size + 2) as f32,
                bearing_x: 1.0,
                bearing_y: s as f32,
                coverage: vec![ch as u8; (s * s) as usize],
            })
        }
    }

    fn cache(w: u32, h: u32) -> GlyphCache {
        GlyphCache::new(&AtlasConfig { width: w, height: h, max_codepoint: 256 })
    }

    // ── caching ───────────────────────────────────────────────────────────

    #[test]
    fn caching_twice_is_idempotent() {
        let r = BoxRasterizer::new(8);
        let mut c = cache(64, 64);
        let first = c.cache_glyph(&r, 'A').unwrap();
        let second = c.cache_glyph(&r, 'A').unwrap();
        assert_eq!(first, second);
        assert_eq!(r.calls.get(), 1);
    }

    #[test]
    fn unsupported_codepoints_are_never_cached() {
        let r = BoxRasterizer::new(8);
        let mut c = cache(64, 64);
        assert!(c.cache_glyph(&r, 'é').is_some()); // U+00E9 < 256
        assert!(c.cache_glyph(&r, 'Ā').is_none()); // U+0100
        assert!(c.cache_glyph(&r, '€').is_none());
        assert_eq!(r.calls.get(), 1);
    }

    #[test]
    fn first_glyph_starts_after_padding() {
        let r = BoxRasterizer::new(8);
        let mut c = cache(64, 64);
        let g = c.cache_glyph(&r, 'A').unwrap();
        assert_eq!((g.atlas_x, g.atlas_y), (1, 1));
    }

    #[test]
    fn bitmap_is_copied_into_atlas() {
        let r = BoxRasterizer::new(4);
        let mut c = cache(32, 32);
        let g = c.cache_glyph(&r, 'B').unwrap();
        let stride = c.atlas().width() as usize;
        let px = c.atlas().pixels();
        for y in 0..4 {
            for x in 0..4 {
                let i = (g.atlas_y as usize + y) * stride + g.atlas_x as usize + x;
                assert_eq!(px[i], b'B');
            }
        }
        // Padding column stays clear.
        assert_eq!(px[g.atlas_y as usize * stride + g.atlas_x as usize + 4], 0);
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn glyphs_advance_left_to_right_then_wrap() {
        let r = BoxRasterizer::new(8);
        let mut c = cache(28, 64);
        let a = c.cache_glyph(&r, 'A').unwrap();
        let b = c.cache_glyph(&r, 'B').unwrap();
        let d = c.cache_glyph(&r, 'C').unwrap();
        let e = c.cache_glyph(&r, 'D').unwrap();
        assert_eq!((a.atlas_x, a.atlas_y), (1, 1));
        assert_eq!((b.atlas_x, b.atlas_y), (10, 1));
        assert_eq!((d.atlas_x, d.atlas_y), (19, 1));
        // 28 + 8 + 1 > 28: wraps below the first shelf.
        assert_eq!((e.atlas_x, e.atlas_y), (1, 10));
    }

    #[test]
    fn overflow_fails_without_corrupting_cached_glyphs() {
        let r = BoxRasterizer::new(8);
        // Two glyphs fill the only shelf that fits vertically.
        let mut c = cache(20, 12);
        let a = c.cache_glyph(&r, 'A').unwrap();
        let b = c.cache_glyph(&r, 'B').unwrap();
        let snapshot = c.atlas().pixels().to_vec();

        assert!(c.cache_glyph(&r, 'C').is_none());
        assert!(c.atlas().is_full());
        assert!(c.cache_glyph(&r, 'D').is_none());

        assert_eq!(c.cache_glyph(&r, 'A'), Some(a));
        assert_eq!(c.cache_glyph(&r, 'B'), Some(b));
        assert_eq!(c.atlas().pixels(), &snapshot[..]);
    }

    #[test]
    fn oversized_glyph_is_skipped_without_filling_the_atlas() {
        let big = BoxRasterizer::new(40);
        let small = BoxRasterizer::new(4);
        let mut c = cache(32, 64);

        assert!(c.cache_glyph(&big, 'W').is_none());
        assert!(!c.atlas().is_full());
        assert_eq!(c.atlas_mut().take_dirty_rows(), None);

        let g = c.cache_glyph(&small, 'i').unwrap();
        assert_eq!((g.atlas_x, g.atlas_y), (1, 1));
    }

    #[test]
    fn glyph_taller_than_the_atlas_is_skipped() {
        let tall = BoxRasterizer::new(20);
        let mut c = cache(64, 16);
        assert!(c.cache_glyph(&tall, 'T').is_none());
        assert!(!c.atlas().is_full());
        assert!(c.cache_glyph(&BoxRasterizer::new(8), 'a').is_some());
    }

    #[test]
    fn dirty_rows_cover_new_glyphs() {
        let r = BoxRasterizer::new(8);
        let mut c = cache(64, 64);
        c.cache_glyph(&r, 'A');
        assert_eq!(c.atlas_mut().take_dirty_rows(), Some(1..9));
        assert_eq!(c.atlas_mut().take_dirty_rows(), None);

        c.cache_glyph(&r, ' ');
        assert_eq!(c.atlas_mut().take_dirty_rows(), None);
    }

    #[test]
    fn empty_glyphs_are_cached_with_metrics() {
        let r = BoxRasterizer::new(8);
        let mut c = cache(64, 64);
        let space = c.cache_glyph(&r, ' ').unwrap();
        assert!(!space.is_visible());
        assert_eq!(space.advance, 10.0);
    }
}
