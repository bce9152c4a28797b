use bytemuck::{Pod, Zeroable};

use super::glyph_cache::{GlyphCache, GlyphRasterizer};

/// 2D affine transform `[a, b, c, d, tx, ty]`.
///
/// `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine(pub [f32; 6]);

impl Affine {
    pub const IDENTITY: Affine = Affine([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    #[inline]
    pub const fn translate(tx: f32, ty: f32) -> Self {
        Affine([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    #[inline]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, tx, ty] = self.0;
        (a * x + c * y + tx, b * x + d * y + ty)
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Text vertex: NDC position, atlas UV and color (8 floats).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
    pub color: [f32; 4],
}

/// Geometry for one string: 4 vertices and 6 indices per visible glyph.
#[derive(Debug, Default, Clone)]
pub struct TextMesh {
    pub vertices: Vec<TextVertex>,
    pub indices: Vec<u32>,
}

impl TextMesh {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn glyph_count(&self) -> usize {
        self.indices.len() / 6
    }
}

/// Parameters of one text draw, in drawable pixels.
#[derive(Debug, Copy, Clone)]
pub struct TextPlacement {
    /// Pen origin on the baseline.
    pub x: f32,
    pub y: f32,
    pub color: [f32; 4],
    pub screen_width: f32,
    pub screen_height: f32,
    pub transform: Option<Affine>,
}

/// Sums glyph advances. Glyphs that cannot be cached contribute nothing.
pub fn measure<R>(cache: &mut GlyphCache, rasterizer: &R, text: &str) -> f32
where
    R: GlyphRasterizer + ?Sized,
{
    text.chars()
        .filter_map(|ch| cache.cache_glyph(rasterizer, ch))
        .map(|g| g.advance)
        .sum()
}

/// Lays `text` out on a single line and emits one textured quad per glyph.
pub fn generate_vertices<R>(
    cache: &mut GlyphCache,
    rasterizer: &R,
    text: &str,
    place: &TextPlacement,
) -> TextMesh
where
    R: GlyphRasterizer + ?Sized,
{
    let mut mesh = TextMesh::default();
    if text.is_empty() {
        return mesh;
    }

    let sw = place.screen_width.max(1.0);
    let sh = place.screen_height.max(1.0);
    let aw = cache.atlas().width() as f32;
    let ah = cache.atlas().height() as f32;
    let xf = place.transform.unwrap_or_default();

    let to_ndc = |px: f32, py: f32| -> [f32; 2] {
        let (x, y) = xf.apply(px, py);
        [x / sw * 2.0 - 1.0, 1.0 - y / sh * 2.0]
    };

    let mut pen_x = place.x;
    for ch in text.chars() {
        let Some(glyph) = cache.cache_glyph(rasterizer, ch) else { continue };

        if glyph.is_visible() {
            // Bearing Y points up from the baseline; screen Y points down.
            let gx = pen_x + glyph.bearing_x;
            let gy = place.y - glyph.bearing_y;
            let gw = glyph.width as f32;
            let gh = glyph.height as f32;

            let u0 = glyph.atlas_x as f32 / aw;
            let v0 = glyph.atlas_y as f32 / ah;
            let u1 = (glyph.atlas_x + glyph.width) as f32 / aw;
            let v1 = (glyph.atlas_y + glyph.height) as f32 / ah;

            let base = mesh.vertices.len() as u32;
            let corners = [
                (gx, gy, u0, v0),
                (gx + gw, gy, u1, v0),
                (gx + gw, gy + gh, u1, v1),
                (gx, gy + gh, u0, v1),
            ];
            for (px, py, u, v) in corners {
                mesh.vertices.push(TextVertex {
                    position: to_ndc(px, py),
                    tex_coord: [u, v],
                    color: place.color,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        pen_x += glyph.advance;
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AtlasConfig;
    use crate::text::glyph_cache::tests::BoxRasterizer;

    fn cache() -> GlyphCache {
        GlyphCache::new(&AtlasConfig { width: 100, height: 100, max_codepoint: 256 })
    }

    fn placement(transform: Option<Affine>) -> TextPlacement {
        TextPlacement {
            x: 10.0,
            y: 50.0,
            color: [1.0, 0.5, 0.25, 1.0],
            screen_width: 200.0,
            screen_height: 100.0,
            transform,
        }
    }

    #[test]
    fn affine_identity_and_translation() {
        assert_eq!(Affine::IDENTITY.apply(3.0, 4.0), (3.0, 4.0));
        assert_eq!(Affine::translate(1.0, -2.0).apply(3.0, 4.0), (4.0, 2.0));
        // 90° rotation: a=0, b=1, c=-1, d=0.
        assert_eq!(Affine([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]).apply(1.0, 0.0), (0.0, 1.0));
    }

    #[test]
    fn measure_sums_advances_and_skips_unsupported() {
        let r = BoxRasterizer::new(8);
        let mut c = cache();
        assert_eq!(measure(&mut c, &r, "ab c"), 40.0);
        assert_eq!(measure(&mut c, &r, "a€"), 10.0);
        assert_eq!(measure(&mut c, &r, ""), 0.0);
    }

    #[test]
    fn one_quad_per_visible_glyph() {
        let r = BoxRasterizer::new(8);
        let mut c = cache();
        let mesh = generate_vertices(&mut c, &r, "hi there", &placement(None));
        assert_eq!(mesh.glyph_count(), 7);
        assert_eq!(mesh.vertices.len(), 28);
        assert_eq!(&mesh.indices[6..12], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn quad_corners_are_converted_to_ndc() {
        let r = BoxRasterizer::new(8);
        let mut c = cache();
        let mesh = generate_vertices(&mut c, &r, "A", &placement(None));

        // Top-left: pen 10 + bearing 1 = 11px, baseline 50 - bearing 8 = 42px.
        let tl = mesh.vertices[0].position;
        assert!((tl[0] - (11.0 / 200.0 * 2.0 - 1.0)).abs() < 1e-6);
        assert!((tl[1] - (1.0 - 42.0 / 100.0 * 2.0)).abs() < 1e-6);

        let br = mesh.vertices[2].position;
        assert!((br[0] - (19.0 / 200.0 * 2.0 - 1.0)).abs() < 1e-6);
        assert!((br[1] - (1.0 - 50.0 / 100.0 * 2.0)).abs() < 1e-6);

        assert_eq!(mesh.vertices[0].tex_coord, [0.01, 0.01]);
        assert_eq!(mesh.vertices[0].color, [1.0, 0.5, 0.25, 1.0]);
    }

    #[test]
    fn transform_applies_to_every_corner() {
        let r = BoxRasterizer::new(8);
        let plain = generate_vertices(&mut cache(), &r, "A", &placement(None));
        let moved = generate_vertices(
            &mut cache(),
            &r,
            "A",
            &placement(Some(Affine::translate(20.0, 10.0))),
        );

        for (p, m) in plain.vertices.iter().zip(&moved.vertices) {
            assert!((m.position[0] - p.position[0] - 0.2).abs() < 1e-6);
            assert!((m.position[1] - p.position[1] + 0.2).abs() < 1e-6);
            assert_eq!(m.tex_coord, p.tex_coord);
        }
    }

    #[test]
    fn empty_text_yields_empty_mesh() {
        let r = BoxRasterizer::new(8);
        let mesh = generate_vertices(&mut cache(), &r, "", &placement(None));
        assert!(mesh.is_empty());
        assert_eq!(r.calls.get(), 0);
    }
}
