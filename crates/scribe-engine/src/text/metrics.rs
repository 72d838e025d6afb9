/// Glyph rectangle inside the atlas, in pixels. `top < bottom` (rows grow down).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AtlasBounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Per-glyph layout metrics, in font units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Glyph {
    pub advance: f32,
    /// Left side bearing.
    pub lsb: f32,
    /// Right side bearing.
    pub rsb: f32,
    pub width: f32,
    pub height: f32,
    /// Offset of the glyph's bottom edge above the baseline.
    pub bearing_y: f32,
    pub atlas: AtlasBounds,
}

impl Glyph {
    /// Used when a character has no metrics: unit sized, sampling the
    /// atlas origin.
    pub const FALLBACK: Glyph = Glyph {
        advance: 1.0,
        lsb: 1.0,
        rsb: 1.0,
        width: 1.0,
        height: 1.0,
        bearing_y: 1.0,
        atlas: AtlasBounds { left: 0.0, top: 0.0, right: 0.0, bottom: 0.0 },
    };
}

/// Blank atlas rectangle used for spaces, as `(u0, v0, u1, v1)`.
///
/// Atlas producers must leave every texel from `u = BLANK_COLUMN` rightwards
/// empty.
pub const BLANK_UV: (f32, f32, f32, f32) = (0.95, 0.0, 0.96, 0.01);
pub const BLANK_COLUMN: f32 = 0.94;

/// Glyph lookup consumed by the text layout in the batch renderer.
pub trait GlyphMetrics {
    fn glyph(&self, ch: char) -> Option<Glyph>;

    /// World units per font unit for an em size of `size` world units.
    fn scale(&self, size: f32) -> f32;

    /// Baseline-to-baseline distance in font units.
    fn line_height(&self) -> f32;

    /// Atlas dimensions in pixels.
    fn atlas_size(&self) -> (u32, u32);
}
