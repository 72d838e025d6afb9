//! Glyph metrics and the fontdue-backed atlas that provides them.

mod atlas;
mod metrics;

pub use atlas::{FontAtlas, FontAtlasConfig, FontError};
pub use metrics::{AtlasBounds, BLANK_COLUMN, BLANK_UV, Glyph, GlyphMetrics};
