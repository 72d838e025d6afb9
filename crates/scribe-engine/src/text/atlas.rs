use std::collections::HashMap;

use thiserror::Error;

use super::metrics::{AtlasBounds, BLANK_COLUMN, Glyph, GlyphMetrics};

const GLYPH_PADDING: u32 = 1;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font parse failed: {0}")]
    Parse(String),
    #[error("glyph {ch:?} does not fit in the {width}x{height} atlas")]
    AtlasFull { ch: char, width: u32, height: u32 },
}

#[derive(Debug, Clone)]
pub struct FontAtlasConfig {
    /// Pixel size glyphs are rasterized at.
    pub raster_px: f32,
    pub width: u32,
    pub height: u32,
    pub charset: Vec<char>,
}

impl Default for FontAtlasConfig {
    fn default() -> Self {
        Self {
            raster_px: 48.0,
            width: 1024,
            height: 1024,
            charset: (' '..='~').collect(),
        }
    }
}

/// Row-by-row rectangle packer that never places pixels in the blank column.
#[derive(Debug, Clone)]
pub(crate) struct ShelfPacker {
    usable_width: u32,
    height: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl ShelfPacker {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            usable_width: (width as f32 * BLANK_COLUMN).floor() as u32,
            height,
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
        }
    }

    /// Top-left corner for a `w × h` rectangle, or `None` when full.
    pub(crate) fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if self.cursor_x + w + GLYPH_PADDING > self.usable_width {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }
        if self.cursor_x + w + GLYPH_PADDING > self.usable_width
            || self.cursor_y + h + GLYPH_PADDING > self.height
        {
            return None;
        }

        let at = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(at)
    }
}

/// Glyph atlas rasterized with fontdue into a single-channel bitmap.
///
/// Metrics are reported in font units; the bitmap is `R8Unorm` rows,
/// top row first.
pub struct FontAtlas {
    glyphs: HashMap<char, Glyph>,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    units_per_em: f32,
    line_height: f32,
}

impl FontAtlas {
    pub fn from_bytes(bytes: &[u8], config: &FontAtlasConfig) -> Result<Self, FontError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;

        let units_per_em = font.units_per_em();
        let px = config.raster_px.max(1.0);
        let to_units = units_per_em / px;

        let (width, height) = (config.width.max(1), config.height.max(1));
        let mut pixels = vec![0u8; (width * height) as usize];
        let mut packer = ShelfPacker::new(width, height);
        let mut glyphs = HashMap::with_capacity(config.charset.len());

        for &ch in &config.charset {
            let (m, bitmap) = font.rasterize(ch, px);
            let (w, h) = (m.width as u32, m.height as u32);

            let atlas = if w == 0 || h == 0 {
                AtlasBounds::default()
            } else {
                let Some((x, y)) = packer.place(w, h) else {
                    log::error!("glyph atlas {width}x{height} is full at {ch:?}");
                    return Err(FontError::AtlasFull { ch, width, height });
                };
                for row in 0..h {
                    let src = (row * w) as usize;
                    let dst = ((y + row) * width + x) as usize;
                    pixels[dst..dst + w as usize].copy_from_slice(&bitmap[src..src + w as usize]);
                }
                AtlasBounds {
                    left: x as f32,
                    top: y as f32,
                    right: (x + w) as f32,
                    bottom: (y + h) as f32,
                }
            };

            let lsb = m.xmin as f32;
            let advance = m.advance_width;
            glyphs.insert(
                ch,
                Glyph {
                    advance: advance * to_units,
                    lsb: lsb * to_units,
                    rsb: (advance - lsb - m.width as f32) * to_units,
                    width: m.width as f32 * to_units,
                    height: m.height as f32 * to_units,
                    bearing_y: m.ymin as f32 * to_units,
                    atlas,
                },
            );
        }

        let line_height = font
            .horizontal_line_metrics(px)
            .map(|l| l.new_line_size * to_units)
            .unwrap_or(units_per_em);

        log::info!(
            "font atlas {width}x{height}: {} glyphs rasterized at {px}px",
            glyphs.len()
        );

        Ok(Self { glyphs, pixels, width, height, units_per_em, line_height })
    }

    /// Atlas bitmap, one byte per texel.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl GlyphMetrics for FontAtlas {
    fn glyph(&self, ch: char) -> Option<Glyph> {
        self.glyphs.get(&ch).copied()
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.units_per_em
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn atlas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
