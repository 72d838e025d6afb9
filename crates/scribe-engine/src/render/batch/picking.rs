use crate::render::framebuffer::ReadbackError;
use crate::scene::EntityId;

use super::RenderBackend;

pub const COLOR_ATTACHMENT: &str = "color";
pub const ID_ATTACHMENT: &str = "id";

/// Splits an id over four channels, least significant byte first.
#[inline]
pub fn encode_id(id: EntityId) -> [u8; 4] {
    id.get().to_le_bytes()
}

/// Inverse of [`encode_id`]. Short input decodes to [`EntityId::NONE`].
#[inline]
pub fn decode_id(bytes: &[u8]) -> EntityId {
    match bytes {
        [a, b, c, d, ..] => EntityId(u32::from_le_bytes([*a, *b, *c, *d])),
        _ => EntityId::NONE,
    }
}

/// Reads the id attachment of a backend's offscreen target.
pub struct IdReader<'a, B: RenderBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: RenderBackend + ?Sized> IdReader<'a, B> {
    pub(crate) fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Whole attachment, bottom row first, four bytes per pixel.
    pub fn read_buffer(&self) -> Result<Vec<u8>, ReadbackError> {
        let (w, h) = self.backend.target_size();
        self.backend.read_attachment(ID_ATTACHMENT, 0, 0, w, h)
    }

    /// Raw bytes at target coordinates (row 0 is the bottom row).
    pub fn read_pixel(&self, x: u32, y: u32) -> Result<Vec<u8>, ReadbackError> {
        self.backend.read_attachment(ID_ATTACHMENT, x, y, 1, 1)
    }

    /// Entity under window pixel `(x, y)` (row 0 is the top row).
    pub fn pick(&self, x: u32, y: u32) -> Result<EntityId, ReadbackError> {
        let (w, h) = self.backend.target_size();
        if x >= w || y >= h {
            return Err(ReadbackError::OutOfBounds {
                x,
                y,
                width: 1,
                height: 1,
                target_width: w,
                target_height: h,
            });
        }
        let bytes = self.read_pixel(x, window_to_target_row(y, h))?;
        Ok(decode_id(&bytes))
    }
}

/// Window rows grow down, target rows grow up.
#[inline]
pub fn window_to_target_row(window_y: u32, height: u32) -> u32 {
    height - 1 - window_y
}
