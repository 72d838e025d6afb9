use crate::math::Mat4;
use crate::render::framebuffer::ReadbackError;
use crate::scene::Rgb;

use super::PrimitiveKind;

/// Matrices shared by every batch of a scene.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    /// Always identity: corners are transformed before staging.
    pub model: Mat4,
}

/// One flush worth of staged records.
#[derive(Debug)]
pub struct Batch<'a> {
    pub kind: PrimitiveKind,
    pub vertices: &'a [u8],
    pub vertex_count: u32,
    pub uniforms: &'a SceneUniforms,
}

/// GPU side of the batch renderer.
///
/// Batching and layout decisions stay in `BatchRenderer`; a backend only
/// receives finished vertex streams, in submission order.
pub trait RenderBackend {
    /// What `present` composites onto.
    type Surface: ?Sized;

    /// Binds the offscreen target and clears color to `background`, ids to
    /// `0` and depth/stencil to `1`/`0`.
    fn begin_target(&mut self, background: Rgb);

    /// Draws `batch.vertex_count` vertices with the kind's program.
    fn draw_batch(&mut self, batch: &Batch<'_>);

    /// Unbinds the offscreen target and composites its color attachment onto
    /// `surface`.
    fn present(&mut self, surface: &Self::Surface);

    /// Replaces the single-channel glyph atlas sampled by text batches.
    fn upload_glyph_atlas(&mut self, width: u32, height: u32, pixels: &[u8]);

    /// Raw bytes of a region of the named attachment, in storage rows.
    fn read_attachment(&self, name: &str, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>, ReadbackError>;

    fn target_size(&self) -> (u32, u32);
}
