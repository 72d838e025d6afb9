//! Batched immediate-mode drawing.
//!
//! [`BatchRenderer`] turns lines, circles and text into unit quads, stages
//! them per [`PrimitiveKind`] and hands finished vertex streams to a
//! [`RenderBackend`]. [`WgpuBackend`] draws them into an offscreen target
//! whose `"id"` attachment backs picking.

mod backend;
mod kind;
mod picking;
mod quad;
mod renderer;
mod staging;
mod stats;
mod wgpu_backend;

pub use backend::{Batch, RenderBackend, SceneUniforms};
pub use kind::PrimitiveKind;
pub use picking::{COLOR_ATTACHMENT, ID_ATTACHMENT, IdReader, decode_id, encode_id, window_to_target_row};
pub use quad::{Corner, MASK, QuadTransform, VERTICES_PER_QUAD, WINDING};
pub use renderer::{BatchConfig, BatchRenderer, GlyphQuad, layout_text};
pub use staging::StagingBuffer;
pub use stats::{FrameStats, KindStats};
pub use wgpu_backend::{BackendError, COLOR_FORMAT, ID_FORMAT, WgpuBackend};
