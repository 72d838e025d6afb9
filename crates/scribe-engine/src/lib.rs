//! scribe engine.
//!
//! Batched 2D scene rendering with an offscreen id target for picking:
//! - [`math`]: matrices, vectors and screen/world helpers
//! - [`gpu`]: programs, vertex buffers and textures over wgpu
//! - [`render`]: render target, shader registry and batch renderer
//! - [`scene`]: drawables, ids and polylines
//! - [`text`]: glyph metrics and the font atlas

pub mod device;
pub mod gpu;
pub mod logging;
pub mod math;
pub mod render;
pub mod scene;
pub mod text;
