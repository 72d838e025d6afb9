//! Thin wrappers over wgpu resources: validated programs, layout-described
//! vertex buffers and sampled textures.

mod buffer;
mod layout;
mod program;
mod texture;

pub use buffer::VertexBuffer;
pub use layout::{AttribLayout, AttribType, Field, RecordWriter, Semantic, VertexLayout};
pub use program::{Program, ProgramDesc, ShaderError, TextureSlot, UniformKind, UniformSlot};
pub use texture::{Filtering, FilteringConfig, ImageFormat, Texture, TextureConfig};
