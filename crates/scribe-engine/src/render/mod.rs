//! Offscreen rendering: render target, shader registry and the batch
//! renderer.
//!
//! Conventions:
//! - World space is Y-up; every primitive sits on the painting layer plane.
//! - Offscreen rows are stored bottom-up. Window coordinates (Y-down) are
//!   flipped only when picking and when compositing.

pub mod batch;
pub mod framebuffer;
pub mod registry;

pub use batch::{
    BackendError, BatchConfig, BatchRenderer, FrameStats, IdReader, PrimitiveKind, RenderBackend, WgpuBackend,
};
pub use framebuffer::{AttachmentDesc, Framebuffer, FramebufferError, ReadbackError};
pub use registry::{ProgramKind, RegistryError, ShaderRegistry, TargetFormats};
