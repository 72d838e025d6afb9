//! Device setup.
//!
//! [`Gpu`] owns a window surface for the studio; [`HeadlessGpu`] is a bare
//! device/queue pair for offscreen work and GPU tests.

mod gpu;
mod headless;

pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use headless::HeadlessGpu;
