//! Linear algebra shared by the renderer and the scene model.
//!
//! World space:
//! - +X right, +Y up
//! - primitives live on the painting layer plane (`z = BatchConfig::painting_layer`)
//! - the camera looks down -Z

mod matrix;
mod vec;

pub mod screen;

pub use matrix::{Column4, Mat4, Matrix};
pub use vec::{Vec2, Vec3, Vec4};

const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

#[inline]
pub fn to_radians(degrees: f32) -> f32 {
    degrees * DEG_TO_RAD
}

#[inline]
pub fn to_degrees(radians: f32) -> f32 {
    radians / DEG_TO_RAD
}
