//! Scene model: the primitives an editor holds and re-submits every frame.
//!
//! - `Drawable` is the closed set of renderable kinds
//! - ids are unique per process and never `0`
//! - polyline joints are synthesized here, never by the renderer

mod color;
mod drawable;
mod id;
mod joints;
mod polyline;
mod store;

pub use color::Rgb;
pub use drawable::{Circle, Drawable, Line, Text};
pub use id::{EntityId, IdGenerator};
pub use joints::joint_circles;
pub use polyline::Polyline;
pub use store::Scene;
