//! Coordinate and transform types shared by the culler and the renderer.
//!
//! Canonical space:
//! - element positions and sizes live in logical view units
//! - the default view covers `[-1, 1]` on both axes
//! - `Mat4` maps view units to clip space (wgpu depth convention, `z` in `[0, w]`)

mod color;
mod mat4;
mod vec2;

pub use color::ColorRgba;
pub use mat4::{ClipPoint, Mat4};
pub use vec2::Vec2;
