//! Utility types shared by the container codec.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`Rect`], [`IRect`], [`ColorTransform`] and affine helpers over `glam`
//! - [`ByAddress`] - identity keys for shared objects

mod error;
mod identity;
mod math;

pub use error::*;
pub use identity::*;
pub use math::*;
