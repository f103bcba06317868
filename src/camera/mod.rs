//! Camera system for the cube grid.
//!
//! A single perspective camera whose placement is derived from the grid
//! extents and whose aspect follows the drawing surface.

/// Core camera struct and GPU uniform types.
pub mod core;
/// Grid-extent based camera placement.
pub mod framing;

pub use self::core::{CameraUniform, PerspectiveCamera};
pub use self::framing::CameraFraming;

/// Vertical field of view in degrees.
pub const FOVY: f32 = 75.0;
/// Near clipping plane distance.
pub const ZNEAR: f32 = 0.1;
/// Far clipping plane distance.
pub const ZFAR: f32 = 1000.0;
