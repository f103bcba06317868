//! The rasterizer seam: the capability that turns a [`SceneGraph`] and a
//! [`PerspectiveCamera`] into pixels, plus the GPU-side resources (geometry,
//! materials) it hands out as opaque handles.
//!
//! The scene manager owns the handles and decides when they die; the
//! rasterizer only stores what the handles point to.

mod geometry;

use std::fmt;

pub use geometry::{BoxGeometry, MeshVertex};

use crate::camera::PerspectiveCamera;
use crate::scene::SceneGraph;
use crate::settings::Color;

/// Handle to a geometry created by a [`Rasterizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub u32);

/// Handle to a material created by a [`Rasterizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub u32);

/// Failure to produce a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The frame could not be acquired in time; try again next frame.
    Timeout,
    /// The surface was outdated or lost and has been reconfigured; the
    /// next frame should succeed.
    Reconfigured,
    /// The rendering context is unusable (out of memory, device lost).
    Fatal(String),
}

impl RenderError {
    /// Whether the animation task may keep running after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal(_))
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out acquiring frame"),
            Self::Reconfigured => write!(f, "surface reconfigured"),
            Self::Fatal(msg) => write!(f, "rendering context lost: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Draws a scene from a camera into a pixel surface and owns the GPU copies
/// of geometries and materials.
///
/// Calls after [`dispose`](Self::dispose) are never made by the scene
/// manager.
pub trait Rasterizer {
    /// Set the output size in CSS/logical pixels. The drawing buffer is this
    /// size multiplied by the pixel ratio.
    fn set_size(&mut self, width: u32, height: u32);

    /// Set the device pixel ratio applied to the logical size.
    fn set_pixel_ratio(&mut self, ratio: f64);

    /// Upload a geometry.
    fn create_geometry(&mut self, geometry: &BoxGeometry) -> GeometryHandle;

    /// Release a geometry.
    fn dispose_geometry(&mut self, handle: GeometryHandle);

    /// Create a material with the given base color.
    fn create_material(&mut self, color: Color) -> MaterialHandle;

    /// Change a material's base color in place.
    fn update_material(&mut self, handle: MaterialHandle, color: Color);

    /// Release a material.
    fn dispose_material(&mut self, handle: MaterialHandle);

    /// Draw the scene from the camera's viewpoint.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the frame could not be presented.
    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError>;

    /// Release the rendering context. Borrowed resources (the surface
    /// element itself) are left alone.
    fn dispose(&mut self);
}
