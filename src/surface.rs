//! Host capabilities the scene manager borrows: the drawing surface, its
//! container's size, a display-refresh frame scheduler, and a resize
//! watcher.
//!
//! The browser host implements these over a canvas element,
//! `requestAnimationFrame` and `ResizeObserver`; the native viewer over a
//! winit window.

use std::future::Future;

use crate::error::CubeError;
use crate::renderer::Rasterizer;

/// Id of a pending animation-frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub i32);

/// Schedules one callback on the next display refresh.
///
/// The host routes that callback to
/// [`SceneManager::frame`](crate::engine::SceneManager::frame).
pub trait FrameScheduler {
    /// Request a callback on the next refresh.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::Scheduler`] if the host refuses the request.
    fn request_frame(&mut self) -> Result<FrameRequest, CubeError>;

    /// Cancel a pending request. Unknown or already-fired ids are ignored.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// A live observation of the surface container's size.
///
/// The host routes size reports to
/// [`SceneManager::resize`](crate::engine::SceneManager::resize).
pub trait ResizeWatch {
    /// Stop observing. Further calls are no-ops.
    fn disconnect(&mut self);
}

/// The element the scene is drawn into, borrowed from the host.
pub trait DrawingSurface {
    /// Rasterizer bound to this surface.
    type Rasterizer: Rasterizer;
    /// Frame scheduler for this surface's display.
    type Scheduler: FrameScheduler;
    /// Resize observation handle.
    type Watch: ResizeWatch;

    /// Size of the surface's parent container in logical pixels. Either
    /// dimension may be zero while the container is detached or collapsed.
    fn container_size(&self) -> (u32, u32);

    /// Size of the whole viewport, used when the container reports zero.
    fn viewport_size(&self) -> (u32, u32);

    /// Device pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64;

    /// Acquire a rendering context sized to `width` x `height` logical
    /// pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::Gpu`] if the surface cannot provide a rendering
    /// context.
    fn create_rasterizer(
        &self,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Result<Self::Rasterizer, CubeError>>;

    /// Start watching the container for size changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot install the observer.
    fn watch_resize(&self) -> Result<Self::Watch, CubeError>;

    /// The frame scheduler used by the animation task.
    fn frame_scheduler(&self) -> Self::Scheduler;
}

/// Maximum device pixel ratio applied to the drawing buffer.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// `ratio` capped at [`MAX_PIXEL_RATIO`]; non-finite or non-positive ratios
/// fall back to 1.
#[must_use]
pub fn capped_pixel_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

/// Initial logical size: the container's, or the viewport's when the
/// container reports a zero dimension. Never returns a zero dimension.
#[must_use]
pub fn initial_size<S: DrawingSurface>(surface: &S) -> (u32, u32) {
    let (cw, ch) = surface.container_size();
    let (vw, vh) = surface.viewport_size();
    let width = if cw > 0 { cw } else { vw };
    let height = if ch > 0 { ch } else { vh };
    (width.max(1), height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        assert_eq!(capped_pixel_ratio(1.0), 1.0);
        assert_eq!(capped_pixel_ratio(1.5), 1.5);
        assert_eq!(capped_pixel_ratio(3.0), 2.0);
        assert_eq!(capped_pixel_ratio(0.0), 1.0);
        assert_eq!(capped_pixel_ratio(f64::NAN), 1.0);
    }
}
