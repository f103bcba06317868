use glam::Vec3;

use crate::scene::layout::GridLayout;

/// Camera distance and height that keep a whole grid in view.
///
/// `distance = max(width, height) * 0.8 + 10` and
/// `height = max(5, height * 0.3 + 5)`, where width/height are the grid's
/// center-to-center extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFraming {
    /// Distance along +z from the origin.
    pub distance: f32,
    /// Height above the grid center.
    pub height: f32,
}

impl CameraFraming {
    /// Framing for a grid layout.
    #[must_use]
    pub fn for_layout(layout: &GridLayout) -> Self {
        let total_width = layout.total_width();
        let total_height = layout.total_height();
        Self {
            distance: total_width.max(total_height) * 0.8 + 10.0,
            height: (total_height * 0.3 + 5.0).max(5.0),
        }
    }

    /// Eye position `(0, height, distance)`.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, self.height, self.distance)
    }
}
