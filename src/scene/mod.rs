//! Scene graph: background, the two fixed lights, and an ordered arena of
//! cube nodes.
//!
//! Nodes are stored by position index `i` in `[0, cube_count)`. Each node
//! owns a [`Material`] and refers to the one shared geometry, which the
//! scene graph never owns.

pub mod layout;
pub mod palette;

use glam::Vec3;

use crate::renderer::{GeometryHandle, MaterialHandle};
use crate::settings::Color;

/// Default scene background.
pub const BACKGROUND: Color = Color::from_hex(0x001a_1a2e);

/// Uniform light from every direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    /// Light color.
    pub color: Color,
    /// Intensity multiplier.
    pub intensity: f32,
}

/// Light arriving from `position` toward the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Light color.
    pub color: Color,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Light position; the light shines toward the origin.
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector from the origin toward the light.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }
}

/// Per-node material: a GPU handle plus the CPU mirror of its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    /// Rasterizer-side material.
    pub handle: MaterialHandle,
    /// Current base color.
    pub color: Color,
}

/// One renderable cube.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeNode {
    /// Position index in the grid.
    pub index: usize,
    /// World-space center.
    pub position: Vec3,
    /// Euler rotation in radians (x, y, z).
    pub rotation: Vec3,
    /// Shared geometry (not owned).
    pub geometry: GeometryHandle,
    /// Exclusively owned material.
    pub material: Material,
}

/// Everything the rasterizer draws.
pub struct SceneGraph {
    background: Color,
    ambient: AmbientLight,
    directional: DirectionalLight,
    cubes: Vec<CubeNode>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Empty scene with the default background and lights.
    #[must_use]
    pub fn new() -> Self {
        Self {
            background: BACKGROUND,
            ambient: AmbientLight {
                color: Color::WHITE,
                intensity: 0.5,
            },
            directional: DirectionalLight {
                color: Color::WHITE,
                intensity: 1.8,
                position: Vec3::new(5.0, 10.0, 7.5),
            },
            cubes: Vec::new(),
        }
    }

    /// Clear color.
    #[must_use]
    pub fn background(&self) -> Color {
        self.background
    }

    /// Ambient light.
    #[must_use]
    pub fn ambient(&self) -> &AmbientLight {
        &self.ambient
    }

    /// Directional light.
    #[must_use]
    pub fn directional(&self) -> &DirectionalLight {
        &self.directional
    }

    /// Cube nodes in index order.
    #[must_use]
    pub fn cubes(&self) -> &[CubeNode] {
        &self.cubes
    }

    /// Mutable cube nodes in index order.
    pub fn cubes_mut(&mut self) -> &mut [CubeNode] {
        &mut self.cubes
    }

    /// Number of cube nodes.
    #[must_use]
    pub fn cube_count(&self) -> usize {
        self.cubes.len()
    }

    /// Append a node. Its `index` must equal the current count.
    pub fn add_cube(&mut self, node: CubeNode) {
        debug_assert_eq!(node.index, self.cubes.len());
        self.cubes.push(node);
    }

    /// Detach every cube node, handing ownership to the caller.
    pub fn take_cubes(&mut self) -> Vec<CubeNode> {
        std::mem::take(&mut self.cubes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(index: usize) -> CubeNode {
        CubeNode {
            index,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            geometry: GeometryHandle(0),
            material: Material {
                handle: MaterialHandle(index as u32),
                color: Color::WHITE,
            },
        }
    }

    #[test]
    fn new_scene_has_lights_and_no_cubes() {
        let scene = SceneGraph::new();
        assert_eq!(scene.cube_count(), 0);
        assert_eq!(scene.background().hex(), 0x1a1a2e);
        assert_eq!(scene.ambient().intensity, 0.5);
        assert_eq!(scene.directional().intensity, 1.8);
        let dir = scene.directional().direction();
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!(dir.y > 0.0);
    }

    #[test]
    fn take_cubes_empties_the_arena() {
        let mut scene = SceneGraph::new();
        for i in 0..3 {
            scene.add_cube(node(i));
        }
        let taken = scene.take_cubes();
        assert_eq!(taken.len(), 3);
        assert_eq!(taken[2].index, 2);
        assert_eq!(scene.cube_count(), 0);
    }
}
