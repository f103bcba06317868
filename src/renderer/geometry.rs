use glam::Vec3;

/// Vertex of a mesh: position and face normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Outward unit normal.
    pub normal: [f32; 3],
}

/// Axis-aligned box centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxGeometry {
    /// Edge lengths along x, y, z.
    pub size: Vec3,
}

impl Default for BoxGeometry {
    fn default() -> Self {
        Self::unit()
    }
}

impl BoxGeometry {
    /// 1 x 1 x 1 cube.
    #[must_use]
    pub fn unit() -> Self {
        Self { size: Vec3::ONE }
    }

    /// Build flat-shaded triangles: four vertices per face so every face
    /// keeps its own normal, 24 vertices and 36 indices in total.
    #[must_use]
    pub fn mesh(&self) -> (Vec<MeshVertex>, Vec<u32>) {
        let h = self.size * 0.5;
        // (normal, tangent u, tangent v); u x v == normal gives CCW winding
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            {
                let p = (normal + u * su + v * sv) * h;
                vertices.push(MeshVertex {
                    position: p.to_array(),
                    normal: normal.to_array(),
                });
            }
            indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base,
                base + 2,
                base + 3,
            ]);
        }
        (vertices, indices)
    }
}
