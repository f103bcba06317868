use wgpu::util::DeviceExt;

use crate::scene::SceneGraph;

/// Scene lights as seen by the cube shader.
/// NOTE: Must match the WGSL `Lighting` struct layout exactly (48 bytes)
///
/// WGSL layout:
///   ambient: vec4<f32>      (offset 0)  rgb = color * intensity
///   light_dir: vec4<f32>    (offset 16) xyz = unit vector toward the light
///   light_color: vec4<f32>  (offset 32) rgb = color * intensity
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    /// Linear ambient radiance.
    pub ambient: [f32; 4],
    /// Direction from a surface toward the directional light.
    pub light_dir: [f32; 4],
    /// Linear directional radiance.
    pub light_color: [f32; 4],
}

fn scaled(rgb: [f32; 3], intensity: f32) -> [f32; 4] {
    [rgb[0] * intensity, rgb[1] * intensity, rgb[2] * intensity, 0.0]
}

impl LightingUniform {
    /// Pack the ambient and directional light of `scene`.
    #[must_use]
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let ambient = scene.ambient();
        let directional = scene.directional();
        let dir = directional.direction();
        Self {
            ambient: scaled(ambient.color.to_linear_f32(), ambient.intensity),
            light_dir: [dir.x, dir.y, dir.z, 0.0],
            light_color: scaled(
                directional.color.to_linear_f32(),
                directional.intensity,
            ),
        }
    }
}

/// Lighting uniform buffer and its bind group (group 1 of the cube
/// pipeline).
pub struct Lighting {
    /// CPU copy of the last uploaded uniform.
    pub uniform: LightingUniform,
    /// Uniform buffer.
    pub buffer: wgpu::Buffer,
    /// Bind group layout.
    pub layout: wgpu::BindGroupLayout,
    /// Bind group.
    pub bind_group: wgpu::BindGroup,
}

impl Lighting {
    /// Upload the lights of `scene`.
    #[must_use]
    pub fn new(device: &wgpu::Device, scene: &SceneGraph) -> Self {
        let uniform = LightingUniform::from_scene(scene);
        let buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Lighting Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Lighting Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lighting Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self {
            uniform,
            buffer,
            layout,
            bind_group,
        }
    }

    /// Re-upload if the scene's lights changed.
    pub fn update(&mut self, queue: &wgpu::Queue, scene: &SceneGraph) {
        let next = LightingUniform::from_scene(scene);
        if next != self.uniform {
            self.uniform = next;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[next]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_48_bytes() {
        assert_eq!(size_of::<LightingUniform>(), 48);
    }

    #[test]
    fn default_scene_lights() {
        let uniform = LightingUniform::from_scene(&SceneGraph::new());
        assert!((uniform.ambient[0] - 0.5).abs() < 1e-6);
        assert!((uniform.light_color[1] - 1.8).abs() < 1e-6);
        let dir = glam::Vec3::new(5.0, 10.0, 7.5).normalize();
        assert!((uniform.light_dir[1] - dir.y).abs() < 1e-6);
    }
}
