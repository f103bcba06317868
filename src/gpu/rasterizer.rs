//! wgpu implementation of [`Rasterizer`]: one instanced, depth-tested,
//! lit pipeline drawing every cube node of the scene.

use std::collections::HashMap;

use glam::{EulerRot, Mat4};
use wgpu::util::DeviceExt;

use super::dynamic_buffer::DynamicBuffer;
use super::lighting::Lighting;
use super::render_context::{RenderContext, RenderContextError};
use super::texture::{DepthTarget, DEPTH_FORMAT};
use crate::camera::{CameraUniform, PerspectiveCamera};
use crate::renderer::{
    BoxGeometry, GeometryHandle, MaterialHandle, MeshVertex, Rasterizer,
    RenderError,
};
use crate::scene::SceneGraph;
use crate::settings::Color;

/// Per-cube instance data: model matrix columns and linear base color.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CubeInstance {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// Drawing buffer size in device pixels for a logical size and pixel ratio.
/// Never zero in either dimension.
#[must_use]
pub fn drawing_buffer_size(logical: (u32, u32), ratio: f64) -> (u32, u32) {
    let scale = |v: u32| ((f64::from(v) * ratio).round() as u32).max(1);
    (scale(logical.0), scale(logical.1))
}

/// Contiguous runs of nodes sharing a geometry, as instance ranges.
fn geometry_runs(
    scene: &SceneGraph,
) -> Vec<(GeometryHandle, std::ops::Range<u32>)> {
    let mut runs: Vec<(GeometryHandle, std::ops::Range<u32>)> = Vec::new();
    for (i, node) in scene.cubes().iter().enumerate() {
        let i = i as u32;
        match runs.last_mut() {
            Some((geometry, range)) if *geometry == node.geometry => {
                range.end = i + 1;
            }
            _ => runs.push((node.geometry, i..i + 1)),
        }
    }
    runs
}

/// Rasterizer over a wgpu surface.
pub struct GpuRasterizer {
    context: RenderContext,
    pipeline: wgpu::RenderPipeline,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    lighting: Lighting,
    depth: DepthTarget,
    instances: DynamicBuffer,
    instance_scratch: Vec<CubeInstance>,
    geometries: HashMap<GeometryHandle, GpuMesh>,
    /// Linear RGBA per live material.
    materials: HashMap<MaterialHandle, [f32; 4]>,
    next_handle: u32,
    logical_size: (u32, u32),
    pixel_ratio: f64,
    disposed: bool,
}

impl GpuRasterizer {
    /// Acquire a context for `target` sized `logical_size * pixel_ratio`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderContextError`] if no adapter, device or compatible
    /// surface configuration is available.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        logical_size: (u32, u32),
        pixel_ratio: f64,
    ) -> Result<Self, RenderContextError> {
        let buffer_size = drawing_buffer_size(logical_size, pixel_ratio);
        let context = RenderContext::new(target, buffer_size).await?;
        Ok(Self::from_context(context, logical_size, pixel_ratio))
    }

    /// Build the pipeline on an existing context.
    #[must_use]
    pub fn from_context(
        context: RenderContext,
        logical_size: (u32, u32),
        pixel_ratio: f64,
    ) -> Self {
        let device = &context.device;

        let camera_uniform = CameraUniform::new();
        let camera_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let camera_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX
                        | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let camera_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Camera Bind Group"),
                layout: &camera_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }],
            });

        let lighting = Lighting::new(device, &SceneGraph::new());
        let pipeline = Self::create_pipeline(
            device,
            context.view_format(),
            &camera_layout,
            &lighting.layout,
        );
        let depth = DepthTarget::new(device, context.width(), context.height());
        let instances = DynamicBuffer::new(
            device,
            "Cube Instance Buffer",
            size_of::<CubeInstance>() * 64,
            wgpu::BufferUsages::VERTEX,
        );

        Self {
            context,
            pipeline,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            lighting,
            depth,
            instances,
            instance_scratch: Vec::new(),
            geometries: HashMap::new(),
            materials: HashMap::new(),
            next_handle: 0,
            logical_size,
            pixel_ratio,
            disposed: false,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
        lighting_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::include_wgsl!(
            "../../assets/shaders/cube.wgsl"
        ));

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Cube Pipeline Layout"),
                bind_group_layouts: &[camera_layout, lighting_layout],
                push_constant_ranges: &[],
            });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: size_of::<MeshVertex>()
                as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0, // position
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1, // normal
                },
            ],
        };

        // 4x4 model matrix as four vec4 columns, then color
        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: size_of::<CubeInstance>()
                as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 0,
                    shader_location: 2,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 16,
                    shader_location: 3,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 32,
                    shader_location: 4,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 48,
                    shader_location: 5,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 64,
                    shader_location: 6, // color
                },
            ],
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout, instance_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Current drawing buffer size in device pixels.
    #[must_use]
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (self.context.width(), self.context.height())
    }

    /// Logical size last passed to [`Rasterizer::set_size`].
    #[must_use]
    pub fn logical_size(&self) -> (u32, u32) {
        self.logical_size
    }

    /// Number of live materials.
    #[must_use]
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    fn allocate_handle(&mut self) -> u32 {
        let id = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        id
    }

    /// Resize the surface and depth target if the drawing buffer changed.
    fn apply_drawing_buffer(&mut self) {
        let (width, height) =
            drawing_buffer_size(self.logical_size, self.pixel_ratio);
        if (width, height) == self.drawing_buffer_size() {
            return;
        }
        self.context.resize(width, height);
        self.depth.texture.destroy();
        self.depth = DepthTarget::new(&self.context.device, width, height);
        log::debug!("drawing buffer {width}x{height}");
    }

    fn upload_frame_state(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) {
        self.camera_uniform.update_view_proj(camera);
        self.context.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
        self.lighting.update(&self.context.queue, scene);

        self.instance_scratch.clear();
        for node in scene.cubes() {
            let model = Mat4::from_translation(node.position)
                * Mat4::from_euler(
                    EulerRot::XYZ,
                    node.rotation.x,
                    node.rotation.y,
                    node.rotation.z,
                );
            let color = self
                .materials
                .get(&node.material.handle)
                .copied()
                .unwrap_or([1.0, 0.0, 1.0, 1.0]);
            self.instance_scratch.push(CubeInstance {
                model: model.to_cols_array_2d(),
                color,
            });
        }
        let _ = self.instances.write(
            &self.context.device,
            &self.context.queue,
            &self.instance_scratch,
        );
    }

    fn acquire_frame(&self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.context.get_next_frame() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                self.context.reconfigure();
                Err(RenderError::Reconfigured)
            }
            Err(wgpu::SurfaceError::Timeout) => Err(RenderError::Timeout),
            Err(e) => Err(RenderError::Fatal(e.to_string())),
        }
    }
}

impl Rasterizer for GpuRasterizer {
    fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.logical_size = (width, height);
        self.apply_drawing_buffer();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = ratio;
        self.apply_drawing_buffer();
    }

    fn create_geometry(&mut self, geometry: &BoxGeometry) -> GeometryHandle {
        let (vertices, indices) = geometry.mesh();
        let device = &self.context.device;
        let vertex_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Cube Index Buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let handle = GeometryHandle(self.allocate_handle());
        let _ = self.geometries.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: indices.len() as u32,
            },
        );
        handle
    }

    fn dispose_geometry(&mut self, handle: GeometryHandle) {
        if let Some(mesh) = self.geometries.remove(&handle) {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
    }

    fn create_material(&mut self, color: Color) -> MaterialHandle {
        let handle = MaterialHandle(self.allocate_handle());
        let [r, g, b] = color.to_linear_f32();
        let _ = self.materials.insert(handle, [r, g, b, 1.0]);
        handle
    }

    fn update_material(&mut self, handle: MaterialHandle, color: Color) {
        if let Some(slot) = self.materials.get_mut(&handle) {
            let [r, g, b] = color.to_linear_f32();
            *slot = [r, g, b, 1.0];
        }
    }

    fn dispose_material(&mut self, handle: MaterialHandle) {
        let _ = self.materials.remove(&handle);
    }

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Fatal("rasterizer disposed".into()));
        }
        self.upload_frame_state(scene, camera);
        let frame = self.acquire_frame()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.context.view_format()),
            ..Default::default()
        });

        let [r, g, b] = scene.background().to_linear_f32();
        let mut encoder = self.context.create_encoder();
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Cube Pass"),
                    color_attachments: &[Some(
                        wgpu::RenderPassColorAttachment {
                            view: &view,
                            depth_slice: None,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: f64::from(r),
                                    g: f64::from(g),
                                    b: f64::from(b),
                                    a: 1.0,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                        },
                    )],
                    depth_stencil_attachment: Some(
                        wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Discard,
                            }),
                            stencil_ops: None,
                        },
                    ),
                    ..Default::default()
                });

            if !self.instance_scratch.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.camera_bind_group, &[]);
                pass.set_bind_group(1, &self.lighting.bind_group, &[]);
                pass.set_vertex_buffer(1, self.instances.buffer().slice(..));
                for (geometry, range) in geometry_runs(scene) {
                    let Some(mesh) = self.geometries.get(&geometry) else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(
                        mesh.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    pass.draw_indexed(0..mesh.index_count, 0, range);
                }
            }
        }
        self.context.submit(encoder);
        frame.present();
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for (_, mesh) in self.geometries.drain() {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
        self.materials.clear();
        self.instances.buffer().destroy();
        self.camera_buffer.destroy();
        self.lighting.buffer.destroy();
        self.depth.texture.destroy();
        log::debug!("gpu rasterizer disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_buffer_scales_and_rounds() {
        assert_eq!(drawing_buffer_size((800, 600), 1.0), (800, 600));
        assert_eq!(drawing_buffer_size((800, 600), 2.0), (1600, 1200));
        assert_eq!(drawing_buffer_size((333, 101), 1.5), (500, 152));
        assert_eq!(drawing_buffer_size((1, 1), 0.25), (1, 1));
    }

    #[test]
    fn instance_stride_matches_layout() {
        assert_eq!(size_of::<CubeInstance>(), 80);
    }

    #[test]
    fn runs_group_shared_geometry() {
        use crate::scene::{CubeNode, Material};
        let mut scene = SceneGraph::new();
        for index in 0..5 {
            scene.add_cube(CubeNode {
                index,
                position: glam::Vec3::ZERO,
                rotation: glam::Vec3::ZERO,
                geometry: GeometryHandle(if index < 3 { 0 } else { 9 }),
                material: Material {
                    handle: MaterialHandle(index as u32),
                    color: Color::WHITE,
                },
            });
        }
        assert_eq!(
            geometry_runs(&scene),
            vec![(GeometryHandle(0), 0..3), (GeometryHandle(9), 3..5)]
        );
    }
}
