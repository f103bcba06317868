//! GPU resource management.
//!
//! wgpu device/surface initialization, growable buffers, the depth target,
//! the lighting uniform, and the [`GpuRasterizer`] that ties them together.

/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// Lighting uniform derived from the scene lights.
pub mod lighting;
/// The wgpu [`Rasterizer`](crate::renderer::Rasterizer) implementation.
pub mod rasterizer;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Depth attachment.
pub mod texture;

pub use rasterizer::GpuRasterizer;
