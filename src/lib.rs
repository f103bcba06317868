// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! A configurable grid of rotating, lit 3D cubes rendered with wgpu.
//!
//! A [`SceneManager`] owns the scene graph, camera, rasterizer and cube set
//! for one drawing surface. It rebuilds or recolors the grid from
//! [`Settings`] snapshots, follows the surface's container size, spins every
//! cube once per display refresh, and releases all of its GPU resources on
//! [`dispose`](SceneManager::dispose).
//!
//! # Key entry points
//!
//! - [`engine::SceneManager`] - lifecycle, reconciliation and animation
//! - [`settings::SettingsStore`] - observable settings snapshots
//! - [`surface::DrawingSurface`] - what a host provides (canvas, window)
//! - [`renderer::Rasterizer`] - the rendering seam, implemented for wgpu by
//!   [`gpu::GpuRasterizer`]
//!
//! # Hosts
//!
//! The `viewer` feature adds a winit window (`Viewer`); the `web` feature
//! adds a canvas host with a `start(canvas_id)` entry point exported to
//! JavaScript.

pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod surface;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

#[cfg(test)]
mod test_support;

pub use engine::{FrameOutcome, ReconcileAction, SceneManager};
pub use error::CubeError;
pub use settings::{Color, ColorScheme, Settings, SettingsStore};
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
