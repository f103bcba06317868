//! Scene manager: owns the scene graph, camera, rasterizer and cube
//! resources, and reconciles them with incoming settings snapshots.

mod animation;
mod settings;

use glam::Vec3;

pub use self::animation::{FrameOutcome, ROTATION_STEP};
use self::animation::AnimationLoop;
pub use self::settings::{reconcile, ReconcileAction};
use crate::camera::{CameraFraming, PerspectiveCamera, FOVY, ZFAR, ZNEAR};
use crate::error::CubeError;
use crate::renderer::{BoxGeometry, GeometryHandle, Rasterizer};
use crate::scene::layout::GridLayout;
use crate::scene::palette::ColorAssigner;
use crate::scene::{CubeNode, Material, SceneGraph};
use crate::settings::{Color, Settings};
use crate::surface::{
    capped_pixel_ratio, initial_size, DrawingSurface, ResizeWatch,
};
use crate::util::frame_timing::FrameTiming;

/// Owns the scene graph, camera, rasterizer, shared cube geometry and the
/// live cube set for one drawing surface.
///
/// # Lifecycle
///
/// [`new`](Self::new) builds the initial grid, installs a resize watch on
/// the surface's container and schedules the first animation frame. The
/// host then forwards three kinds of events, all on one thread:
///
/// - settings snapshots to [`apply_settings`](Self::apply_settings),
/// - container size reports to [`resize`](Self::resize),
/// - display refresh callbacks to [`frame`](Self::frame).
///
/// [`dispose`](Self::dispose) (also run on drop) cancels the pending frame,
/// disconnects the watch and releases every GPU resource the manager
/// created. The surface itself is borrowed and never released.
pub struct SceneManager<S: DrawingSurface> {
    surface: S,
    rasterizer: S::Rasterizer,
    scene: SceneGraph,
    camera: PerspectiveCamera,
    /// Shared by every cube; `None` once disposed.
    geometry: Option<GeometryHandle>,
    settings: Settings,
    colors: ColorAssigner,
    animation: AnimationLoop<S::Scheduler>,
    resize_watch: Option<S::Watch>,
    frame_timing: FrameTiming,
    disposed: bool,
}

impl<S: DrawingSurface> SceneManager<S> {
    /// Build the scene for `surface` from an initial settings snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::Gpu`] if the surface yields no rendering
    /// context, or the host's error if the resize watch or the first frame
    /// cannot be installed. Anything already created is released.
    #[allow(clippy::future_not_send)]
    pub async fn new(surface: S, settings: Settings) -> Result<Self, CubeError> {
        Self::with_color_assigner(surface, settings, ColorAssigner::new()).await
    }

    /// Like [`new`](Self::new) with an explicit random source for the
    /// `random` scheme.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    #[allow(clippy::future_not_send)]
    pub async fn with_color_assigner(
        surface: S,
        settings: Settings,
        colors: ColorAssigner,
    ) -> Result<Self, CubeError> {
        let (width, height) = initial_size(&surface);
        let mut rasterizer = surface.create_rasterizer(width, height).await?;
        rasterizer.set_size(width, height);
        rasterizer
            .set_pixel_ratio(capped_pixel_ratio(surface.device_pixel_ratio()));

        let camera = PerspectiveCamera::new(
            FOVY,
            width as f32 / height as f32,
            ZNEAR,
            ZFAR,
        );
        let geometry = rasterizer.create_geometry(&BoxGeometry::unit());
        let animation = AnimationLoop::new(surface.frame_scheduler());

        let mut manager = Self {
            surface,
            rasterizer,
            scene: SceneGraph::new(),
            camera,
            geometry: Some(geometry),
            settings: settings.sanitized(),
            colors,
            animation,
            resize_watch: None,
            frame_timing: FrameTiming::new(),
            disposed: false,
        };
        manager.rebuild();

        // On error `manager` drops here and releases what it created.
        manager.resize_watch = Some(manager.surface.watch_resize()?);
        manager.animation.start()?;

        log::info!(
            "scene manager ready: {} cubes at {width}x{height}",
            manager.scene.cube_count()
        );
        Ok(manager)
    }

    // -- Accessors --

    /// The settings snapshot currently applied.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The scene graph.
    #[must_use]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// The camera.
    #[must_use]
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The rasterizer.
    #[must_use]
    pub fn rasterizer(&self) -> &S::Rasterizer {
        &self.rasterizer
    }

    /// The borrowed surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Number of cube nodes in the scene.
    #[must_use]
    pub fn cube_count(&self) -> usize {
        self.scene.cube_count()
    }

    /// Current material color of every cube, in index order.
    #[must_use]
    pub fn cube_colors(&self) -> Vec<Color> {
        self.scene
            .cubes()
            .iter()
            .map(|node| node.material.color)
            .collect()
    }

    /// Smoothed frames per second of the animation task.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.frame_timing.fps()
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // -- Resize --

    /// Apply a container size report. Zero-area reports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed {
            return;
        }
        if width == 0 || height == 0 {
            log::debug!("ignoring degenerate resize {width}x{height}");
            return;
        }
        self.camera.set_aspect(width as f32 / height as f32);
        self.rasterizer.set_size(width, height);
        self.rasterizer.set_pixel_ratio(capped_pixel_ratio(
            self.surface.device_pixel_ratio(),
        ));
        log::debug!("resized to {width}x{height}");
    }

    // -- Cube set --

    /// Replace the cube set with a freshly laid out and colored grid, then
    /// reframe the camera.
    fn rebuild(&mut self) {
        let Some(geometry) = self.geometry else {
            return;
        };
        self.dispose_cubes();

        let layout = GridLayout::new(self.settings.cube_count as usize);
        let scheme = self.settings.color_scheme;
        let single = self.settings.single_color;
        for (index, position) in layout.positions().enumerate() {
            let color = self.colors.color_for(scheme, index, single);
            let handle = self.rasterizer.create_material(color);
            self.scene.add_cube(CubeNode {
                index,
                position,
                rotation: Vec3::ZERO,
                geometry,
                material: Material { handle, color },
            });
        }

        let framing = CameraFraming::for_layout(&layout);
        self.camera.look_at(framing.eye(), Vec3::ZERO);
        log::debug!(
            "rebuilt {} cubes in {} rows, camera at {:?}",
            layout.cube_count(),
            layout.num_rows(),
            framing.eye()
        );
    }

    /// Recompute every cube's color in place.
    fn recolor(&mut self) {
        let scheme = self.settings.color_scheme;
        let single = self.settings.single_color;
        for node in self.scene.cubes_mut() {
            let color = self.colors.color_for(scheme, node.index, single);
            node.material.color = color;
            self.rasterizer.update_material(node.material.handle, color);
        }
    }

    /// Remove every cube from the scene and release its material.
    fn dispose_cubes(&mut self) {
        for node in self.scene.take_cubes() {
            self.rasterizer.dispose_material(node.material.handle);
        }
    }

    // -- Disposal --

    /// Stop the animation task, disconnect the resize watch and release the
    /// cube materials, the shared geometry and the rasterizer. Safe to call
    /// more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.animation.cancel();
        if let Some(mut watch) = self.resize_watch.take() {
            watch.disconnect();
        }
        self.dispose_cubes();
        if let Some(geometry) = self.geometry.take() {
            self.rasterizer.dispose_geometry(geometry);
        }
        self.rasterizer.dispose();
        log::info!("scene manager disposed");
    }
}

impl<S: DrawingSurface> Drop for SceneManager<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
