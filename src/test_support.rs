//! In-memory host used by the scene manager tests.
//!
//! Every fake shares one [`HostLog`] so a test can inspect what the manager
//! asked of the surface, scheduler, watch and rasterizer after the fact.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use crate::camera::PerspectiveCamera;
use crate::engine::SceneManager;
use crate::error::CubeError;
use crate::gpu::render_context::RenderContextError;
use crate::renderer::{
    BoxGeometry, GeometryHandle, MaterialHandle, Rasterizer, RenderError,
};
use crate::scene::palette::ColorAssigner;
use crate::scene::SceneGraph;
use crate::settings::{Color, Settings};
use crate::surface::{DrawingSurface, FrameRequest, FrameScheduler, ResizeWatch};

/// Everything the fakes observed, plus knobs to make them misbehave.
#[derive(Debug)]
pub struct HostLog {
    pub container: (u32, u32),
    pub viewport: (u32, u32),
    pub device_pixel_ratio: f64,
    pub refuse_context: bool,
    pub refuse_frames: bool,
    pub next_render_error: Option<RenderError>,

    pub live_materials: HashMap<MaterialHandle, Color>,
    pub materials_created: usize,
    pub materials_disposed: usize,
    pub material_updates: usize,
    pub geometries_created: usize,
    pub geometries_disposed: usize,
    pub renders: usize,
    pub renders_after_dispose: usize,
    pub size: (u32, u32),
    pub pixel_ratio: f64,
    pub rasterizer_disposed: bool,
    pub rasterizer_dispose_calls: usize,

    pub watching: bool,
    pub pending_frames: Vec<FrameRequest>,
    pub cancelled_frames: Vec<FrameRequest>,

    pub events: Vec<&'static str>,
    next_id: u32,
}

impl Default for HostLog {
    fn default() -> Self {
        Self {
            container: (800, 600),
            viewport: (1280, 720),
            device_pixel_ratio: 1.0,
            refuse_context: false,
            refuse_frames: false,
            next_render_error: None,
            live_materials: HashMap::new(),
            materials_created: 0,
            materials_disposed: 0,
            material_updates: 0,
            geometries_created: 0,
            geometries_disposed: 0,
            renders: 0,
            renders_after_dispose: 0,
            size: (0, 0),
            pixel_ratio: 0.0,
            rasterizer_disposed: false,
            rasterizer_dispose_calls: 0,
            watching: false,
            pending_frames: Vec::new(),
            cancelled_frames: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }
}

impl HostLog {
    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

type Shared = Rc<RefCell<HostLog>>;

/// Handle a test keeps to configure and inspect the fakes.
pub struct TestHost {
    log: Shared,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(HostLog::default())),
        }
    }

    pub fn log(&self) -> Ref<'_, HostLog> {
        self.log.borrow()
    }

    pub fn log_mut(&self) -> RefMut<'_, HostLog> {
        self.log.borrow_mut()
    }

    pub fn set_container(&self, width: u32, height: u32) {
        self.log_mut().container = (width, height);
    }

    pub fn set_pixel_ratio(&self, ratio: f64) {
        self.log_mut().device_pixel_ratio = ratio;
    }

    pub fn surface(&self) -> FakeSurface {
        FakeSurface {
            log: Rc::clone(&self.log),
        }
    }
}

/// Construct a manager over `host` with a fixed random seed.
pub fn build(host: &TestHost, settings: Settings) -> SceneManager<FakeSurface> {
    pollster::block_on(SceneManager::with_color_assigner(
        host.surface(),
        settings,
        ColorAssigner::with_seed(7),
    ))
    .expect("fake host always provides a context")
}

pub struct FakeSurface {
    log: Shared,
}

impl DrawingSurface for FakeSurface {
    type Rasterizer = RecordingRasterizer;
    type Scheduler = ManualScheduler;
    type Watch = FakeWatch;

    fn container_size(&self) -> (u32, u32) {
        self.log.borrow().container
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.log.borrow().viewport
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.log.borrow().device_pixel_ratio
    }

    fn create_rasterizer(
        &self,
        _width: u32,
        _height: u32,
    ) -> impl Future<Output = Result<Self::Rasterizer, CubeError>> {
        let log = Rc::clone(&self.log);
        async move {
            if log.borrow().refuse_context {
                return Err(RenderContextError::UnsupportedSurface.into());
            }
            Ok(RecordingRasterizer { log })
        }
    }

    fn watch_resize(&self) -> Result<Self::Watch, CubeError> {
        let mut log = self.log.borrow_mut();
        log.watching = true;
        log.events.push("watch");
        Ok(FakeWatch {
            log: Rc::clone(&self.log),
            connected: true,
        })
    }

    fn frame_scheduler(&self) -> Self::Scheduler {
        ManualScheduler {
            log: Rc::clone(&self.log),
        }
    }
}

pub struct ManualScheduler {
    log: Shared,
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Result<FrameRequest, CubeError> {
        let mut log = self.log.borrow_mut();
        if log.refuse_frames {
            return Err(CubeError::Scheduler("refused".into()));
        }
        // Requests are only made from inside the previous callback, so any
        // earlier id has already fired.
        log.pending_frames.clear();
        let request = FrameRequest(log.next_id() as i32);
        log.pending_frames.push(request);
        log.events.push("request_frame");
        Ok(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut log = self.log.borrow_mut();
        log.pending_frames.retain(|r| *r != request);
        log.cancelled_frames.push(request);
        log.events.push("cancel_frame");
    }
}

pub struct FakeWatch {
    log: Shared,
    connected: bool,
}

impl ResizeWatch for FakeWatch {
    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        let mut log = self.log.borrow_mut();
        log.watching = false;
        log.events.push("disconnect");
    }
}

pub struct RecordingRasterizer {
    log: Shared,
}

impl Rasterizer for RecordingRasterizer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().size = (width, height);
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.log.borrow_mut().pixel_ratio = ratio;
    }

    fn create_geometry(&mut self, geometry: &BoxGeometry) -> GeometryHandle {
        let (vertices, indices) = geometry.mesh();
        assert_eq!((vertices.len(), indices.len()), (24, 36));
        let mut log = self.log.borrow_mut();
        log.geometries_created += 1;
        log.events.push("create_geometry");
        GeometryHandle(log.next_id())
    }

    fn dispose_geometry(&mut self, _handle: GeometryHandle) {
        let mut log = self.log.borrow_mut();
        log.geometries_disposed += 1;
        log.events.push("dispose_geometry");
    }

    fn create_material(&mut self, color: Color) -> MaterialHandle {
        let mut log = self.log.borrow_mut();
        let handle = MaterialHandle(log.next_id());
        let _ = log.live_materials.insert(handle, color);
        log.materials_created += 1;
        log.events.push("create_material");
        handle
    }

    fn update_material(&mut self, handle: MaterialHandle, color: Color) {
        let mut log = self.log.borrow_mut();
        if let Some(slot) = log.live_materials.get_mut(&handle) {
            *slot = color;
        }
        log.material_updates += 1;
        log.events.push("update_material");
    }

    fn dispose_material(&mut self, handle: MaterialHandle) {
        let mut log = self.log.borrow_mut();
        assert!(
            log.live_materials.remove(&handle).is_some(),
            "material {handle:?} disposed twice"
        );
        log.materials_disposed += 1;
        log.events.push("dispose_material");
    }

    fn render(
        &mut self,
        _scene: &SceneGraph,
        _camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.rasterizer_disposed {
            log.renders_after_dispose += 1;
        }
        if let Some(e) = log.next_render_error.take() {
            return Err(e);
        }
        log.renders += 1;
        log.events.push("render");
        Ok(())
    }

    fn dispose(&mut self) {
        let mut log = self.log.borrow_mut();
        log.rasterizer_disposed = true;
        log.rasterizer_dispose_calls += 1;
        log.events.push("dispose_rasterizer");
    }
}
