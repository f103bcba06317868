//! Browser host: a canvas element as the drawing surface.
//!
//! The canvas's parent element is the container: it is measured for the
//! initial size and observed with a `ResizeObserver`. Frames are driven by
//! `requestAnimationFrame`. JavaScript receives a [`CubeViewerHandle`] from
//! [`start`] and edits settings through it.
//!
//! ```js
//! import init, { start } from "./cube_viewer.js";
//! await init();
//! const viewer = await start("scene");
//! viewer.set_cube_count(30);
//! viewer.set_color_scheme("rainbow");
//! // ...
//! viewer.dispose();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, ResizeObserver, ResizeObserverEntry};

use crate::camera::PerspectiveCamera;
use crate::engine::SceneManager;
use crate::error::CubeError;
use crate::gpu::GpuRasterizer;
use crate::renderer::{
    BoxGeometry, GeometryHandle, MaterialHandle, Rasterizer, RenderError,
};
use crate::scene::SceneGraph;
use crate::settings::{
    Color, ColorScheme, Settings, SettingsStore, SubscriptionId,
};
use crate::surface::{
    capped_pixel_ratio, DrawingSurface, FrameRequest, FrameScheduler,
    ResizeWatch,
};

type ManagerCell = Rc<RefCell<Option<SceneManager<CanvasSurface>>>>;
type FrameCallback = Closure<dyn FnMut(f64)>;
type ResizeCallback = Closure<dyn FnMut(js_sys::Array, ResizeObserver)>;

fn web_error(value: &JsValue) -> CubeError {
    CubeError::Web(format!("{value:?}"))
}

fn js_function<T: ?Sized>(closure: &Closure<T>) -> &js_sys::Function {
    closure.as_ref().unchecked_ref()
}

fn js_error(e: impl fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Run `f` on the live manager behind `cell`, if any. Re-entrant calls are
/// dropped with a warning.
fn with_manager(
    cell: &Weak<RefCell<Option<SceneManager<CanvasSurface>>>>,
    f: impl FnOnce(&mut SceneManager<CanvasSurface>),
) {
    let Some(cell) = cell.upgrade() else {
        return;
    };
    let Ok(mut guard) = cell.try_borrow_mut() else {
        log::warn!("scene manager busy, dropping callback");
        return;
    };
    if let Some(manager) = guard.as_mut() {
        f(manager);
    }
}

// ── Surface ──────────────────────────────────────────────────────────────

/// A canvas element and its parent container.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    window: web_sys::Window,
    on_frame: Rc<FrameCallback>,
    on_resize: Rc<ResizeCallback>,
}

impl DrawingSurface for CanvasSurface {
    type Rasterizer = CanvasRasterizer;
    type Scheduler = AnimationFrameScheduler;
    type Watch = ObserverWatch;

    fn container_size(&self) -> (u32, u32) {
        self.canvas.parent_element().map_or((0, 0), |parent| {
            (
                parent.client_width().max(0) as u32,
                parent.client_height().max(0) as u32,
            )
        })
    }

    fn viewport_size(&self) -> (u32, u32) {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
        };
        (
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    fn create_rasterizer(
        &self,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Result<Self::Rasterizer, CubeError>> {
        let canvas = self.canvas.clone();
        let ratio = capped_pixel_ratio(self.device_pixel_ratio());
        async move {
            let inner = GpuRasterizer::new(
                wgpu::SurfaceTarget::Canvas(canvas.clone()),
                (width, height),
                ratio,
            )
            .await?;
            let mut rasterizer = CanvasRasterizer { inner, canvas };
            rasterizer.sync_canvas();
            Ok(rasterizer)
        }
    }

    fn watch_resize(&self) -> Result<Self::Watch, CubeError> {
        let parent = self
            .canvas
            .parent_element()
            .ok_or_else(|| CubeError::Web("canvas has no parent".into()))?;
        let observer =
            ResizeObserver::new(js_function(&self.on_resize))
                .map_err(|e| web_error(&e))?;
        observer.observe(&parent);
        Ok(ObserverWatch {
            observer: Some(observer),
        })
    }

    fn frame_scheduler(&self) -> Self::Scheduler {
        AnimationFrameScheduler {
            window: self.window.clone(),
            callback: Rc::clone(&self.on_frame),
        }
    }
}

/// `requestAnimationFrame` / `cancelAnimationFrame`.
pub struct AnimationFrameScheduler {
    window: web_sys::Window,
    callback: Rc<FrameCallback>,
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self) -> Result<FrameRequest, CubeError> {
        self.window
            .request_animation_frame(js_function(&self.callback))
            .map(FrameRequest)
            .map_err(|e| CubeError::Scheduler(format!("{e:?}")))
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let _ = self.window.cancel_animation_frame(request.0);
    }
}

/// A `ResizeObserver` on the canvas's parent.
pub struct ObserverWatch {
    observer: Option<ResizeObserver>,
}

impl ResizeWatch for ObserverWatch {
    fn disconnect(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}

/// [`GpuRasterizer`] that also keeps the canvas backing store sized to the
/// drawing buffer. The canvas's CSS size is left to the page.
pub struct CanvasRasterizer {
    inner: GpuRasterizer,
    canvas: HtmlCanvasElement,
}

impl CanvasRasterizer {
    fn sync_canvas(&mut self) {
        let (width, height) = self.inner.drawing_buffer_size();
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }
}

impl Rasterizer for CanvasRasterizer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.inner.set_size(width, height);
        self.sync_canvas();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.inner.set_pixel_ratio(ratio);
        self.sync_canvas();
    }

    fn create_geometry(&mut self, geometry: &BoxGeometry) -> GeometryHandle {
        self.inner.create_geometry(geometry)
    }

    fn dispose_geometry(&mut self, handle: GeometryHandle) {
        self.inner.dispose_geometry(handle);
    }

    fn create_material(&mut self, color: Color) -> MaterialHandle {
        self.inner.create_material(color)
    }

    fn update_material(&mut self, handle: MaterialHandle, color: Color) {
        self.inner.update_material(handle, color);
    }

    fn dispose_material(&mut self, handle: MaterialHandle) {
        self.inner.dispose_material(handle);
    }

    fn render(
        &mut self,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> Result<(), RenderError> {
        self.inner.render(scene, camera)
    }

    fn dispose(&mut self) {
        self.inner.dispose();
    }
}

// ── JS entry points ──────────────────────────────────────────────────────

/// Build a cube grid on the canvas with id `canvas_id`.
///
/// # Errors
///
/// Rejects if the element is missing or not a canvas, or if no rendering
/// context can be created for it.
#[wasm_bindgen]
pub async fn start(canvas_id: String) -> Result<CubeViewerHandle, JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let window =
        web_sys::window().ok_or_else(|| js_error("no global window"))?;
    let canvas = window
        .document()
        .and_then(|doc| doc.get_element_by_id(&canvas_id))
        .ok_or_else(|| js_error(format!("no element #{canvas_id}")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error(format!("#{canvas_id} is not a canvas")))?;

    let manager: ManagerCell = Rc::new(RefCell::new(None));

    let weak = Rc::downgrade(&manager);
    let on_frame = FrameCallback::new(move |_timestamp: f64| {
        with_manager(&weak, |m| {
            let _ = m.frame();
        });
    });

    let weak = Rc::downgrade(&manager);
    let on_resize = ResizeCallback::new(
        move |entries: js_sys::Array, _observer: ResizeObserver| {
            for entry in entries.iter() {
                let entry: ResizeObserverEntry = entry.unchecked_into();
                let rect = entry.content_rect();
                let width = rect.width().round().max(0.0) as u32;
                let height = rect.height().round().max(0.0) as u32;
                with_manager(&weak, |m| m.resize(width, height));
            }
        },
    );

    let surface = CanvasSurface {
        canvas,
        window,
        on_frame: Rc::new(on_frame),
        on_resize: Rc::new(on_resize),
    };
    let settings = Settings::default();
    let built = SceneManager::new(surface, settings).await.map_err(js_error)?;
    *manager.borrow_mut() = Some(built);

    let mut store = SettingsStore::new(settings);
    let weak = Rc::downgrade(&manager);
    let subscription = store.subscribe(move |snapshot| {
        with_manager(&weak, |m| {
            let _ = m.apply_settings(*snapshot);
        });
    });

    Ok(CubeViewerHandle {
        manager,
        store,
        subscription: Some(subscription),
    })
}

/// JavaScript handle to a running cube grid.
#[wasm_bindgen]
pub struct CubeViewerHandle {
    manager: ManagerCell,
    store: SettingsStore,
    subscription: Option<SubscriptionId>,
}

#[wasm_bindgen]
impl CubeViewerHandle {
    /// Set the number of cubes.
    pub fn set_cube_count(&mut self, count: u32) {
        self.store.set_cube_count(count);
    }

    /// Set the color scheme by name (`random`, `rainbow`, `single`).
    ///
    /// # Errors
    ///
    /// Throws on an unknown scheme name.
    pub fn set_color_scheme(&mut self, name: &str) -> Result<(), JsValue> {
        let scheme = ColorScheme::from_name(name)
            .ok_or_else(|| js_error(format!("unknown color scheme {name:?}")))?;
        self.store.set_color_scheme(scheme);
        Ok(())
    }

    /// Set the single color from a CSS hex string such as `#00ff00`.
    ///
    /// # Errors
    ///
    /// Throws on a malformed color.
    pub fn set_single_color(&mut self, color: &str) -> Result<(), JsValue> {
        let color: Color = color.parse().map_err(js_error)?;
        self.store.set_single_color(color);
        Ok(())
    }

    /// Set the rotation speed multiplier.
    pub fn set_rotation_speed(&mut self, speed: f32) {
        self.store.set_rotation_speed(speed);
    }

    /// Current settings as JSON.
    ///
    /// # Errors
    ///
    /// Throws if serialization fails.
    pub fn settings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.store.get()).map_err(js_error)
    }

    /// JSON schema of the settings, for building controls.
    ///
    /// # Errors
    ///
    /// Throws if serialization fails.
    pub fn settings_schema(&self) -> Result<String, JsValue> {
        serde_json::to_string(&Settings::json_schema()).map_err(js_error)
    }

    /// Smoothed frames per second.
    #[must_use]
    pub fn fps(&self) -> f32 {
        self.manager.borrow().as_ref().map_or(0.0, SceneManager::fps)
    }

    /// Stop animating and release every resource. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(id) = self.subscription.take() {
            let _ = self.store.unsubscribe(id);
        }
        let taken = self.manager.borrow_mut().take();
        if let Some(mut manager) = taken {
            manager.dispose();
        }
    }
}

impl Drop for CubeViewerHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}
