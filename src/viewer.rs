//! Standalone cube grid window backed by winit.
//!
//! The window plays the host's part: it is the drawing surface, winit's
//! redraw requests are the frame scheduler, and `Resized` events are the
//! resize watch. Keyboard input edits a [`SettingsStore`] whose snapshots
//! are pushed into the scene manager.
//!
//! ```no_run
//! # use cube_viewer::{Settings, Viewer};
//! Viewer::builder()
//!     .with_settings(Settings::default())
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use rand::Rng;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::engine::{FrameOutcome, SceneManager};
use crate::error::CubeError;
use crate::gpu::GpuRasterizer;
use crate::settings::{Color, ColorScheme, Settings, SettingsStore, SubscriptionId};
use crate::surface::{
    capped_pixel_ratio, DrawingSurface, FrameRequest, FrameScheduler,
    ResizeWatch,
};

/// Upper bound for the cube count keys.
const MAX_KEY_CUBES: u32 = 50;
/// Rotation speed change per `+`/`-` press.
const SPEED_STEP: f32 = 0.25;
/// Upper bound for the speed keys.
const MAX_KEY_SPEED: f32 = 5.0;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    settings: Settings,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            settings: Settings::default(),
            title: "Cube Viewer".into(),
        }
    }

    /// Initial settings snapshot.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            settings: self.settings,
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A standalone window showing the rotating cube grid.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run) to
/// enter the event loop.
pub struct Viewer {
    settings: Settings,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::Viewer`] if the event loop cannot be created or
    /// exits abnormally.
    pub fn run(self) -> Result<(), CubeError> {
        let event_loop =
            EventLoop::new().map_err(|e| CubeError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = ViewerApp {
            window: None,
            shared: Rc::new(WindowShared::default()),
            manager: Rc::new(RefCell::new(None)),
            store: SettingsStore::new(self.settings),
            subscription: None,
            paused_speed: None,
            title: self.title,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| CubeError::Viewer(e.to_string()))
    }
}

// ── Host surface ─────────────────────────────────────────────────────────

/// State the window surface shares with the event handler.
#[derive(Default)]
struct WindowShared {
    pending_frame: Cell<Option<FrameRequest>>,
    next_frame_id: Cell<i32>,
    watching: Cell<bool>,
}

/// A winit window as a [`DrawingSurface`].
pub struct WindowSurface {
    window: Arc<Window>,
    shared: Rc<WindowShared>,
}

impl WindowSurface {
    fn logical_inner_size(&self) -> (u32, u32) {
        let logical = self
            .window
            .inner_size()
            .to_logical::<u32>(self.window.scale_factor());
        (logical.width, logical.height)
    }
}

impl DrawingSurface for WindowSurface {
    type Rasterizer = GpuRasterizer;
    type Scheduler = RedrawScheduler;
    type Watch = WindowResizeWatch;

    fn container_size(&self) -> (u32, u32) {
        self.logical_inner_size()
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.window.current_monitor().map_or((1, 1), |monitor| {
            let logical =
                monitor.size().to_logical::<u32>(monitor.scale_factor());
            (logical.width, logical.height)
        })
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    fn create_rasterizer(
        &self,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Result<Self::Rasterizer, CubeError>> {
        let window = Arc::clone(&self.window);
        let ratio = capped_pixel_ratio(self.device_pixel_ratio());
        async move {
            GpuRasterizer::new(window, (width, height), ratio)
                .await
                .map_err(CubeError::from)
        }
    }

    fn watch_resize(&self) -> Result<Self::Watch, CubeError> {
        self.shared.watching.set(true);
        Ok(WindowResizeWatch {
            shared: Rc::clone(&self.shared),
        })
    }

    fn frame_scheduler(&self) -> Self::Scheduler {
        RedrawScheduler {
            window: Arc::clone(&self.window),
            shared: Rc::clone(&self.shared),
        }
    }
}

/// Schedules frames through `Window::request_redraw`.
pub struct RedrawScheduler {
    window: Arc<Window>,
    shared: Rc<WindowShared>,
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> Result<FrameRequest, CubeError> {
        let id = self.shared.next_frame_id.get().wrapping_add(1);
        self.shared.next_frame_id.set(id);
        let request = FrameRequest(id);
        self.shared.pending_frame.set(Some(request));
        self.window.request_redraw();
        Ok(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.shared.pending_frame.get() == Some(request) {
            self.shared.pending_frame.set(None);
        }
    }
}

/// Gates forwarding of `WindowEvent::Resized` to the manager.
pub struct WindowResizeWatch {
    shared: Rc<WindowShared>,
}

impl ResizeWatch for WindowResizeWatch {
    fn disconnect(&mut self) {
        self.shared.watching.set(false);
    }
}

// ── Key bindings ─────────────────────────────────────────────────────────

/// Settings edits bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    MoreCubes,
    FewerCubes,
    CycleScheme,
    RandomColor,
    Faster,
    Slower,
    TogglePause,
}

fn key_action(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::ArrowUp => Some(KeyAction::MoreCubes),
        KeyCode::ArrowDown => Some(KeyAction::FewerCubes),
        KeyCode::KeyC => Some(KeyAction::CycleScheme),
        KeyCode::KeyS => Some(KeyAction::RandomColor),
        KeyCode::Equal | KeyCode::NumpadAdd => Some(KeyAction::Faster),
        KeyCode::Minus | KeyCode::NumpadSubtract => Some(KeyAction::Slower),
        KeyCode::Space => Some(KeyAction::TogglePause),
        _ => None,
    }
}

/// Apply `action` to the store. `paused_speed` holds the speed to restore
/// while paused.
fn apply_key(
    store: &mut SettingsStore,
    action: KeyAction,
    paused_speed: &mut Option<f32>,
) {
    let current = store.get();
    match action {
        KeyAction::MoreCubes => store
            .set_cube_count((current.cube_count + 1).min(MAX_KEY_CUBES)),
        KeyAction::FewerCubes => {
            store.set_cube_count(current.cube_count.saturating_sub(1).max(1));
        }
        KeyAction::CycleScheme => {
            store.set_color_scheme(current.color_scheme.next());
        }
        KeyAction::RandomColor => {
            let color =
                Color::from_hex(rand::rng().random_range(0..=0x00ff_ffff));
            store.update(|s| {
                s.color_scheme = ColorScheme::Single;
                s.single_color = color;
            });
        }
        KeyAction::Faster | KeyAction::Slower => {
            let delta = if action == KeyAction::Faster {
                SPEED_STEP
            } else {
                -SPEED_STEP
            };
            *paused_speed = None;
            store.set_rotation_speed(
                (current.rotation_speed + delta).clamp(0.0, MAX_KEY_SPEED),
            );
        }
        KeyAction::TogglePause => match paused_speed.take() {
            Some(speed) => store.set_rotation_speed(speed),
            None => {
                *paused_speed = Some(current.rotation_speed);
                store.set_rotation_speed(0.0);
            }
        },
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

type SharedManager = Rc<RefCell<Option<SceneManager<WindowSurface>>>>;

/// Internal winit application handler.
struct ViewerApp {
    window: Option<Arc<Window>>,
    shared: Rc<WindowShared>,
    manager: SharedManager,
    store: SettingsStore,
    subscription: Option<SubscriptionId>,
    paused_speed: Option<f32>,
    title: String,
}

impl ViewerApp {
    fn shutdown(&mut self) {
        if let Some(id) = self.subscription.take() {
            let _ = self.store.unsubscribe(id);
        }
        if let Some(mut manager) = self.manager.borrow_mut().take() {
            manager.dispose();
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let surface = WindowSurface {
            window: Arc::clone(&window),
            shared: Rc::clone(&self.shared),
        };
        let manager = match pollster::block_on(SceneManager::new(
            surface,
            self.store.get(),
        )) {
            Ok(m) => m,
            Err(e) => {
                log::error!("Failed to initialize scene: {e}");
                event_loop.exit();
                return;
            }
        };
        *self.manager.borrow_mut() = Some(manager);

        let manager = Rc::clone(&self.manager);
        self.subscription = Some(self.store.subscribe(move |settings| {
            if let Some(manager) = manager.borrow_mut().as_mut() {
                let _ = manager.apply_settings(*settings);
            }
        }));

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            self.shutdown();
            event_loop.exit();
            return;
        }

        let Some(window) = self.window.clone() else {
            return;
        };

        match event {
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if !self.shared.watching.get() {
                    return;
                }
                let logical = window
                    .inner_size()
                    .to_logical::<u32>(window.scale_factor());
                if let Some(manager) = self.manager.borrow_mut().as_mut() {
                    manager.resize(logical.width, logical.height);
                }
            }

            WindowEvent::RedrawRequested => {
                if self.shared.pending_frame.take().is_none() {
                    return;
                }
                if let Some(manager) = self.manager.borrow_mut().as_mut() {
                    if manager.frame() == FrameOutcome::Stopped {
                        log::warn!(
                            "animation stopped at {:.0} fps",
                            manager.fps()
                        );
                    }
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                if code == KeyCode::Escape {
                    self.shutdown();
                    event_loop.exit();
                    return;
                }
                if let Some(action) = key_action(code) {
                    apply_key(&mut self.store, action, &mut self.paused_speed);
                    log::debug!("{action:?} -> {:?}", self.store.get());
                }
            }

            _ => (),
        }
    }
}
