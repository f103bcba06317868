//! Per-frame animation task for [`SceneManager`].

use std::f32::consts::TAU;

use super::SceneManager;
use crate::error::CubeError;
use crate::renderer::Rasterizer;
use crate::surface::{DrawingSurface, FrameRequest, FrameScheduler};

/// Radians added to each cube's x and y rotation per frame at speed 1.
pub const ROTATION_STEP: f32 = 0.01;

/// Result of one [`SceneManager::frame`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The scene was advanced and drawn; another frame is pending.
    Rendered,
    /// The scene was advanced but the surface skipped this frame.
    Skipped,
    /// The task is stopped; no frame is pending.
    Stopped,
}

/// The self-rescheduling frame task and its pending request.
pub(super) struct AnimationLoop<F: FrameScheduler> {
    scheduler: F,
    pending: Option<FrameRequest>,
    cancelled: bool,
}

impl<F: FrameScheduler> AnimationLoop<F> {
    pub(super) fn new(scheduler: F) -> Self {
        Self {
            scheduler,
            pending: None,
            cancelled: false,
        }
    }

    /// Schedule the first frame.
    pub(super) fn start(&mut self) -> Result<(), CubeError> {
        self.cancelled = false;
        self.schedule()
    }

    fn schedule(&mut self) -> Result<(), CubeError> {
        if self.cancelled {
            return Ok(());
        }
        self.pending = Some(self.scheduler.request_frame()?);
        Ok(())
    }

    /// Mark the pending request as fired. Returns false once cancelled.
    fn begin_frame(&mut self) -> bool {
        let _ = self.pending.take();
        !self.cancelled
    }

    /// Cancel the pending request and stop rescheduling.
    pub(super) fn cancel(&mut self) {
        self.cancelled = true;
        if let Some(request) = self.pending.take() {
            self.scheduler.cancel_frame(request);
        }
    }

    pub(super) fn is_running(&self) -> bool {
        !self.cancelled && self.pending.is_some()
    }
}

impl<S: DrawingSurface> SceneManager<S> {
    /// Run one animation frame: schedule the next one, advance every cube's
    /// rotation by `ROTATION_STEP * rotation_speed` and render.
    ///
    /// The host calls this when a scheduled frame fires. After
    /// [`dispose`](Self::dispose) it does nothing and returns
    /// [`FrameOutcome::Stopped`]. A fatal render error also stops the task.
    pub fn frame(&mut self) -> FrameOutcome {
        if self.disposed || !self.animation.begin_frame() {
            return FrameOutcome::Stopped;
        }
        if let Err(e) = self.animation.schedule() {
            log::error!("failed to schedule next frame: {e}");
            self.animation.cancel();
            return FrameOutcome::Stopped;
        }

        let step = ROTATION_STEP * self.settings.rotation_speed;
        for node in self.scene.cubes_mut() {
            // Kept within one turn so the f32 step never rounds away.
            node.rotation.x = (node.rotation.x + step).rem_euclid(TAU);
            node.rotation.y = (node.rotation.y + step).rem_euclid(TAU);
        }

        match self.rasterizer.render(&self.scene, &self.camera) {
            Ok(()) => {
                self.frame_timing.end_frame();
                FrameOutcome::Rendered
            }
            Err(e) if e.is_recoverable() => {
                log::debug!("frame skipped: {e}");
                FrameOutcome::Skipped
            }
            Err(e) => {
                log::error!("render failed, stopping animation: {e}");
                self.animation.cancel();
                FrameOutcome::Stopped
            }
        }
    }

    /// Whether a frame is pending.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.disposed && self.animation.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderError;
    use crate::settings::Settings;
    use crate::test_support::{build, TestHost};

    #[test]
    fn frame_rotates_and_reschedules() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        let first = host.log().pending_frames.clone();

        assert_eq!(manager.frame(), FrameOutcome::Rendered);
        assert!(manager.is_animating());

        let log = host.log();
        assert_eq!(log.renders, 1);
        assert_eq!(log.pending_frames.len(), 1);
        assert_ne!(log.pending_frames, first);
        drop(log);

        for node in manager.scene().cubes() {
            assert!((node.rotation.x - ROTATION_STEP).abs() < 1e-6);
            assert!((node.rotation.y - ROTATION_STEP).abs() < 1e-6);
            assert_eq!(node.rotation.z, 0.0);
        }
    }

    #[test]
    fn rotation_scales_with_speed() {
        let host = TestHost::new();
        let mut manager = build(
            &host,
            Settings {
                rotation_speed: 2.5,
                ..Settings::default()
            },
        );
        for _ in 0..4 {
            let _ = manager.frame();
        }
        let expected = 4.0 * ROTATION_STEP * 2.5;
        for node in manager.scene().cubes() {
            assert!((node.rotation.x - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_speed_freezes_but_keeps_rendering() {
        let host = TestHost::new();
        let mut manager = build(
            &host,
            Settings {
                rotation_speed: 0.0,
                ..Settings::default()
            },
        );
        for _ in 0..3 {
            assert_eq!(manager.frame(), FrameOutcome::Rendered);
        }
        assert_eq!(host.log().renders, 3);
        assert!(manager
            .scene()
            .cubes()
            .iter()
            .all(|n| n.rotation == glam::Vec3::ZERO));
    }

    #[test]
    fn speed_change_applies_to_next_frame() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        let _ = manager.frame();
        let _ = manager.apply_settings(Settings {
            rotation_speed: 3.0,
            ..Settings::default()
        });
        let _ = manager.frame();
        let expected = ROTATION_STEP + 3.0 * ROTATION_STEP;
        let x = manager.scene().cubes()[0].rotation.x;
        assert!((x - expected).abs() < 1e-6);
    }

    #[test]
    fn rotation_keeps_advancing_after_long_run() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        manager.scene.cubes_mut()[0].rotation.x = 262_144.0;
        manager.scene.cubes_mut()[0].rotation.y = TAU - 0.5 * ROTATION_STEP;

        let _ = manager.frame();
        let first = manager.scene().cubes()[0].rotation;
        assert!((0.0..TAU).contains(&first.x));
        assert!((first.y - 0.5 * ROTATION_STEP).abs() < 1e-5);

        let _ = manager.frame();
        let second = manager.scene().cubes()[0].rotation;
        assert!((second.x - first.x - ROTATION_STEP).abs() < 1e-5);
        assert!((second.y - first.y - ROTATION_STEP).abs() < 1e-5);
    }

    #[test]
    fn frame_after_dispose_does_nothing() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        manager.dispose();

        assert_eq!(manager.frame(), FrameOutcome::Stopped);
        assert!(!manager.is_animating());
        let log = host.log();
        assert_eq!(log.renders, 0);
        assert_eq!(log.renders_after_dispose, 0);
        assert!(log.pending_frames.is_empty());
    }

    #[test]
    fn recoverable_error_skips_frame() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        host.log_mut().next_render_error = Some(RenderError::Reconfigured);

        assert_eq!(manager.frame(), FrameOutcome::Skipped);
        assert!(manager.is_animating());
        assert_eq!(manager.frame(), FrameOutcome::Rendered);
    }

    #[test]
    fn fatal_error_stops_task() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        host.log_mut().next_render_error =
            Some(RenderError::Fatal("device lost".into()));

        assert_eq!(manager.frame(), FrameOutcome::Stopped);
        assert!(!manager.is_animating());
        assert!(host.log().pending_frames.is_empty());
        assert_eq!(manager.frame(), FrameOutcome::Stopped);
    }

    #[test]
    fn scheduler_refusal_stops_task() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        host.log_mut().refuse_frames = true;
        assert_eq!(manager.frame(), FrameOutcome::Stopped);
        assert_eq!(host.log().renders, 0);
    }

    #[test]
    fn fps_counts_rendered_frames() {
        let host = TestHost::new();
        let mut manager = build(&host, Settings::default());
        let _ = manager.frame();
        let _ = manager.frame();
        assert_eq!(manager.frame_timing.frames(), 2);
        assert!(manager.fps().is_finite());
    }
}
