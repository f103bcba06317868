//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the cube-viewer crate.
#[derive(Debug)]
pub enum CubeError {
    /// No usable rendering context could be created for the surface.
    Gpu(RenderContextError),
    /// The host refused to schedule an animation frame.
    Scheduler(String),
    /// Settings TOML or color parsing failure.
    Settings(String),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Native viewer event-loop failure.
    Viewer(String),
    /// Browser host failure (missing canvas, DOM call rejected).
    Web(String),
}

impl fmt::Display for CubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Scheduler(msg) => {
                write!(f, "frame scheduling failed: {msg}")
            }
            Self::Settings(msg) => write!(f, "settings error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
            Self::Web(msg) => write!(f, "web host error: {msg}"),
        }
    }
}

impl std::error::Error for CubeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for CubeError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for CubeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<crate::settings::ParseColorError> for CubeError {
    fn from(e: crate::settings::ParseColorError) -> Self {
        Self::Settings(e.to_string())
    }
}
