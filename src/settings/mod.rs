//! User-adjustable settings snapshots and the observable store that holds
//! them.
//!
//! A [`Settings`] value is an immutable snapshot: the host reads the current
//! one from a [`SettingsStore`] and hands it to
//! [`SceneManager::apply_settings`](crate::engine::SceneManager::apply_settings),
//! which fully replaces the previous snapshot. Snapshots serialize to/from
//! TOML so hosts can seed the initial state from a file.

mod color;
mod store;

pub use color::{Color, ParseColorError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use store::{SettingsStore, SubscriptionId};

use crate::error::CubeError;

/// How cube materials are colored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// A freshly drawn random color per cube, re-drawn on every recolor.
    #[default]
    Random,
    /// Cycle through the fixed rainbow palette by cube index.
    Rainbow,
    /// Every cube uses [`Settings::single_color`].
    Single,
}

impl ColorScheme {
    /// All schemes in UI order.
    pub const ALL: [Self; 3] = [Self::Random, Self::Rainbow, Self::Single];

    /// The scheme after this one, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Random => Self::Rainbow,
            Self::Rainbow => Self::Single,
            Self::Single => Self::Random,
        }
    }

    /// Parse the lowercase scheme name used in TOML and by the web host.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => Some(Self::Random),
            "rainbow" => Some(Self::Rainbow),
            "single" => Some(Self::Single),
            _ => None,
        }
    }
}

/// Snapshot of the user-configurable rendering parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Cube Settings")]
#[serde(default)]
pub struct Settings {
    /// Number of cubes in the grid.
    #[schemars(title = "Number of Cubes", range(min = 1, max = 50), extend("step" = 1))]
    pub cube_count: u32,
    /// Coloring mode.
    #[schemars(title = "Color Scheme")]
    pub color_scheme: ColorScheme,
    /// Color used by [`ColorScheme::Single`].
    #[schemars(title = "Cube Color", with = "String")]
    pub single_color: Color,
    /// Rotation multiplier; each frame advances `0.01 * rotation_speed`
    /// radians per axis.
    #[schemars(title = "Rotation Speed", range(min = 0.0, max = 5.0), extend("step" = 0.1))]
    pub rotation_speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cube_count: 8,
            color_scheme: ColorScheme::Random,
            single_color: Color::from_hex(0x00ff_6b6b),
            rotation_speed: 1.0,
        }
    }
}

impl Settings {
    /// Copy with `cube_count` clamped to at least 1 and `rotation_speed`
    /// clamped to a finite non-negative value.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let rotation_speed = if self.rotation_speed.is_finite() {
            self.rotation_speed.max(0.0)
        } else {
            0.0
        };
        Self {
            cube_count: self.cube_count.max(1),
            rotation_speed,
            ..self
        }
    }

    /// Parse a snapshot from TOML. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::Settings`] on malformed TOML or colors.
    pub fn from_toml_str(content: &str) -> Result<Self, CubeError> {
        toml::from_str(content).map_err(|e| CubeError::Settings(e.to_string()))
    }

    /// Load a snapshot from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CubeError::Io`] if the file cannot be read, or
    /// [`CubeError::Settings`] if it does not parse.
    pub fn load(path: &std::path::Path) -> Result<Self, CubeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Generate JSON Schema describing the UI-exposed settings.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Settings)
    }
}
