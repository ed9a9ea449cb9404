//! Shared types consumed by the generator and the reference worker.
//!
//! [`AppConfig`] is the already-validated record the generator works from. It
//! is built once from the project file (see [`config`](crate::config)) and
//! never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Web-app display mode, serialized with the manifest's kebab-case spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    Fullscreen,
    #[default]
    Standalone,
    MinimalUi,
    Browser,
}

impl DisplayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Fullscreen => "fullscreen",
            DisplayMode::Standalone => "standalone",
            DisplayMode::MinimalUi => "minimal-ui",
            DisplayMode::Browser => "browser",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One screenshot reference as it appears in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshot {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Everything the generator needs to know about an app.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: DisplayMode,
    pub orientation: String,
    pub theme_color: String,
    pub background_color: String,
    /// Single store category; `None` produces an empty `categories` list.
    pub category: Option<String>,
    /// Ordered, already-collected screenshot descriptors.
    pub screenshots: Vec<Screenshot>,
}
