//! Web-app manifest generation.
//!
//! Maps an [`AppConfig`] onto the `manifest.json` document the device's
//! install mechanism reads. The output always has the four keys an installer
//! requires (`name`, `short_name`, `start_url`, a non-empty `icons` list);
//! optional inputs degrade to `""` or `[]` instead of disappearing.
//!
//! Icons are not configurable: every app references the same seven square PNGs
//! under `/assets/`, which is what the packaging validator checks for.

use crate::config::{
    DEFAULT_BACKGROUND_COLOR, DEFAULT_NAME, DEFAULT_ORIENTATION, DEFAULT_SHORT_NAME,
    DEFAULT_START_URL, DEFAULT_THEME_COLOR,
};
use crate::types::{AppConfig, DisplayMode, Screenshot};
use serde::{Deserialize, Serialize};

/// Square icon sizes every generated manifest references.
pub const ICON_SIZES: [u32; 7] = [72, 96, 128, 144, 152, 192, 512];

/// Dimension string given to every collected screenshot.
pub const SCREENSHOT_SIZES: &str = "544x816";
pub const SCREENSHOT_TYPE: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebManifest {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub scope: String,
    pub display: DisplayMode,
    pub orientation: String,
    pub theme_color: String,
    pub background_color: String,
    pub categories: Vec<String>,
    pub screenshots: Vec<Screenshot>,
    pub icons: Vec<Icon>,
    pub shortcuts: Vec<Shortcut>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub url: String,
    pub icons: Vec<ShortcutIcon>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutIcon {
    pub src: String,
    pub sizes: String,
}

/// `value`, or `fallback` when `value` is blank.
pub(crate) fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

pub(crate) fn icon_src(size: u32) -> String {
    format!("/assets/icon-{size}.png")
}

fn square(size: u32) -> String {
    format!("{size}x{size}")
}

fn standard_icons() -> Vec<Icon> {
    ICON_SIZES
        .iter()
        .map(|&size| Icon {
            src: icon_src(size),
            sizes: square(size),
            mime_type: "image/png".to_string(),
            purpose: "any".to_string(),
        })
        .collect()
}

fn new_task_shortcut() -> Shortcut {
    Shortcut {
        name: "New Task".to_string(),
        short_name: "New Task".to_string(),
        description: "Create a new task".to_string(),
        url: "/new-task".to_string(),
        icons: vec![ShortcutIcon {
            src: icon_src(96),
            sizes: square(96),
        }],
    }
}

/// Build the manifest document for `config`. Never fails.
pub fn generate_manifest(config: &AppConfig) -> WebManifest {
    let categories = config
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| vec![c.to_string()])
        .unwrap_or_default();

    WebManifest {
        name: or_default(&config.name, DEFAULT_NAME).to_string(),
        short_name: or_default(&config.short_name, DEFAULT_SHORT_NAME).to_string(),
        description: config.description.clone(),
        start_url: or_default(&config.start_url, DEFAULT_START_URL).to_string(),
        scope: "/".to_string(),
        display: config.display,
        orientation: or_default(&config.orientation, DEFAULT_ORIENTATION).to_string(),
        theme_color: or_default(&config.theme_color, DEFAULT_THEME_COLOR).to_string(),
        background_color: or_default(&config.background_color, DEFAULT_BACKGROUND_COLOR)
            .to_string(),
        categories,
        screenshots: config.screenshots.clone(),
        icons: standard_icons(),
        shortcuts: vec![new_task_shortcut()],
    }
}

/// Render the manifest as pretty-printed JSON (two-space indent).
pub fn manifest_json(config: &AppConfig) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&generate_manifest(config))
}

/// Turn raw screenshot URLs into manifest descriptors.
///
/// Blank entries are dropped; the rest keep their order and their original
/// (untrimmed) text.
pub fn collect_screenshots<S: AsRef<str>>(urls: &[S]) -> Vec<Screenshot> {
    urls.iter()
        .map(AsRef::as_ref)
        .filter(|url| !url.trim().is_empty())
        .map(|url| Screenshot {
            src: url.to_string(),
            sizes: SCREENSHOT_SIZES.to_string(),
            mime_type: SCREENSHOT_TYPE.to_string(),
        })
        .collect()
}
