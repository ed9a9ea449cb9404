//! Project configuration module.
//!
//! App fields and worker parameters live in a `pwa.toml` project file. Stock
//! defaults are overridden by whatever the file specifies, so a file only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [app]
//! name = "My App"
//! short_name = "app"             # Also drives the cache name (see naming)
//! description = ""
//! start_url = "/"
//! display = "standalone"         # fullscreen | standalone | minimal-ui | browser
//! orientation = "any"
//! theme_color = "#2196F3"
//! background_color = "#ffffff"
//! category = ""                  # Empty = no categories in the manifest
//! screenshots = []               # URLs; blank entries are ignored
//!
//! [worker]
//! cache_version = 1              # The N in "<slug>-v<N>"
//! app_shell = ["/", "/index.html", "/manifest.json", "/styles/main.css", "/js/app.js"]
//! offline_fallback = "/index.html"
//! update_interval_ms = 60000     # How often the page asks for a worker update
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::manifest::collect_screenshots;
use crate::types::{AppConfig, DisplayMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

pub const DEFAULT_NAME: &str = "My App";
pub const DEFAULT_SHORT_NAME: &str = "app";
pub const DEFAULT_START_URL: &str = "/";
pub const DEFAULT_ORIENTATION: &str = "any";
pub const DEFAULT_THEME_COLOR: &str = "#2196F3";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

/// Project configuration loaded from `pwa.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Fields describing the app itself.
    pub app: AppSettings,
    /// Parameters of the offline caching policy.
    pub worker: WorkerSettings,
}

impl ProjectConfig {
    /// Validate values the type system can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let worker = &self.worker;
        if worker.cache_version == 0 {
            return Err(ConfigError::Validation(
                "worker.cache_version must be at least 1".into(),
            ));
        }
        if worker.app_shell.is_empty() {
            return Err(ConfigError::Validation(
                "worker.app_shell must not be empty".into(),
            ));
        }
        if let Some(bad) = worker.app_shell.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Validation(format!(
                "worker.app_shell entries must start with '/': {bad:?}"
            )));
        }
        if !worker.offline_fallback.starts_with('/') {
            return Err(ConfigError::Validation(
                "worker.offline_fallback must start with '/'".into(),
            ));
        }
        if worker.update_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "worker.update_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Build the generator's input record from the `[app]` table.
    pub fn app_config(&self) -> AppConfig {
        let app = &self.app;
        let category = app.category.trim();
        AppConfig {
            name: app.name.clone(),
            short_name: app.short_name.clone(),
            description: app.description.clone(),
            start_url: app.start_url.clone(),
            display: app.display,
            orientation: app.orientation.clone(),
            theme_color: app.theme_color.clone(),
            background_color: app.background_color.clone(),
            category: (!category.is_empty()).then(|| category.to_string()),
            screenshots: collect_screenshots(&app.screenshots),
        }
    }
}

/// The `[app]` table: the user-entered app fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSettings {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: DisplayMode,
    pub orientation: String,
    pub theme_color: String,
    pub background_color: String,
    pub category: String,
    /// Raw screenshot URLs, in order. Blank entries are skipped.
    pub screenshots: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            short_name: DEFAULT_SHORT_NAME.to_string(),
            description: String::new(),
            start_url: DEFAULT_START_URL.to_string(),
            display: DisplayMode::default(),
            orientation: DEFAULT_ORIENTATION.to_string(),
            theme_color: DEFAULT_THEME_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            category: String::new(),
            screenshots: Vec::new(),
        }
    }
}

/// The `[worker]` table, shared by the generated script and the Rust worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSettings {
    /// Version suffix of the cache generation name.
    pub cache_version: u32,
    /// Paths precached on install.
    pub app_shell: Vec<String>,
    /// Cached document served when a request misses both network and cache.
    pub offline_fallback: String,
    /// Interval for `registration.update()` polling in the HTML shell.
    pub update_interval_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache_version: 1,
            app_shell: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/styles/main.css".to_string(),
                "/js/app.js".to_string(),
            ],
            offline_fallback: "/index.html".to_string(),
            update_interval_ms: 60_000,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ProjectConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a project file as a raw TOML value. `Ok(None)` when it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ProjectConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ProjectConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `pwa.toml` (or any project file) from `path`.
///
/// A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<ProjectConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `pwa.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pwa-creator project file
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# App identity (written into manifest.json and index.html)
# ---------------------------------------------------------------------------
[app]
name = "My App"

# Shown under the home-screen icon. Also names the offline cache:
# "My Cool App!!" -> cache "my-cool-app-v1".
short_name = "app"

description = ""
start_url = "/"

# One of: fullscreen, standalone, minimal-ui, browser
display = "standalone"

orientation = "any"
theme_color = "#2196F3"
background_color = "#ffffff"

# Optional store category. Leave empty for none.
category = ""

# Screenshot URLs, listed in order. Each becomes a 544x816 PNG entry.
screenshots = []

# ---------------------------------------------------------------------------
# Offline worker (written into sw.js; index.html polls for updates)
# ---------------------------------------------------------------------------
[worker]
# Bump to start a fresh cache generation; old ones are deleted on activation.
cache_version = 1

# Paths cached when the worker installs.
app_shell = ["/", "/index.html", "/manifest.json", "/styles/main.css", "/js/app.js"]

# Served from cache when the network is down and the request was never cached.
offline_fallback = "/index.html"

# How often the page checks for a new worker, in milliseconds.
update_interval_ms = 60000
"##
}
