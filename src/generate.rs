//! Artifact generation.
//!
//! Turns an [`AppConfig`] plus [`WorkerSettings`] into the three files an
//! installable app needs. Generation is pure and deterministic; only
//! [`write_app`] touches the filesystem.
//!
//! ## Generated Files
//!
//! - **`manifest.json`**: the web-app manifest (see [`crate::manifest`])
//! - **`sw.js`**: the offline caching worker, running the same policy as
//!   [`crate::worker`]
//! - **`index.html`**: the app shell, which registers `sw.js` and polls for
//!   worker updates
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html      # App shell
//! ├── manifest.json   # Web-app manifest
//! └── sw.js           # Offline caching worker
//! ```
//!
//! Icons (`/assets/icon-*.png`), `styles/main.css` and `js/app.js` are the
//! developer's own files; they are referenced, never generated.
//!
//! ## Templates
//!
//! The worker and registration scripts are embedded at compile time from
//! `static/` and filled by placeholder substitution. Every value spliced into
//! script text is emitted as a JSON literal, so it is also a valid JS string.
//! The HTML shell uses [maud](https://maud.lambda.xyz/), which escapes every
//! interpolated field.

use crate::config::{DEFAULT_NAME, DEFAULT_SHORT_NAME, DEFAULT_THEME_COLOR, WorkerSettings};
use crate::manifest::{self, or_default};
use crate::naming::cache_name;
use crate::types::AppConfig;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub const MANIFEST_FILE: &str = "manifest.json";
pub const WORKER_FILE: &str = "sw.js";
pub const HTML_FILE: &str = "index.html";

const WORKER_TEMPLATE: &str = include_str!("../static/sw.js");
const REGISTER_TEMPLATE: &str = include_str!("../static/register.js");

/// The three generated documents, as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedApp {
    pub manifest: String,
    pub service_worker: String,
    pub html: String,
}

pub fn generate_app(
    app: &AppConfig,
    worker: &WorkerSettings,
) -> Result<GeneratedApp, GenerateError> {
    Ok(GeneratedApp {
        manifest: manifest::manifest_json(app)?,
        service_worker: generate_service_worker(app, worker),
        html: generate_html(app, worker),
    })
}

/// Write the generated files into `out_dir`, creating it if needed.
/// Returns the written paths in a stable order.
pub fn write_app(app: &GeneratedApp, out_dir: &Path) -> Result<Vec<PathBuf>, GenerateError> {
    fs::create_dir_all(out_dir)?;
    let files = [
        (MANIFEST_FILE, &app.manifest),
        (WORKER_FILE, &app.service_worker),
        (HTML_FILE, &app.html),
    ];
    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = out_dir.join(name);
        fs::write(&path, contents)?;
        written.push(path);
    }
    Ok(written)
}

// ============================================================================
// Worker script
// ============================================================================

/// JSON string literal that also parses on engines predating ES2019, where a
/// raw U+2028/U+2029 inside a string is a syntax error.
fn js_string(value: &str) -> String {
    serde_json::Value::from(value)
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Every character JavaScript treats as the end of a line.
fn is_js_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Fill `{{KEY}}` placeholders in a single left-to-right pass. Substituted
/// text is never scanned again, and unknown keys are kept verbatim.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, end))
        });
        match value {
            Some((v, end)) => {
                out.push_str(v);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render `sw.js` for `app`.
///
/// The cache name is the slug of the short name plus `-v<cache_version>`, so
/// bumping the version makes the next activation discard the old generation.
pub fn generate_service_worker(app: &AppConfig, worker: &WorkerSettings) -> String {
    // The name lands in a `//` comment; a line break would end it early.
    let app_name: String = or_default(&app.name, DEFAULT_NAME)
        .chars()
        .map(|c| if is_js_line_terminator(c) { ' ' } else { c })
        .collect();
    let precache = worker
        .app_shell
        .iter()
        .map(|path| format!("  {}", js_string(path)))
        .collect::<Vec<_>>()
        .join(",\n");
    let cache = js_string(&cache_name(&app.short_name, worker.cache_version));
    let fallback = js_string(&worker.offline_fallback);

    fill_template(
        WORKER_TEMPLATE,
        &[
            ("APP_NAME", app_name.as_str()),
            ("CACHE_NAME", cache.as_str()),
            ("OFFLINE_FALLBACK", fallback.as_str()),
            ("PRECACHE_URLS", precache.as_str()),
        ],
    )
}

fn registration_script(update_interval_ms: u64) -> String {
    let interval = update_interval_ms.to_string();
    fill_template(REGISTER_TEMPLATE, &[("UPDATE_INTERVAL_MS", interval.as_str())])
}

// ============================================================================
// HTML shell
// ============================================================================

fn shell_document(app: &AppConfig, content: Markup, script: &str) -> Markup {
    let name = or_default(&app.name, DEFAULT_NAME);
    let short_name = or_default(&app.short_name, DEFAULT_SHORT_NAME);
    let theme_color = or_default(&app.theme_color, DEFAULT_THEME_COLOR);
    let icon = manifest::icon_src(192);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="description" content=(app.description);
                meta name="theme-color" content=(theme_color);
                meta name="apple-mobile-web-app-capable" content="yes";
                meta name="apple-mobile-web-app-status-bar-style" content="black-translucent";
                meta name="apple-mobile-web-app-title" content=(short_name);
                link rel="manifest" href=(MANIFEST_FILE);
                link rel="icon" type="image/png" sizes="192x192" href=(icon);
                link rel="apple-touch-icon" href=(icon);
                link rel="stylesheet" href="styles/main.css";
                title { (name) }
            }
            body {
                (content)
                script { (PreEscaped(script)) }
            }
        }
    }
}

/// Render `index.html` for `app`.
pub fn generate_html(app: &AppConfig, worker: &WorkerSettings) -> String {
    let name = or_default(&app.name, DEFAULT_NAME);
    let content = html! {
        div.app-container {
            header.app-header {
                h1 { (name) }
            }
            main.app-main {
                p { "Welcome to " (name) "!" }
                p { "This is your PWA home screen content." }
            }
            footer.app-footer {
                p { "© " (name) }
            }
        }
    };
    shell_document(app, content, &registration_script(worker.update_interval_ms)).into_string()
}

// ============================================================================
// Tests
// ============================================================================
