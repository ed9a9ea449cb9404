//! Packaging-time manifest check.
//!
//! Reads `manifest.json` from a project root and collects every problem
//! instead of stopping at the first one. Two problems do stop the check: a
//! missing manifest and a manifest that isn't JSON, since nothing else can be
//! inspected after those.
//!
//! Required keys are tested for truthiness the way the device's installer
//! reads them: `""`, `0`, `false` and `null` count as missing, while an empty
//! array does not (it is then reported by the icons-array check instead).
//!
//! With [`ValidateOptions::check_dimensions`], each icon that exists is also
//! decoded and its pixel size compared with the `sizes` it declares.

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "manifest.json";

pub const SUCCESS_MESSAGE: &str = "manifest.json looks valid and icons exist";

const REQUIRED_KEYS: [&str; 4] = ["name", "short_name", "start_url", "icons"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestIssue {
    #[error("manifest.json not found")]
    NotFound,
    #[error("manifest.json could not be read: {0}")]
    Unreadable(String),
    #[error("manifest.json is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("manifest.json missing required key: {0}")]
    MissingKey(&'static str),
    #[error("manifest.json must include an icons array with at least one icon")]
    NoIcons,
    #[error("Icon file not found: {src} -> looked at {}", .path.display())]
    IconNotFound { src: String, path: PathBuf },
    #[error("Icon {src} could not be decoded: {reason}")]
    IconUndecodable { src: String, reason: String },
    #[error("Icon {src} is {width}x{height} but declares sizes \"{declared}\"")]
    IconSizeMismatch {
        src: String,
        declared: String,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Decode icons and compare their pixel size with `sizes`.
    pub check_dimensions: bool,
}

#[derive(Debug)]
pub struct ValidationReport {
    pub issues: Vec<ManifestIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// JavaScript truthiness of an optional JSON value.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Check `<root>/manifest.json` and the icon files it references.
pub fn validate_manifest(root: &Path, options: &ValidateOptions) -> ValidationReport {
    let issues = match read_manifest(&root.join(MANIFEST_FILE)) {
        Ok(manifest) => check_manifest(root, &manifest, options),
        Err(issue) => vec![issue],
    };
    ValidationReport { issues }
}

fn read_manifest(path: &Path) -> Result<Value, ManifestIssue> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ManifestIssue::NotFound,
        _ => ManifestIssue::Unreadable(e.to_string()),
    })?;
    serde_json::from_str(&text).map_err(|e| ManifestIssue::InvalidJson(e.to_string()))
}

fn check_manifest(root: &Path, manifest: &Value, options: &ValidateOptions) -> Vec<ManifestIssue> {
    let mut issues: Vec<ManifestIssue> = REQUIRED_KEYS
        .iter()
        .filter(|key| !is_truthy(manifest.get(**key)))
        .map(|key| ManifestIssue::MissingKey(*key))
        .collect();

    let icons = manifest.get("icons");
    // A missing icons key is already reported above.
    if !is_truthy(icons) {
        return issues;
    }
    let Some(icons) = icons.and_then(Value::as_array).filter(|a| !a.is_empty()) else {
        issues.push(ManifestIssue::NoIcons);
        return issues;
    };

    for icon in icons {
        let Some(src) = icon.get("src").and_then(Value::as_str).filter(|s| !s.is_empty()) else {
            continue;
        };
        let path = icon_path(root, src);
        if !path.exists() {
            issues.push(ManifestIssue::IconNotFound {
                src: src.to_string(),
                path,
            });
            continue;
        }
        if options.check_dimensions {
            let declared = icon.get("sizes").and_then(Value::as_str).unwrap_or("");
            issues.extend(check_dimensions(src, declared, &path));
        }
    }
    issues
}

/// Where an icon `src` lives on disk. Always under `root`: leading slashes
/// are dropped and `..` never climbs above it.
fn icon_path(root: &Path, src: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    let mut depth = 0usize;
    for component in Path::new(src).components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                depth += 1;
            }
            Component::ParentDir if depth > 0 => {
                path.pop();
                depth -= 1;
            }
            _ => {}
        }
    }
    path
}

/// Parse a `sizes` value (`"72x72"`, `"16x16 32x32"`) into pixel pairs.
/// `"any"` and malformed tokens yield nothing.
pub fn parse_sizes(sizes: &str) -> Vec<(u32, u32)> {
    sizes
        .split_whitespace()
        .filter_map(|token| {
            let token = token.to_ascii_lowercase();
            let (w, h) = token.split_once('x')?;
            Some((w.parse().ok()?, h.parse().ok()?))
        })
        .collect()
}

fn check_dimensions(src: &str, declared: &str, path: &Path) -> Option<ManifestIssue> {
    let expected = parse_sizes(declared);
    if expected.is_empty() {
        return None;
    }
    match image::image_dimensions(path) {
        Ok(actual) if expected.contains(&actual) => None,
        Ok((width, height)) => Some(ManifestIssue::IconSizeMismatch {
            src: src.to_string(),
            declared: declared.to_string(),
            width,
            height,
        }),
        Err(e) => Some(ManifestIssue::IconUndecodable {
            src: src.to_string(),
            reason: e.to_string(),
        }),
    }
}
