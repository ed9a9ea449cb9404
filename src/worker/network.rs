//! The worker's view of the network.
//!
//! The policy only ever talks to the network through the [`Network`] trait, so
//! it can run against a directory of files, a scripted fake, or (in a host
//! that has one) a real HTTP client.
//!
//! [`DirectoryNetwork`] serves a directory the way a plain static file server
//! would: `/` and trailing-slash paths map to `index.html`, missing files are
//! a `404 Not Found` response (not an error), and switching it offline makes
//! every fetch fail with [`NetworkError::Offline`].

use super::http::{Request, Response};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("network unreachable")]
    Offline,
    #[error("no route to {0}")]
    Unroutable(String),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can turn a request into a response.
///
/// An `Err` means the request never produced a response at all (the
/// equivalent of a rejected `fetch()`); HTTP error statuses are `Ok`.
pub trait Network: Sync + Send {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

impl<N: Network + ?Sized> Network for Arc<N> {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        (**self).fetch(request)
    }
}

impl<N: Network + ?Sized> Network for &N {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        (**self).fetch(request)
    }
}

/// Serves files from a directory for a single origin.
#[derive(Debug)]
pub struct DirectoryNetwork {
    root: PathBuf,
    origin: Url,
    online: AtomicBool,
}

impl DirectoryNetwork {
    pub fn new(root: impl Into<PathBuf>, origin: Url) -> Self {
        Self {
            root: root.into(),
            origin,
            online: AtomicBool::new(true),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Map a URL path to a file under the root. `None` for paths that try to
    /// climb out of it.
    fn file_for(&self, url_path: &str) -> Option<PathBuf> {
        let rel = url_path.trim_start_matches('/');
        let rel = Path::new(rel);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        let path = self.root.join(rel);
        if url_path.ends_with('/') {
            Some(path.join("index.html"))
        } else {
            Some(path)
        }
    }
}

impl Network for DirectoryNetwork {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        if !self.is_online() {
            return Err(NetworkError::Offline);
        }
        let url = request.url();
        if url.origin() != self.origin.origin() {
            return Err(NetworkError::Unroutable(url.to_string()));
        }

        let Some(path) = self.file_for(url.path()).filter(|p| p.is_file()) else {
            return Ok(Response::new(404, "Not Found", "Not Found")
                .with_header("Content-Type", "text/plain"));
        };

        let body = std::fs::read(&path).map_err(|source| NetworkError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Response::ok(body, content_type(&path)))
    }
}

/// Content type by file extension, covering what an app shell ships.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript",
        "css" => "text/css",
        "json" | "webmanifest" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn origin() -> Url {
        Url::parse("http://localhost:8080/").unwrap()
    }

    fn site() -> (TempDir, DirectoryNetwork) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::create_dir_all(tmp.path().join("styles")).unwrap();
        fs::write(tmp.path().join("styles/main.css"), "body{}").unwrap();
        let network = DirectoryNetwork::new(tmp.path(), origin());
        (tmp, network)
    }

    fn get(path: &str) -> Request {
        Request::get(origin().join(path).unwrap())
    }

    #[test]
    fn serves_existing_file_with_content_type() {
        let (_tmp, network) = site();
        let response = network.fetch(&get("/styles/main.css")).unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.header("Content-Type"), Some("text/css"));
        assert_eq!(response.into_text(), "body{}");
    }

    #[test]
    fn root_maps_to_index() {
        let (_tmp, network) = site();
        let response = network.fetch(&get("/")).unwrap();
        assert_eq!(response.into_text(), "<h1>home</h1>");
    }

    #[test]
    fn missing_file_is_404_not_error() {
        let (_tmp, network) = site();
        let response = network.fetch(&get("/nope.js")).unwrap();
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn parent_traversal_is_404() {
        let (_tmp, network) = site();
        // The url crate already normalizes "..", so build the path by hand.
        assert!(network.file_for("/../secret").is_none());
        let response = network.fetch(&get("/%2e%2e/secret")).unwrap();
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn offline_fails_every_fetch() {
        let (_tmp, network) = site();
        network.set_online(false);
        assert!(matches!(
            network.fetch(&get("/index.html")),
            Err(NetworkError::Offline)
        ));
        network.set_online(true);
        assert!(network.fetch(&get("/index.html")).is_ok());
    }

    #[test]
    fn other_origins_are_unroutable() {
        let (_tmp, network) = site();
        let request = Request::parse("GET", "https://elsewhere.test/index.html").unwrap();
        assert!(matches!(
            network.fetch(&request),
            Err(NetworkError::Unroutable(_))
        ));
    }

    #[test]
    fn content_type_falls_back_to_octet_stream() {
        assert_eq!(content_type(Path::new("a.bin")), "application/octet-stream");
        assert_eq!(content_type(Path::new("manifest.json")), "application/json");
    }
}
