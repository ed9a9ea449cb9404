//! Shared test utilities for the pwa-creator test suite.
//!
//! Provides canned app configurations, a scripted [`Network`] fake that can
//! be flipped offline or told to fail individual paths, and a pinned clock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let network = app_shell_network();
//! network.fail("/js/app.js");
//! network.set_offline(true);
//! assert_eq!(network.fetch_count(), 0);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;
use url::Url;

use crate::types::{AppConfig, DisplayMode, Screenshot};
use crate::worker::{Clock, Network, NetworkError, Request, Response};

// =========================================================================
// App configurations
// =========================================================================

/// A fully filled-in form.
pub fn sample_app_config() -> AppConfig {
    AppConfig {
        name: "My Cool App".into(),
        short_name: "My Cool App!!".into(),
        description: "Tasks, offline.".into(),
        start_url: "/index.html".into(),
        display: DisplayMode::Standalone,
        orientation: "portrait".into(),
        theme_color: "#112233".into(),
        background_color: "#ffffff".into(),
        category: Some("productivity".into()),
        screenshots: vec![
            Screenshot {
                src: "https://example.com/home.png".into(),
                sizes: "544x816".into(),
                mime_type: "image/png".into(),
            },
            Screenshot {
                src: "https://example.com/list.png".into(),
                sizes: "544x816".into(),
                mime_type: "image/png".into(),
            },
        ],
    }
}

/// A form submitted with every field left blank.
pub fn empty_app_config() -> AppConfig {
    AppConfig {
        name: String::new(),
        short_name: String::new(),
        description: String::new(),
        start_url: String::new(),
        display: DisplayMode::Standalone,
        orientation: String::new(),
        theme_color: String::new(),
        background_color: String::new(),
        category: None,
        screenshots: Vec::new(),
    }
}

// =========================================================================
// Network and clock fakes
// =========================================================================

pub fn origin() -> Url {
    Url::parse("https://app.test/").unwrap()
}

#[derive(Debug)]
enum Scripted {
    Body(u16, String),
    ErrorKind,
    Fail,
}

/// In-memory network for one origin, keyed by URL path.
///
/// Unknown paths answer `404`. Everything is behind interior mutability so a
/// test can reconfigure the network while a worker holds it.
#[derive(Debug, Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Scripted>>,
    offline: AtomicBool,
    fetches: AtomicUsize,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), scripted);
    }

    pub fn serve(&self, path: &str, body: &str) {
        self.route(path, Scripted::Body(200, body.to_string()));
    }

    pub fn serve_status(&self, path: &str, status: u16, body: &str) {
        self.route(path, Scripted::Body(status, body.to_string()));
    }

    /// Answer with a `Response::network_error()`.
    pub fn serve_error_kind(&self, path: &str) {
        self.route(path, Scripted::ErrorKind);
    }

    /// Make requests for `path` fail at the network level.
    pub fn fail(&self, path: &str) {
        self.route(path, Scripted::Fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of fetches that reached the network, offline or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Network for ScriptedNetwork {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Offline);
        }
        let routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get(request.url().path()) {
            Some(Scripted::Body(200, body)) => Ok(Response::ok(body.as_str(), "text/plain")),
            Some(Scripted::Body(status, body)) => {
                Ok(Response::new(*status, "Scripted", body.as_str()))
            }
            Some(Scripted::ErrorKind) => Ok(Response::network_error()),
            Some(Scripted::Fail) => Err(NetworkError::Unroutable(request.url().to_string())),
            None => Ok(Response::new(404, "Not Found", "Not Found")),
        }
    }
}

/// A network serving the stock app shell.
pub fn app_shell_network() -> ScriptedNetwork {
    let network = ScriptedNetwork::new();
    network.serve("/", "<h1>index</h1>");
    network.serve("/index.html", "<h1>index</h1>");
    network.serve("/manifest.json", "{}");
    network.serve("/styles/main.css", "body { margin: 0 }");
    network.serve("/js/app.js", "console.log('app')");
    network
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}
