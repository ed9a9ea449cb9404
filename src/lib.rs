//! # pwa-creator
//!
//! Generates the files that make a small web app installable and usable
//! offline on low-memory feature phones (KaiOS-class devices): a web-app
//! manifest, an offline caching service worker, and an HTML shell that
//! registers it.
//!
//! # Architecture
//!
//! ```text
//! pwa.toml  →  AppConfig + WorkerSettings  →  manifest.json, sw.js, index.html
//!                                          ↘
//!                                 worker::CacheWorker (same policy, in Rust)
//! ```
//!
//! The caching policy exists twice: as the generated `sw.js` text, and as
//! [`worker`], an explicit state machine over injected network, storage and
//! clock capabilities. The Rust copy is what the test suite and the
//! `simulate` command exercise; both copies read their parameters (cache
//! version, app shell, fallback document) from the same [`config::WorkerSettings`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `pwa.toml` loading: stock defaults, TOML merge, validation |
//! | [`types`] | `AppConfig`, `DisplayMode`, `Screenshot` |
//! | [`manifest`] | `manifest.json` document with fixed icon set and fallbacks |
//! | [`naming`] | Cache-name slug (`"My Cool App!!"` → `my-cool-app-v1`) |
//! | [`generate`] | `sw.js` and `index.html` rendering, writing the output directory |
//! | [`worker`] | Reference offline cache policy: lifecycle, fetch fallback chain, registration |
//! | [`validate`] | Packaging-time manifest and icon check |
//! | [`simulate`] | Replays requests through the worker over a directory of files |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Network First, Never an Error
//!
//! Every intercepted GET goes to the network first so the app is always fresh
//! when online. When the network fails the answer comes from the cache, then
//! from the cached fallback document, then from a synthetic `503`. A fetch
//! never surfaces an error to the page.
//!
//! ## Generations, Not Invalidation
//!
//! Cached entries are never individually expired. Each worker owns one bucket
//! named `<slug>-v<N>`; bumping `cache_version` produces a new bucket, and
//! activating the new worker deletes all the others.
//!
//! ## Eager Takeover
//!
//! An installed worker always asks to skip waiting, so an update replaces the
//! running worker as soon as it has installed instead of after every tab
//! closes. On devices where apps are rarely closed this is the only way an
//! update lands.
//!
//! ## Maud Over String Templates for HTML
//!
//! The HTML shell interpolates user-entered text. [Maud](https://maud.lambda.xyz/)
//! escapes every interpolation, so a name like `<b>App</b>` can't alter the
//! page. The two scripts are plain-text templates because their only inputs
//! are emitted as JSON literals.

pub mod config;
pub mod generate;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod simulate;
pub mod types;
pub mod validate;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
