//! Reference implementation of the offline caching policy.
//!
//! This is the same policy the generated `sw.js` runs, expressed as an explicit
//! state machine so it can be exercised without a browser:
//!
//! ```text
//! Uninstalled ──install──▶ Installing ──▶ Waiting ──activate──▶ Active ──▶ Terminated
//!                                            ▲
//!                                 SKIP_WAITING message
//! ```
//!
//! | Input | Effect |
//! |---|---|
//! | `InstallRequested` | precache the app shell (all-or-nothing), then request immediate activation |
//! | `ActivateRequested` | delete every bucket except the current one, claim all clients |
//! | `FetchRequested` | network first; on failure cached entry → cached fallback document → 503 |
//! | `ControlMessageReceived(SkipWaiting)` | a waiting worker requests immediate activation |
//!
//! Every call returns a [`Transition`] listing the typed [`Effect`]s it
//! produced. Cache writes and bucket deletions are applied to the injected
//! [`CacheStorage`] before the transition is returned; the effects describe
//! what happened so hosts and tests can observe it.
//!
//! Nothing here is fatal. A failed precache is logged and reported as
//! [`Effect::PrecacheFailed`]; a failed fetch falls through the cache chain and
//! ends, at worst, in the synthetic offline response.
//!
//! The module is split into:
//! - **http**: [`Request`], [`Response`] (read-once body), [`RequestKey`]
//! - **storage**: [`CacheStorage`] / [`Cache`] buckets of [`CacheEntry`]s
//! - **network**: the [`Network`] trait and [`DirectoryNetwork`]
//! - **clock**: the injected [`Clock`]
//! - **registration**: the one-active-worker-at-a-time host ([`Registration`])

mod clock;
pub mod http;
pub mod network;
mod registration;
pub mod storage;

pub use clock::{Clock, SystemClock};
pub use http::{Method, Request, RequestKey, Response, ResponseKind};
pub use network::{DirectoryNetwork, Network, NetworkError};
pub use registration::Registration;
pub use storage::{Cache, CacheEntry, CacheStorage};

use crate::config::WorkerSettings;
use crate::naming::cache_name;
use crate::types::AppConfig;
use thiserror::Error;
use url::Url;

/// Body of the synthetic response served when nothing else is available.
pub const OFFLINE_BODY: &str = "Offline - Please check your connection";

/// Message `type` that asks a waiting worker to activate immediately.
pub const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";

/// Explicit configuration for one worker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Name of the current cache generation, e.g. `my-app-v1`.
    pub cache_name: String,
    /// Origin the worker is installed for; relative paths resolve against it.
    pub origin: Url,
    /// Paths precached on install.
    pub app_shell: Vec<String>,
    /// Cached document served for requests that miss the cache while offline.
    pub offline_fallback: String,
}

impl WorkerConfig {
    /// Configuration with the stock app shell and fallback.
    pub fn new(cache_name: impl Into<String>, origin: Url) -> Self {
        let defaults = WorkerSettings::default();
        Self {
            cache_name: cache_name.into(),
            origin,
            app_shell: defaults.app_shell,
            offline_fallback: defaults.offline_fallback,
        }
    }

    /// The configuration the generated `sw.js` for `app` embeds.
    pub fn for_app(app: &AppConfig, settings: &WorkerSettings, origin: Url) -> Self {
        Self {
            cache_name: cache_name(&app.short_name, settings.cache_version),
            origin,
            app_shell: settings.app_shell.clone(),
            offline_fallback: settings.offline_fallback.clone(),
        }
    }

    fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.origin.join(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Uninstalled,
    Installing,
    /// Installed, not yet in control of any client.
    Waiting,
    Active,
    /// Host context destroyed; every further event is ignored.
    Terminated,
}

/// Messages a page can post to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    SkipWaiting,
    Unrecognized(String),
}

impl MessageKind {
    /// Classify a posted message. Only `{"type": "SKIP_WAITING"}` is recognized.
    pub fn from_message(data: &serde_json::Value) -> Self {
        match data.get("type").and_then(serde_json::Value::as_str) {
            Some(SKIP_WAITING_MESSAGE) => MessageKind::SkipWaiting,
            _ => MessageKind::Unrecognized(data.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum WorkerEvent {
    InstallRequested,
    ActivateRequested,
    FetchRequested(Request),
    ControlMessageReceived(MessageKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheWriteIntent {
    pub cache_name: String,
    pub key: RequestKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketDeleteIntent {
    pub cache_name: String,
}

/// Which layer of the fallback chain produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
    OfflinePlaceholder,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ResponseTo {
    pub request: RequestKey,
    pub source: ResponseSource,
    pub response: Response,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    CacheWrite(CacheWriteIntent),
    BucketDelete(BucketDeleteIntent),
    Respond(ResponseTo),
    /// The request was not intercepted; the host sends it on unmodified.
    PassThrough(Request),
    /// The worker asks to be activated without waiting for clients to close.
    SkipWaiting,
    /// The worker takes control of every open client.
    ClaimClients,
    PrecacheFailed(String),
}

#[derive(Debug)]
pub struct Transition {
    pub from: WorkerState,
    pub to: WorkerState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn noop(state: WorkerState) -> Self {
        Self {
            from: state,
            to: state,
            effects: Vec::new(),
        }
    }

    /// An event that didn't apply in the current state.
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.effects.is_empty()
    }

    pub fn response(&self) -> Option<&ResponseTo> {
        self.effects.iter().find_map(|e| match e {
            Effect::Respond(r) => Some(r),
            _ => None,
        })
    }

    pub fn into_response(self) -> Option<ResponseTo> {
        self.effects.into_iter().find_map(|e| match e {
            Effect::Respond(r) => Some(r),
            _ => None,
        })
    }

    pub fn cache_writes(&self) -> impl Iterator<Item = &CacheWriteIntent> {
        self.effects.iter().filter_map(|e| match e {
            Effect::CacheWrite(w) => Some(w),
            _ => None,
        })
    }

    pub fn bucket_deletes(&self) -> impl Iterator<Item = &BucketDeleteIntent> {
        self.effects.iter().filter_map(|e| match e {
            Effect::BucketDelete(d) => Some(d),
            _ => None,
        })
    }
}

/// Result of intercepting a single fetch.
#[derive(Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    PassThrough(Request),
    Responded {
        response: ResponseTo,
        cache_write: Option<CacheWriteIntent>,
    },
}

impl FetchOutcome {
    pub fn into_effects(self) -> Vec<Effect> {
        match self {
            FetchOutcome::PassThrough(request) => vec![Effect::PassThrough(request)],
            FetchOutcome::Responded {
                response,
                cache_write,
            } => cache_write
                .map(Effect::CacheWrite)
                .into_iter()
                .chain(std::iter::once(Effect::Respond(response)))
                .collect(),
        }
    }

    pub fn response(&self) -> Option<&ResponseTo> {
        match self {
            FetchOutcome::Responded { response, .. } => Some(response),
            FetchOutcome::PassThrough(_) => None,
        }
    }
}

#[derive(Error, Debug)]
enum PrecacheError {
    #[error("invalid app-shell path {path:?}: {source}")]
    InvalidPath {
        path: String,
        source: url::ParseError,
    },
    #[error("{path}: {source}")]
    Network { path: String, source: NetworkError },
    #[error("{path}: request failed with status {status}")]
    BadStatus { path: String, status: u16 },
}

/// The synthetic `503` served when neither network nor cache can answer.
pub fn offline_response() -> Response {
    Response::new(503, "Service Unavailable", OFFLINE_BODY).with_header("Content-Type", "text/plain")
}

/// Buckets that activation should delete: every name except `current`.
pub fn stale_buckets(names: &[String], current: &str) -> Vec<BucketDeleteIntent> {
    names
        .iter()
        .filter(|name| name.as_str() != current)
        .map(|name| BucketDeleteIntent {
            cache_name: name.clone(),
        })
        .collect()
}

/// Whether the fetch path persists a network response.
pub fn is_cacheable(response: &Response) -> bool {
    response.status() == 200 && response.kind() != ResponseKind::Error
}

/// One installed instance of the caching policy.
#[derive(Debug)]
pub struct CacheWorker<N, C = SystemClock> {
    config: WorkerConfig,
    network: N,
    storage: CacheStorage,
    clock: C,
    state: WorkerState,
    skip_waiting: bool,
}

impl<N: Network> CacheWorker<N> {
    pub fn new(config: WorkerConfig, network: N, storage: CacheStorage) -> Self {
        Self::with_clock(config, network, storage, SystemClock)
    }
}

impl<N: Network, C: Clock> CacheWorker<N, C> {
    pub fn with_clock(config: WorkerConfig, network: N, storage: CacheStorage, clock: C) -> Self {
        Self {
            config,
            network,
            storage,
            clock,
            state: WorkerState::Uninstalled,
            skip_waiting: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Whether this worker has asked to skip the normal waiting phase.
    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting
    }

    /// Feed one lifecycle event through the state machine.
    pub fn handle(&mut self, event: WorkerEvent) -> Transition {
        match event {
            WorkerEvent::InstallRequested => self.install(),
            WorkerEvent::ActivateRequested => self.activate(),
            WorkerEvent::FetchRequested(request) => Transition {
                from: self.state,
                to: self.state,
                effects: self.intercept(request).into_effects(),
            },
            WorkerEvent::ControlMessageReceived(kind) => self.receive_message(kind),
        }
    }

    pub fn install(&mut self) -> Transition {
        let from = self.state;
        if from != WorkerState::Uninstalled {
            log::warn!("Ignoring install request in state {from:?}");
            return Transition::noop(from);
        }
        self.state = WorkerState::Installing;

        let cache = self.storage.open(&self.config.cache_name);
        log::info!("Cache opened: {}", cache.name());

        let mut effects = Vec::new();
        match self.precache() {
            Ok(entries) => {
                effects.extend(entries.iter().map(|(key, _)| {
                    Effect::CacheWrite(CacheWriteIntent {
                        cache_name: self.config.cache_name.clone(),
                        key: key.clone(),
                    })
                }));
                cache.put_all(entries);
            }
            Err(err) => {
                log::error!("Cache installation failed: {err}");
                effects.push(Effect::PrecacheFailed(err.to_string()));
            }
        }

        // Updates apply eagerly: never sit in the waiting phase.
        self.skip_waiting = true;
        effects.push(Effect::SkipWaiting);
        self.state = WorkerState::Waiting;

        Transition {
            from,
            to: self.state,
            effects,
        }
    }

    /// Fetch the whole app shell. Nothing is stored unless every path succeeds.
    fn precache(&self) -> Result<Vec<(RequestKey, CacheEntry)>, PrecacheError> {
        let mut entries = Vec::with_capacity(self.config.app_shell.len());
        for path in &self.config.app_shell {
            let url = self
                .config
                .resolve(path)
                .map_err(|source| PrecacheError::InvalidPath {
                    path: path.clone(),
                    source,
                })?;
            let request = Request::get(url);
            let response =
                self.network
                    .fetch(&request)
                    .map_err(|source| PrecacheError::Network {
                        path: path.clone(),
                        source,
                    })?;
            if !response.is_ok() {
                return Err(PrecacheError::BadStatus {
                    path: path.clone(),
                    status: response.status(),
                });
            }
            entries.push((request.key(), CacheEntry::capture(response, self.clock.now())));
        }
        Ok(entries)
    }

    pub fn activate(&mut self) -> Transition {
        let from = self.state;
        if from != WorkerState::Waiting {
            log::warn!("Ignoring activate request in state {from:?}");
            return Transition::noop(from);
        }

        let stale = stale_buckets(&self.storage.keys(), &self.config.cache_name);
        for intent in &stale {
            log::info!("Deleting old cache: {}", intent.cache_name);
            self.storage.delete(&intent.cache_name);
        }

        self.state = WorkerState::Active;
        self.skip_waiting = false;

        let mut effects: Vec<Effect> = stale.into_iter().map(Effect::BucketDelete).collect();
        effects.push(Effect::ClaimClients);
        Transition {
            from,
            to: self.state,
            effects,
        }
    }

    pub fn receive_message(&mut self, kind: MessageKind) -> Transition {
        match (self.state, kind) {
            (WorkerState::Waiting, MessageKind::SkipWaiting) => {
                self.skip_waiting = true;
                Transition {
                    from: self.state,
                    to: self.state,
                    effects: vec![Effect::SkipWaiting],
                }
            }
            (state, MessageKind::Unrecognized(data)) => {
                log::debug!("Ignoring unrecognized message: {data}");
                Transition::noop(state)
            }
            (state, MessageKind::SkipWaiting) => Transition::noop(state),
        }
    }

    /// Host context destroyed.
    pub fn terminate(&mut self) -> Transition {
        let from = self.state;
        self.state = WorkerState::Terminated;
        Transition {
            from,
            to: self.state,
            effects: Vec::new(),
        }
    }

    /// Handle one fetch. Takes `&self` so any number of fetches can be in
    /// flight at once; they share nothing but the cache storage.
    pub fn intercept(&self, request: Request) -> FetchOutcome {
        if self.state != WorkerState::Active
            || !request.method().is_read()
            || !request.is_network_scheme()
        {
            return FetchOutcome::PassThrough(request);
        }

        let key = request.key();
        match self.network.fetch(&request) {
            Ok(response) => {
                let (live, copy) = response.duplicate();
                let cache_write = if is_cacheable(&live) {
                    let cache = self.storage.open(&self.config.cache_name);
                    cache
                        .put(key.clone(), CacheEntry::capture(copy, self.clock.now()))
                        .then(|| CacheWriteIntent {
                            cache_name: self.config.cache_name.clone(),
                            key: key.clone(),
                        })
                } else {
                    None
                };
                FetchOutcome::Responded {
                    response: ResponseTo {
                        request: key,
                        source: ResponseSource::Network,
                        response: live,
                    },
                    cache_write,
                }
            }
            Err(err) => {
                log::debug!("Network request for {key} failed: {err}");
                let (source, response) = self.fallback(&key);
                FetchOutcome::Responded {
                    response: ResponseTo {
                        request: key,
                        source,
                        response,
                    },
                    cache_write: None,
                }
            }
        }
    }

    fn fallback(&self, key: &RequestKey) -> (ResponseSource, Response) {
        if let Some(cached) = self.storage.match_request(key) {
            return (ResponseSource::Cache, cached);
        }
        let fallback = self
            .config
            .resolve(&self.config.offline_fallback)
            .ok()
            .and_then(|url| self.storage.match_request(&Request::get(url).key()));
        match fallback {
            Some(document) => (ResponseSource::OfflineFallback, document),
            None => (ResponseSource::OfflinePlaceholder, offline_response()),
        }
    }
}
