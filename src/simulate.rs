//! Dry run of the offline policy against a generated app.
//!
//! Serves a directory (normally the `generate` output plus the developer's
//! assets) through [`DirectoryNetwork`], registers a [`CacheWorker`] for it,
//! and replays a list of requests through the active worker. With `offline`
//! set, the network is cut after installation, so the report shows exactly
//! which layer of the fallback chain would answer each request on the device.
//!
//! Requests are replayed in parallel; the report keeps the input order.

use crate::config::WorkerSettings;
use crate::types::AppConfig;
use crate::worker::{
    CacheStorage, CacheWorker, DirectoryNetwork, Effect, FetchOutcome, Registration, Request,
    ResponseSource, SystemClock, WorkerConfig,
};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub const DEFAULT_ORIGIN: &str = "http://localhost:8080/";

#[derive(Error, Debug)]
pub enum SimulateError {
    #[error("invalid URL {input:?}: {source}")]
    Url {
        input: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub origin: Url,
    /// Cut the network once the worker is active.
    pub offline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedFetch {
    pub path: String,
    /// `None` when the worker let the request through untouched.
    pub source: Option<ResponseSource>,
    pub status: u16,
    pub bytes: usize,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    pub cache_name: String,
    pub precached: usize,
    pub precache_error: Option<String>,
    pub deleted: Vec<String>,
    pub fetches: Vec<SimulatedFetch>,
}

pub fn parse_origin(input: &str) -> Result<Url, SimulateError> {
    Url::parse(input).map_err(|source| SimulateError::Url {
        input: input.to_string(),
        source,
    })
}

/// Install the worker for `app` over the files in `root` and replay `paths`.
pub fn simulate(
    root: &Path,
    app: &AppConfig,
    settings: &WorkerSettings,
    paths: &[String],
    options: &SimulateOptions,
) -> Result<SimulationReport, SimulateError> {
    let requests = paths
        .iter()
        .map(|path| {
            options
                .origin
                .join(path)
                .map(Request::get)
                .map_err(|source| SimulateError::Url {
                    input: path.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let network = Arc::new(DirectoryNetwork::new(root, options.origin.clone()));
    let config = WorkerConfig::for_app(app, settings, options.origin.clone());
    let cache_name = config.cache_name.clone();
    let storage = CacheStorage::new();

    let mut registration: Registration<Arc<DirectoryNetwork>, SystemClock> = Registration::new();
    let transitions =
        registration.register(CacheWorker::new(config, Arc::clone(&network), storage.clone()));

    let mut precache_error = None;
    let mut deleted = Vec::new();
    for effect in transitions.into_iter().flat_map(|t| t.effects) {
        match effect {
            Effect::PrecacheFailed(reason) => precache_error = Some(reason),
            Effect::BucketDelete(intent) => deleted.push(intent.cache_name),
            _ => {}
        }
    }
    let precached = storage.open(&cache_name).len();

    if options.offline {
        network.set_online(false);
    }

    let fetches = paths
        .par_iter()
        .zip(requests)
        .map(|(path, request)| replay(&registration, path, request))
        .collect();

    Ok(SimulationReport {
        cache_name,
        precached,
        precache_error,
        deleted,
        fetches,
    })
}

fn replay(
    registration: &Registration<Arc<DirectoryNetwork>, SystemClock>,
    path: &str,
    request: Request,
) -> SimulatedFetch {
    match registration.fetch(request) {
        FetchOutcome::PassThrough(_) => SimulatedFetch {
            path: path.to_string(),
            source: None,
            status: 0,
            bytes: 0,
            cached: false,
        },
        FetchOutcome::Responded {
            response,
            cache_write,
        } => SimulatedFetch {
            path: path.to_string(),
            source: Some(response.source),
            status: response.response.status(),
            bytes: response.response.body_len(),
            cached: cache_write.is_some(),
        },
    }
}
