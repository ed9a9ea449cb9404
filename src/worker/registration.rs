//! Host side of the worker lifecycle: at most one active worker per origin.
//!
//! A newly registered worker installs into the waiting slot. `register` promotes
//! it right away when it asked to skip waiting during install (every worker
//! does) or when nothing is active yet. A worker placed with `install` alone
//! stays waiting until a `SKIP_WAITING` message arrives or the old worker's
//! clients go away. Promotion terminates the previously active worker and runs
//! the new worker's activation, which garbage-collects the older cache
//! generations.

use super::clock::Clock;
use super::http::Request;
use super::network::Network;
use super::{CacheWorker, Effect, FetchOutcome, MessageKind, Transition};

#[derive(Debug)]
pub struct Registration<N, C> {
    waiting: Option<CacheWorker<N, C>>,
    active: Option<CacheWorker<N, C>>,
}

impl<N, C> Default for Registration<N, C> {
    fn default() -> Self {
        Self {
            waiting: None,
            active: None,
        }
    }
}

impl<N: Network, C: Clock> Registration<N, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&CacheWorker<N, C>> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&CacheWorker<N, C>> {
        self.waiting.as_ref()
    }

    /// Install `worker` and activate it if it is allowed to take over.
    /// Returns every transition that happened, in order.
    pub fn register(&mut self, worker: CacheWorker<N, C>) -> Vec<Transition> {
        let mut transitions = self.install(worker);
        if self.should_promote() {
            transitions.extend(self.activate_waiting());
        }
        transitions
    }

    /// Install `worker` into the waiting slot, replacing any worker already
    /// waiting there.
    pub fn install(&mut self, mut worker: CacheWorker<N, C>) -> Vec<Transition> {
        let mut transitions = Vec::new();
        if let Some(mut previous) = self.waiting.take() {
            transitions.push(previous.terminate());
        }
        transitions.push(worker.install());
        self.waiting = Some(worker);
        transitions
    }

    /// Promote the waiting worker, terminating the one it replaces.
    pub fn activate_waiting(&mut self) -> Vec<Transition> {
        let Some(mut next) = self.waiting.take() else {
            return Vec::new();
        };
        let mut transitions = Vec::new();
        if let Some(mut old) = self.active.take() {
            transitions.push(old.terminate());
        }
        transitions.push(next.activate());
        self.active = Some(next);
        transitions
    }

    /// Deliver a page message. Goes to the waiting worker if there is one,
    /// otherwise to the active worker. The waiting worker is promoted only
    /// when the message itself made it skip waiting.
    pub fn post_message(&mut self, data: &serde_json::Value) -> Vec<Transition> {
        let kind = MessageKind::from_message(data);
        let mut transitions = Vec::new();
        if let Some(waiting) = self.waiting.as_mut() {
            let received = waiting.receive_message(kind);
            let skip = received.effects.contains(&Effect::SkipWaiting);
            transitions.push(received);
            if skip {
                transitions.extend(self.activate_waiting());
            }
        } else if let Some(active) = self.active.as_mut() {
            transitions.push(active.receive_message(kind));
        }
        transitions
    }

    /// Every client of the active worker has gone away, so a waiting worker
    /// can take over without skipping anything.
    pub fn release_clients(&mut self) -> Vec<Transition> {
        self.activate_waiting()
    }

    /// Route a page fetch through the active worker.
    pub fn fetch(&self, request: Request) -> FetchOutcome {
        match &self.active {
            Some(worker) => worker.intercept(request),
            None => FetchOutcome::PassThrough(request),
        }
    }

    fn should_promote(&self) -> bool {
        match &self.waiting {
            Some(waiting) => waiting.wants_skip_waiting() || self.active.is_none(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FixedClock, ScriptedNetwork, app_shell_network, origin};
    use crate::worker::{CacheStorage, ResponseSource, WorkerConfig, WorkerState};
    use std::sync::Arc;
    use std::time::UNIX_EPOCH;

    type Worker = CacheWorker<Arc<ScriptedNetwork>, FixedClock>;

    fn worker(name: &str, network: &Arc<ScriptedNetwork>, storage: &CacheStorage) -> Worker {
        CacheWorker::with_clock(
            WorkerConfig::new(name, origin()),
            Arc::clone(network),
            storage.clone(),
            FixedClock(UNIX_EPOCH),
        )
    }

    fn get(path: &str) -> Request {
        Request::get(origin().join(path).unwrap())
    }

    #[test]
    fn first_registration_activates_immediately() {
        let network = Arc::new(app_shell_network());
        let storage = CacheStorage::new();
        let mut reg = Registration::new();

        let transitions = reg.register(worker("app-v1", &network, &storage));
        let states: Vec<_> = transitions.iter().map(|t| t.to).collect();
        assert_eq!(states, [WorkerState::Waiting, WorkerState::Active]);
        assert!(reg.waiting().is_none());
        assert_eq!(reg.active().unwrap().state(), WorkerState::Active);
    }

    #[test]
    fn update_replaces_active_and_collects_old_cache() {
        let network = Arc::new(app_shell_network());
        let storage = CacheStorage::new();
        let mut reg = Registration::new();
        reg.register(worker("app-v1", &network, &storage));

        let transitions = reg.register(worker("app-v2", &network, &storage));
        let states: Vec<_> = transitions.iter().map(|t| (t.from, t.to)).collect();
        assert_eq!(
            states,
            [
                (WorkerState::Uninstalled, WorkerState::Waiting),
                (WorkerState::Active, WorkerState::Terminated),
                (WorkerState::Waiting, WorkerState::Active),
            ]
        );
        assert_eq!(reg.active().unwrap().config().cache_name, "app-v2");
        assert_eq!(storage.keys(), ["app-v2"]);
    }

    #[test]
    fn fetch_without_active_worker_passes_through() {
        let reg: Registration<Arc<ScriptedNetwork>, FixedClock> = Registration::new();
        assert!(matches!(
            reg.fetch(get("/index.html")),
            FetchOutcome::PassThrough(_)
        ));
    }

    #[test]
    fn fetch_goes_through_active_worker() {
        let network = Arc::new(app_shell_network());
        let storage = CacheStorage::new();
        let mut reg = Registration::new();
        reg.register(worker("app-v1", &network, &storage));
        network.set_offline(true);

        let outcome = reg.fetch(get("/js/app.js"));
        assert_eq!(outcome.response().unwrap().source, ResponseSource::Cache);
    }

    #[test]
    fn skip_waiting_message_promotes_waiting_worker() {
        let network = Arc::new(app_shell_network());
        let storage = CacheStorage::new();
        let mut reg = Registration::new();
        reg.register(worker("app-v1", &network, &storage));

        // Install only: the new worker sits in the waiting slot until asked.
        reg.install(worker("app-v2", &network, &storage));
        assert_eq!(reg.waiting().unwrap().state(), WorkerState::Waiting);
        assert_eq!(reg.active().unwrap().config().cache_name, "app-v1");

        let transitions = reg.post_message(&serde_json::json!({ "type": "SKIP_WAITING" }));
        assert!(transitions.iter().any(|t| t.to == WorkerState::Active));
        assert!(reg.waiting().is_none());
        assert_eq!(reg.active().unwrap().config().cache_name, "app-v2");
    }

    #[test]
    fn unrecognized_message_leaves_waiting_worker_waiting() {
        let network = Arc::new(app_shell_network());
        let storage = CacheStorage::new();
        let mut reg = Registration::new();
        reg.register(worker("app-v1", &network, &storage));
        reg.install(worker("app-v2", &network, &storage));

        let transitions = reg.post_message(&serde_json::json!({ "type": "PING" }));
        assert_eq!(transitions.len(), 1);
        assert!(transitions[0].is_noop());
        assert_eq!(reg.active().unwrap().config().cache_name, "app-v1");
        assert_eq!(reg.waiting().unwrap().config().cache_name, "app-v2");
        assert_eq!(storage.keys(), ["app-v1", "app-v2"]);
    }

    #[test]
    fn message_without_waiting_worker_goes_to_active() {
        let network = Arc::new(app_shell_network());
        let storage = CacheStorage::new();
        let mut reg = Registration::new();
        reg.register(worker("app-v1", &network, &storage));

        let transitions = reg.post_message(&serde_json::json!({ "type": "SKIP_WAITING" }));
        assert_eq!(transitions.len(), 1);
        assert!(transitions[0].is_noop());
    }

    #[test]
    fn release_clients_activates_waiting_worker() {
        let network = Arc::new(app_shell_network());
        let storage = CacheStorage::new();
        let mut reg = Registration::new();
        reg.register(worker("app-v1", &network, &storage));
        reg.install(worker("app-v2", &network, &storage));

        reg.release_clients();
        assert_eq!(reg.active().unwrap().config().cache_name, "app-v2");
        assert!(reg.release_clients().is_empty());
    }
}
