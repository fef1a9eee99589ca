// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! One-shot loading of external resources (typefaces).
//!
//! The loader keeps a registry of resource name to state. Each name is
//! fetched at most once: requests for a name that is already loaded, in
//! flight, or failed are collapsed. Outstanding fetches run in parallel on
//! worker threads and report back over a channel drained by [`ResourceLoader::poll`].

use crate::error::MemeError;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// A resource to load: a registry name and where to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: String,
    pub source: String,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ResourceState {
    Loading,
    Loaded(Arc<Vec<u8>>),
    /// Fetch failed with the given reason. Never retried.
    Failed(String),
}

type Completion = (String, Result<Vec<u8>, MemeError>);

/// Fetch function used by worker threads. Swappable for tests.
pub type Fetcher = Arc<dyn Fn(&str) -> Result<Vec<u8>, MemeError> + Send + Sync>;

pub struct ResourceLoader {
    states: HashMap<String, ResourceState>,
    fetcher: Fetcher,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    failed: bool,
}

impl ResourceLoader {
    /// Loader fetching over HTTP or from disk with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::with_fetcher(Arc::new(move |source: &str| {
            crate::io::media::read_source(source, timeout)
        }))
    }

    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        let (sender, receiver) = channel();
        Self {
            states: HashMap::new(),
            fetcher,
            sender,
            receiver,
            failed: false,
        }
    }

    /// Register a resource obtained some other way. Later requests for the
    /// same name are satisfied without fetching.
    pub fn mark_present(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.states
            .insert(name.into(), ResourceState::Loaded(Arc::new(bytes)));
    }

    /// Start fetching every resource not already known. Returns how many
    /// fetches were started.
    pub fn ensure_loaded(&mut self, specs: &[ResourceSpec]) -> usize {
        let mut started = 0;
        for spec in specs {
            if self.states.contains_key(&spec.name) {
                log::debug!("Resource {} already requested, skipping", spec.name);
                continue;
            }
            self.states.insert(spec.name.clone(), ResourceState::Loading);

            let name = spec.name.clone();
            let source = spec.source.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let sender = self.sender.clone();
            log::info!("Loading resource {} from {}", name, source);

            std::thread::spawn(move || {
                let result = fetcher(&source);
                let _ = sender.send((name, result));
            });
            started += 1;
        }
        started
    }

    /// Drain finished fetches. Returns the resources that became available.
    pub fn poll(&mut self) -> Vec<(String, Arc<Vec<u8>>)> {
        let mut loaded = Vec::new();
        while let Ok((name, result)) = self.receiver.try_recv() {
            match result {
                Ok(bytes) => {
                    log::info!("Loaded resource {} ({} bytes)", name, bytes.len());
                    let bytes = Arc::new(bytes);
                    self.states
                        .insert(name.clone(), ResourceState::Loaded(Arc::clone(&bytes)));
                    loaded.push((name, bytes));
                }
                Err(e) => {
                    let err = MemeError::ResourceLoad {
                        name: name.clone(),
                        reason: e.to_string(),
                    };
                    log::error!("{}", err);
                    self.states
                        .insert(name, ResourceState::Failed(e.to_string()));
                    self.failed = true;
                }
            }
        }
        loaded
    }

    /// True once every requested resource has loaded and none has failed.
    /// A failure makes this permanently false.
    pub fn is_ready(&self) -> bool {
        !self.failed
            && !self.states.is_empty()
            && self
                .states
                .values()
                .all(|state| matches!(state, ResourceState::Loaded(_)))
    }

    /// Failed resources and their reasons, ordered by name.
    pub fn failures(&self) -> Vec<(&str, &str)> {
        let mut failed: Vec<(&str, &str)> = self
            .states
            .iter()
            .filter_map(|(name, state)| match state {
                ResourceState::Failed(reason) => Some((name.as_str(), reason.as_str())),
                _ => None,
            })
            .collect();
        failed.sort_unstable();
        failed
    }

    #[cfg(test)]
    pub fn state(&self, name: &str) -> Option<&ResourceState> {
        self.states.get(name)
    }

    pub fn bytes(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        match self.states.get(name) {
            Some(ResourceState::Loaded(bytes)) => Some(Arc::clone(bytes)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn counting_fetcher(calls: Arc<AtomicUsize>) -> Fetcher {
        Arc::new(move |source: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            if source.starts_with("bad") {
                Err(MemeError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such resource",
                )))
            } else {
                Ok(source.as_bytes().to_vec())
            }
        })
    }

    fn poll_until_settled(loader: &mut ResourceLoader) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            loader.poll();
            let pending = loader
                .states
                .values()
                .any(|state| matches!(state, ResourceState::Loading));
            if !pending {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("resources did not settle");
    }

    #[test]
    fn test_loads_each_resource_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut loader = ResourceLoader::with_fetcher(counting_fetcher(Arc::clone(&calls)));
        let specs = vec![ResourceSpec::new("a", "one"), ResourceSpec::new("b", "two")];

        assert_eq!(loader.ensure_loaded(&specs), 2);
        // Requested again while in flight.
        assert_eq!(loader.ensure_loaded(&specs), 0);
        poll_until_settled(&mut loader);
        // Requested again after completion.
        assert_eq!(loader.ensure_loaded(&specs), 0);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(loader.is_ready());
        assert_eq!(loader.bytes("b").as_deref().map(Vec::as_slice), Some(&b"two"[..]));
    }

    #[test]
    fn test_present_resources_are_not_fetched() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut loader = ResourceLoader::with_fetcher(counting_fetcher(Arc::clone(&calls)));
        loader.mark_present("a", b"bundled".to_vec());

        let started = loader.ensure_loaded(&[ResourceSpec::new("a", "one")]);
        assert_eq!(started, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(loader.is_ready());
    }

    #[test]
    fn test_single_failure_blocks_readiness_forever() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut loader = ResourceLoader::with_fetcher(counting_fetcher(Arc::clone(&calls)));
        loader.ensure_loaded(&[
            ResourceSpec::new("a", "one"),
            ResourceSpec::new("b", "bad-source"),
        ]);
        poll_until_settled(&mut loader);

        assert!(!loader.is_ready());
        assert!(matches!(loader.state("b"), Some(ResourceState::Failed(_))));
        let failures = loader.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "b");
        assert!(failures[0].1.contains("no such resource"), "{}", failures[0].1);

        // No retry on a repeated request.
        assert_eq!(loader.ensure_loaded(&[ResourceSpec::new("b", "one")]), 0);
        assert!(!loader.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_not_ready_before_anything_is_requested() {
        let loader = ResourceLoader::with_fetcher(counting_fetcher(Arc::new(AtomicUsize::new(0))));
        assert!(!loader.is_ready());
    }
}
