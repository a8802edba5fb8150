//! Snapshot cache and the deduplicating fetcher in front of it.

use crate::config::RouterConfig;
use crate::extract::extract;
use crate::snapshot::Snapshot;
use futures::FutureExt;
use futures::future;
use futures::future::LocalBoxFuture;
use futures::future::Shared;
use futures::future::WeakShared;
use futures::task::LocalSpawn;
use futures::task::LocalSpawnExt;
use glue_core::GlueError;
use glue_core::GlueResult;
use glue_html::HtmlParser;
use glue_net::NavigationRequest;
use glue_net::Network;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::rc::Weak;
use std::task::Context;
use std::task::Poll;
use tracing::debug;
use tracing::warn;

/// Snapshots keyed by absolute URL, in insertion order.
///
/// With a capacity, inserting past the bound evicts the oldest entry.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    entries: IndexMap<String, Rc<Snapshot>>,
    capacity: Option<usize>,
}

impl SnapshotCache {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: IndexMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<Rc<Snapshot>> {
        self.entries.get(url).cloned()
    }

    /// Stores `snapshot` as the newest entry and returns evicted URLs.
    pub fn insert(&mut self, url: &str, snapshot: Rc<Snapshot>) -> Vec<String> {
        self.entries.shift_remove(url);
        self.entries.insert(url.to_owned(), snapshot);

        let mut evicted = Vec::new();
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                match self.entries.shift_remove_index(0) {
                    Some((oldest, _)) => evicted.push(oldest),
                    None => break,
                }
            }
        }
        evicted
    }

    pub fn remove(&mut self, url: &str) -> Option<Rc<Snapshot>> {
        self.entries.shift_remove(url)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

type FetchFuture = LocalBoxFuture<'static, GlueResult<Rc<Snapshot>>>;

/// Handle to a snapshot that is cached or being fetched.
///
/// Clones observe the same outcome. The fetch behind it runs to completion
/// on the fetcher's spawner whether or not any handle is still awaited.
#[derive(Clone)]
pub struct PendingSnapshot {
    inner: Shared<FetchFuture>,
}

impl PendingSnapshot {
    fn ready(snapshot: Rc<Snapshot>) -> Self {
        Self {
            inner: future::ready(Ok(snapshot)).boxed_local().shared(),
        }
    }

    /// Outcome if the operation has already settled.
    pub fn peek(&self) -> Option<&GlueResult<Rc<Snapshot>>> {
        self.inner.peek()
    }
}

impl Future for PendingSnapshot {
    type Output = GlueResult<Rc<Snapshot>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for PendingSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSnapshot")
            .field("settled", &self.peek().is_some())
            .finish()
    }
}

struct InFlightEntry {
    id: u64,
    handle: WeakShared<FetchFuture>,
}

#[derive(Default)]
struct FetchState {
    cache: SnapshotCache,
    in_flight: HashMap<String, InFlightEntry>,
    next_id: u64,
}

impl FetchState {
    fn live_in_flight(&self, url: &str) -> Option<Shared<FetchFuture>> {
        self.in_flight
            .get(url)
            .and_then(|entry| entry.handle.upgrade())
            .filter(|shared| shared.peek().is_none())
    }
}

/// Releases an in-flight slot when the fetch that owns it settles, or when
/// the executor driving it is torn down first.
struct InFlightSlot {
    state: Weak<RefCell<FetchState>>,
    url: String,
    id: u64,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        let Some(state) = self.state.upgrade() else {
            return;
        };
        // A failed borrow leaves a dead weak handle behind, which lookups
        // already treat as absent.
        let removed = match state.try_borrow_mut() {
            Ok(mut state) => {
                let owned = state
                    .in_flight
                    .get(&self.url)
                    .is_some_and(|entry| entry.id == self.id);
                if owned {
                    state.in_flight.remove(&self.url)
                } else {
                    None
                }
            }
            Err(_) => None,
        };
        drop(removed);
    }
}

/// Cache-or-fetch front end with at most one request per URL in flight.
#[derive(Clone)]
pub struct SnapshotFetcher {
    config: Rc<RouterConfig>,
    network: Rc<dyn Network>,
    spawner: Rc<dyn LocalSpawn>,
    state: Rc<RefCell<FetchState>>,
}

impl fmt::Debug for SnapshotFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SnapshotFetcher")
            .field("cached", &state.cache.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl SnapshotFetcher {
    pub fn new(
        config: Rc<RouterConfig>,
        network: Rc<dyn Network>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        let state = FetchState {
            cache: SnapshotCache::new(config.cache_capacity),
            ..FetchState::default()
        };
        Self {
            config,
            network,
            spawner,
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn cached(&self, url: &str) -> Option<Rc<Snapshot>> {
        self.state.borrow().cache.get(url)
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.state.borrow().cache.contains(url)
    }

    pub fn is_in_flight(&self, url: &str) -> bool {
        self.state.borrow().live_in_flight(url).is_some()
    }

    pub fn cache_len(&self) -> usize {
        self.state.borrow().cache.len()
    }

    pub fn cached_urls(&self) -> Vec<String> {
        self.state.borrow().cache.urls().map(str::to_owned).collect()
    }

    /// Stores a snapshot without fetching it.
    pub fn seed(&self, url: &str, snapshot: Snapshot) {
        let evicted = self.state.borrow_mut().cache.insert(url, Rc::new(snapshot));
        log_evictions(&evicted);
    }

    pub fn forget(&self, url: &str) -> bool {
        self.state.borrow_mut().cache.remove(url).is_some()
    }

    /// Cached snapshot, the fetch already in flight for `url`, or a new fetch.
    ///
    /// A new fetch is registered immediately and handed to the spawner, so it
    /// caches its result even if every returned handle is dropped.
    pub fn resolve(&self, url: &str) -> PendingSnapshot {
        let mut state = self.state.borrow_mut();

        if let Some(snapshot) = state.cache.get(url) {
            debug!(url, "snapshot cache hit");
            return PendingSnapshot::ready(snapshot);
        }

        if let Some(inner) = state.live_in_flight(url) {
            debug!(url, "joining in-flight fetch");
            return PendingSnapshot { inner };
        }

        let id = state.next_id;
        state.next_id += 1;

        let slot = InFlightSlot {
            state: Rc::downgrade(&self.state),
            url: url.to_owned(),
            id,
        };
        let fetch = fetch_snapshot(
            Rc::clone(&self.network),
            Rc::clone(&self.config),
            Rc::downgrade(&self.state),
            slot,
        );
        let inner = fetch.boxed_local().shared();

        let previous = inner.downgrade().and_then(|handle| {
            state
                .in_flight
                .insert(url.to_owned(), InFlightEntry { id, handle })
        });
        drop(state);
        drop(previous);

        self.drive(url, inner.clone());
        PendingSnapshot { inner }
    }

    fn drive(&self, url: &str, fetch: Shared<FetchFuture>) {
        let owned_url = url.to_owned();
        let driver = async move {
            if let Err(error) = fetch.await {
                debug!(url = owned_url.as_str(), %error, "snapshot fetch failed");
            }
        };

        if let Err(error) = self.spawner.spawn_local(driver) {
            warn!(url, %error, "snapshot fetch could not be scheduled");
        }
    }

    /// Best-effort background `resolve`; errors are logged and dropped.
    ///
    /// Does nothing when `url` is already cached or in flight.
    pub fn prefetch(&self, url: &str) {
        if self.is_cached(url) || self.is_in_flight(url) {
            debug!(url, "prefetch skipped");
            return;
        }

        let pending = self.resolve(url);
        let owned_url = url.to_owned();
        let task = async move {
            if let Err(error) = pending.await {
                warn!(url = owned_url.as_str(), %error, "prefetch failed");
            }
        };

        if let Err(error) = self.spawner.spawn_local(task) {
            warn!(url, %error, "prefetch could not be scheduled");
        }
    }
}

async fn fetch_snapshot(
    network: Rc<dyn Network>,
    config: Rc<RouterConfig>,
    state: Weak<RefCell<FetchState>>,
    slot: InFlightSlot,
) -> GlueResult<Rc<Snapshot>> {
    let result = fetch_and_extract(network.as_ref(), &config, &slot.url).await;

    if let Ok(snapshot) = &result {
        if let Some(state) = state.upgrade() {
            let evicted = state
                .borrow_mut()
                .cache
                .insert(&slot.url, Rc::clone(snapshot));
            log_evictions(&evicted);
        }
        debug!(url = slot.url.as_str(), "snapshot cached");
    }

    drop(slot);
    result
}

async fn fetch_and_extract(
    network: &dyn Network,
    config: &RouterConfig,
    url: &str,
) -> GlueResult<Rc<Snapshot>> {
    let request = NavigationRequest::get(url)
        .with_header(&config.request_header_name, &config.request_header_value)?;
    let response = network.send(request).await?;

    if !response.is_success() {
        return Err(GlueError::http(
            "router.fetch.status",
            format!("HTTP {}", response.status),
        ));
    }

    let document = HtmlParser.parse(&response.text())?;
    let snapshot = extract(&document, config)?;
    Ok(Rc::new(snapshot))
}

fn log_evictions(evicted: &[String]) {
    for url in evicted {
        debug!(url = url.as_str(), "snapshot evicted");
    }
}
