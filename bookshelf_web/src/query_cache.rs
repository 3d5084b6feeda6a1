//! Keyed read-through cache of action responses.
//!
//! Only successful responses are stored. An entry is served while it is
//! younger than the staleness window of its cache and was not invalidated,
//! afterwards the next read fetches it again. A fetch that was running while
//! its key got invalidated does not store its result.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

use bookshelf_backend::api::{ComplexBook, User};

use crate::api::{ActionResponse, SessionToken, SimpleBook};

pub const MY_BOOKS_STALE_TIME: Duration = Duration::from_secs(60);
pub const SEARCH_STALE_TIME: Duration = Duration::from_secs(12 * 60 * 60);

/// Stale entries are dropped at most this long after going stale
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

struct CacheEntry<V> {
    response: ActionResponse<V>,
    fetched_at: Instant,
}

struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    epoch: u64,
    /// Epoch of the last invalidation of a key, kept only while older fetches run
    invalidated_at: HashMap<K, u64>,
    all_invalidated_at: u64,
    /// Start epochs of running fetches, with how many started at each
    in_flight: BTreeMap<u64, usize>,
    last_sweep: Instant,
}

impl<K: Eq + Hash, V> CacheState<K, V> {
    fn invalidated_since(&self, key: &K, started: u64) -> bool {
        self.all_invalidated_at > started
            || self
                .invalidated_at
                .get(key)
                .is_some_and(|epoch| *epoch > started)
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

pub struct QueryCache<K, V> {
    stale_time: Duration,
    state: RwLock<CacheState<K, V>>,
}

/// Registration of a running fetch, released when dropped
struct FetchGuard<'a, K, V> {
    cache: &'a QueryCache<K, V>,
    started: u64,
}

impl<K, V> Drop for FetchGuard<'_, K, V> {
    fn drop(&mut self) {
        let mut state = self.cache.state.write();
        if let Some(count) = state.in_flight.get_mut(&self.started) {
            *count -= 1;
            if *count == 0 {
                state.in_flight.remove(&self.started);
            }
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                epoch: 0,
                invalidated_at: HashMap::new(),
                all_invalidated_at: 0,
                in_flight: BTreeMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Number of stored entries, stale ones not swept yet included
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached response, if present and still fresh
    pub fn get(&self, key: &K) -> Option<ActionResponse<V>> {
        let state = self.state.read();
        let entry = state.entries.get(key)?;
        (entry.fetched_at.elapsed() < self.stale_time).then(|| entry.response.clone())
    }

    /// Returns the cached response, or runs `fetch` and caches its result when it succeeded
    /// and the key was not invalidated meanwhile.
    /// Concurrent misses on the same key may each run their own fetch
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> ActionResponse<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ActionResponse<V>>,
    {
        if let Some(cached) = self.get(&key) {
            return cached;
        }

        let guard = self.begin_fetch();
        let response = fetch().await;
        self.store(key, response.clone(), Some(guard.started));
        drop(guard);
        response
    }

    /// Stores a response obtained elsewhere, e.g. while loading a page.
    /// Error and info responses are ignored
    pub fn set_query_data(&self, key: K, response: ActionResponse<V>) {
        self.store(key, response, None);
    }

    /// Drops the entry, the next read refetches it
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.write();
        state.entries.remove(key);
        if !state.in_flight.is_empty() {
            let epoch = state.next_epoch();
            state.invalidated_at.insert(key.clone(), epoch);
        }
    }

    pub fn invalidate_all(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        let epoch = state.next_epoch();
        state.all_invalidated_at = epoch;
    }

    fn begin_fetch(&self) -> FetchGuard<'_, K, V> {
        let mut state = self.state.write();
        let started = state.epoch;
        *state.in_flight.entry(started).or_default() += 1;
        FetchGuard {
            cache: self,
            started,
        }
    }

    fn store(&self, key: K, response: ActionResponse<V>, started: Option<u64>) {
        if !response.is_success() {
            return;
        }

        let mut state = self.state.write();
        if started.is_some_and(|started| state.invalidated_since(&key, started)) {
            return;
        }
        self.sweep_if_due(&mut state);
        state.entries.insert(
            key,
            CacheEntry {
                response,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drops stale entries, and invalidation marks no running fetch can observe anymore
    fn sweep_if_due(&self, state: &mut CacheState<K, V>) {
        if state.last_sweep.elapsed() < self.stale_time.min(MAX_SWEEP_INTERVAL) {
            return;
        }
        state.last_sweep = Instant::now();

        let stale_time = self.stale_time;
        state
            .entries
            .retain(|_, entry| entry.fetched_at.elapsed() < stale_time);

        match state.in_flight.keys().next().copied() {
            Some(oldest_start) => state
                .invalidated_at
                .retain(|_, epoch| *epoch > oldest_start),
            None => state.invalidated_at.clear(),
        }
    }
}

/// Cached queries of the application: library and user of every session, search results
pub struct LibraryCache {
    pub my_books: QueryCache<SessionToken, Vec<ComplexBook>>,
    pub user: QueryCache<SessionToken, User>,
    pub search: QueryCache<String, Vec<SimpleBook>>,
}

impl LibraryCache {
    pub fn new(my_books_stale_time: Duration, search_stale_time: Duration) -> Self {
        Self {
            my_books: QueryCache::new(my_books_stale_time),
            user: QueryCache::new(my_books_stale_time),
            search: QueryCache::new(search_stale_time),
        }
    }

    /// Called after every mutation of the library of `session`
    pub fn invalidate_my_books(&self, session: &SessionToken) {
        self.my_books.invalidate(session);
    }

    /// Called on logout, the session will never be used again
    pub fn forget_session(&self, session: &SessionToken) {
        self.my_books.invalidate(session);
        self.user.invalidate(session);
    }
}

impl Default for LibraryCache {
    fn default() -> Self {
        Self::new(MY_BOOKS_STALE_TIME, SEARCH_STALE_TIME)
    }
}
