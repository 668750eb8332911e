use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{Duration, Instant};

use super::{StoreClient, StoreConnector};
use crate::config::StoreConfig;
use crate::error::{Error, StoreError};

/// In-process store speaking the same contract as Redis.
///
/// Lists live in a mutex-guarded map; TTLs are applied lazily against the
/// tokio clock, so tests running under a paused clock can drive expiry with
/// `tokio::time::advance`. Blocking pops park on a [`Notify`] instead of
/// polling. Clones are cheap and share the same data, which is how a
/// producer and a worker in one process see the same queue.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    writers: Notify,
    fail_probe: AtomicBool,
    commands: AtomicUsize,
}

#[derive(Default)]
struct State {
    lists: HashMap<String, VecDeque<Vec<u8>>>,
    deadlines: HashMap<String, Instant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `info()` probes fail, to exercise connect fallback.
    pub fn fail_probes(&self, fail: bool) {
        self.inner.fail_probe.store(fail, Ordering::SeqCst);
    }

    /// Number of store commands issued so far. Every trait method counts as
    /// one command, which lets tests assert "no further round-trips".
    pub fn command_count(&self) -> usize {
        self.inner.commands.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.inner.commands.fetch_add(1, Ordering::SeqCst);
    }
}

/// Drop lists whose TTL deadline has passed.
fn purge_expired(state: &mut State) {
    let now = Instant::now();
    let expired: Vec<String> = state
        .deadlines
        .iter()
        .filter(|(_, at)| **at <= now)
        .map(|(key, _)| key.clone())
        .collect();
    for key in expired {
        state.deadlines.remove(&key);
        state.lists.remove(&key);
    }
}

/// Only the `prefix*` glob form is needed by the queue.
fn glob_match(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn info(&self) -> Result<(), StoreError> {
        self.record();
        if self.inner.fail_probe.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("probe refused".to_string()));
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.record();
        let mut state = self.inner.state.lock();
        purge_expired(&mut state);
        let mut keys: Vec<String> = state
            .lists
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn list_len(&self, key: &str) -> Result<usize, StoreError> {
        self.record();
        let mut state = self.inner.state.lock();
        purge_expired(&mut state);
        Ok(state.lists.get(key).map_or(0, VecDeque::len))
    }

    async fn push_left(&self, key: &str, values: Vec<Vec<u8>>) -> Result<usize, StoreError> {
        self.record();
        let len = {
            let mut state = self.inner.state.lock();
            purge_expired(&mut state);
            let list = state.lists.entry(key.to_string()).or_default();
            for value in values {
                list.push_front(value);
            }
            list.len()
        };
        self.inner.writers.notify_waiters();
        Ok(len)
    }

    async fn pop_right(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.record();
        let mut state = self.inner.state.lock();
        purge_expired(&mut state);
        let value = state.lists.get_mut(key).and_then(VecDeque::pop_back);
        if state.lists.get(key).is_some_and(VecDeque::is_empty) {
            state.lists.remove(key);
            state.deadlines.remove(key);
        }
        Ok(value)
    }

    async fn pop_right_blocking(
        &self,
        keys: &[String],
        timeout_secs: u64,
    ) -> Result<Option<(String, Vec<u8>)>, StoreError> {
        self.record();
        let deadline = (timeout_secs > 0).then(|| Instant::now() + Duration::from_secs(timeout_secs));

        loop {
            let notified = self.inner.writers.notified();
            tokio::pin!(notified);
            // Register for wakeups before inspecting the lists, so a push
            // landing between the check and the await is not missed.
            notified.as_mut().enable();

            {
                let mut state = self.inner.state.lock();
                purge_expired(&mut state);
                for key in keys {
                    if let Some(value) = state.lists.get_mut(key).and_then(VecDeque::pop_back) {
                        if state.lists.get(key).is_some_and(VecDeque::is_empty) {
                            state.lists.remove(key);
                            state.deadlines.remove(key);
                        }
                        return Ok(Some((key.clone(), value)));
                    }
                }
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, StoreError> {
        self.record();
        let mut state = self.inner.state.lock();
        let mut removed = 0;
        for key in keys {
            if state.lists.remove(key).is_some() {
                removed += 1;
            }
            state.deadlines.remove(key);
        }
        Ok(removed)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError> {
        self.record();
        let mut state = self.inner.state.lock();
        purge_expired(&mut state);
        if state.lists.contains_key(key) {
            state
                .deadlines
                .insert(key.to_string(), Instant::now() + Duration::from_secs(seconds));
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Connector handing out clones of one shared [`MemoryStore`].
#[derive(Default)]
pub struct MemoryConnector {
    store: MemoryStore,
}

impl MemoryConnector {
    pub fn new(store: MemoryStore) -> Self {
        MemoryConnector { store }
    }

    /// The shared store, for seeding or inspecting state in tests.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    type Client = MemoryStore;

    async fn open(&self, _config: &StoreConfig) -> Result<MemoryStore, Error> {
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test]
    async fn push_pop_is_fifo() {
        let store = MemoryStore::new();
        store.push_left("q", vec![b"a".to_vec()]).await.unwrap();
        store.push_left("q", vec![b"b".to_vec()]).await.unwrap();

        assert_eq!(store.pop_right("q").await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.pop_right("q").await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(store.pop_right("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_filters_by_prefix_glob() {
        let store = MemoryStore::new();
        store.push_left("liteq-a", vec![b"1".to_vec()]).await.unwrap();
        store.push_left("liteq-b", vec![b"1".to_vec()]).await.unwrap();
        store.push_left("other", vec![b"1".to_vec()]).await.unwrap();

        assert_eq!(
            store.keys("liteq-*").await.unwrap(),
            vec!["liteq-a".to_string(), "liteq-b".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_ignores_missing_keys() {
        let store = MemoryStore::new();
        store.push_left("q", vec![b"1".to_vec()]).await.unwrap();

        let removed = store
            .delete(&["q".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expire_drops_the_list_after_ttl() {
        let store = MemoryStore::new();
        store.push_left("q", vec![b"1".to_vec()]).await.unwrap();
        assert!(store.expire("q", 1).await.unwrap());

        advance(Duration::from_secs(2)).await;
        assert_eq!(store.list_len("q").await.unwrap(), 0);
        assert_eq!(store.pop_right("q").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expire_reports_missing_keys() {
        let store = MemoryStore::new();
        assert!(!store.expire("missing", 1).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn blocking_pop_times_out_empty_handed() {
        let store = MemoryStore::new();
        let started = Instant::now();

        let popped = store
            .pop_right_blocking(&["q".to_string()], 1)
            .await
            .unwrap();

        assert!(popped.is_none());
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn blocking_pop_wakes_on_push() {
        let store = MemoryStore::new();
        let writer = store.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.push_left("q", vec![b"late".to_vec()]).await.unwrap();
        });

        // Timeout 0 blocks until the writer shows up.
        let popped = store
            .pop_right_blocking(&["q".to_string()], 0)
            .await
            .unwrap();
        assert_eq!(popped, Some(("q".to_string(), b"late".to_vec())));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn failed_probe_is_a_store_error() {
        let store = MemoryStore::new();
        assert!(store.info().await.is_ok());

        store.fail_probes(true);
        assert!(store.info().await.is_err());
    }

    #[tokio::test]
    async fn commands_are_counted() {
        let store = MemoryStore::new();
        let before = store.command_count();
        store.list_len("q").await.unwrap();
        assert_eq!(store.command_count(), before + 1);
    }
}
