use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::job::Job;
use crate::store::{StoreClient, StoreConnector};
use crate::task::{Task, WireEnvelope};

/// Prefix under which every queue list lives in the store.
pub const QUEUE_KEY_PREFIX: &str = "liteq-";

/// Result lists are expendable; without a reader they expire on their own.
pub const DEFAULT_RESULT_TTL_SECS: u64 = 60;

/// A named task queue over one store connection.
///
/// Starts disconnected; everything except [`connect`](Self::connect)
/// requires a successful connect first and fails with
/// [`Error::NotConnected`] otherwise. Calling an operation while
/// disconnected is a programming error, not a transient condition.
///
/// One `Queue` drives one logical producer or worker loop. For N-way
/// concurrency, construct N queues with the same name — interleaving safety
/// comes from the store's atomic pop, not from this type.
pub struct Queue {
    name: String,
    list_key: String,
    config: StoreConfig,
    client: Option<Arc<dyn StoreClient>>,
}

impl Queue {
    /// A queue handle in the disconnected state.
    pub fn new(name: impl Into<String>, config: StoreConfig) -> Self {
        let name = name.into();
        let list_key = format!("{QUEUE_KEY_PREFIX}{name}");
        Queue {
            name,
            list_key,
            config,
            client: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open a store client and probe it.
    ///
    /// Returns `Ok(false)` and stays disconnected when the store is
    /// unreachable — connectivity is the one failure treated as an
    /// expected, retryable outcome. Invalid configuration is fatal and
    /// surfaces as [`Error::Config`] before any store interaction.
    ///
    /// There is no disconnect transition; reconnect by constructing a new
    /// queue.
    pub async fn connect<C: StoreConnector>(&mut self, connector: &C) -> Result<bool> {
        let client = match connector.open(&self.config).await {
            Ok(client) => client,
            Err(Error::Store(err)) => {
                debug!(queue = %self.name, %err, "store unreachable during connect");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        if let Err(err) = client.info().await {
            debug!(queue = %self.name, %err, "liveness probe failed during connect");
            return Ok(false);
        }

        self.client = Some(Arc::new(client));
        debug!(queue = %self.name, "connected");
        Ok(true)
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self) -> Result<&Arc<dyn StoreClient>> {
        self.client.as_ref().ok_or(Error::NotConnected)
    }

    /// Names of all queues present in the store, prefix stripped.
    pub async fn names(&self) -> Result<Vec<String>> {
        let client = self.client()?;
        let pattern = format!("{QUEUE_KEY_PREFIX}*");
        let keys = client.keys(&pattern).await?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(QUEUE_KEY_PREFIX))
            .map(str::to_string)
            .collect())
    }

    /// Number of tasks currently pending on this queue.
    pub async fn len(&self) -> Result<usize> {
        let client = self.client()?;
        Ok(client.list_len(&self.list_key).await?)
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Serialize the task onto the queue and hand back the job that will
    /// receive its result.
    ///
    /// Assigns a fresh correlation id onto `task` as a side effect. Unlike
    /// the lossy fire-and-forget API this descends from, failures surface
    /// as a typed error carrying the cause; callers that only care about
    /// presence can use `queue.enqueue(&mut task).await.ok()`.
    pub async fn enqueue(&self, task: &mut Task) -> Result<Job> {
        let client = self.client()?;

        let job = Job::new(Arc::clone(client));
        task.assign_correlation_id(job.correlation_id());

        let bytes = task.to_wire().encode()?;
        client.push_left(&self.list_key, vec![bytes]).await?;

        debug!(queue = %self.name, correlation_id = %job.correlation_id(), "task enqueued");
        Ok(job)
    }

    /// Pop one task without blocking; `Ok(None)` when the queue is empty.
    ///
    /// An entry that does not decode as a wire envelope fails loudly with
    /// [`Error::Decode`]; the entry is consumed either way, and the caller
    /// decides whether to retry or skip.
    pub async fn dequeue(&self) -> Result<Option<Task>> {
        let client = self.client()?;

        if client.list_len(&self.list_key).await? == 0 {
            return Ok(None);
        }

        let Some(bytes) = client.pop_right(&self.list_key).await? else {
            return Ok(None);
        };

        let envelope = WireEnvelope::decode(&bytes)?;
        Ok(Some(Task::from_wire(envelope)))
    }

    /// Block until a task arrives or `timeout_secs` elapses.
    ///
    /// `Ok(None)` on timeout is an expected outcome, not an error. A
    /// timeout of `0` blocks indefinitely, matching [`Job::wait`] and the
    /// store's blocking-pop convention.
    pub async fn wait(&self, timeout_secs: u64) -> Result<Option<Task>> {
        let client = self.client()?;

        let keys = [self.list_key.clone()];
        match client.pop_right_blocking(&keys, timeout_secs).await? {
            Some((_, bytes)) => {
                let envelope = WireEnvelope::decode(&bytes)?;
                Ok(Some(Task::from_wire(envelope)))
            }
            None => Ok(None),
        }
    }

    /// Publish a task's result with the default TTL.
    pub async fn send<R: Serialize>(&self, task: &Task, result: &R) -> Result<()> {
        self.send_with_expiry(task, result, DEFAULT_RESULT_TTL_SECS)
            .await
    }

    /// Publish a task's result onto its correlation-id list.
    ///
    /// Fire-and-forget: nothing acknowledges that the producer ever reads
    /// it, which is exactly why the list gets a TTL — an abandoned result
    /// must not leak storage forever. Exactly the encoded result bytes are
    /// pushed, with no wrapper.
    pub async fn send_with_expiry<R: Serialize>(
        &self,
        task: &Task,
        result: &R,
        expire_secs: u64,
    ) -> Result<()> {
        let client = self.client()?;
        let key = task.correlation_id().ok_or(Error::MissingCorrelationId)?;

        let bytes = serde_json::to_vec(result).map_err(Error::Encode)?;
        client.push_left(key, vec![bytes]).await?;
        if !client.expire(key, expire_secs).await? {
            warn!(queue = %self.name, correlation_id = %key, "result list vanished before TTL was set");
        }
        Ok(())
    }
}
