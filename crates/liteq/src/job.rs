use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use crate::error::{DecodeError, Result};
use crate::store::StoreClient;

/// Producer-side handle for the result of one enqueued task.
///
/// The correlation id doubles as the name of the per-task result list. It is
/// a UUIDv4 URN (`urn:uuid:…`), unique across every queue talking to the
/// same store. The first successful retrieval deletes the result list and
/// caches the decoded value, so later calls answer from memory without
/// another store round-trip.
pub struct Job {
    correlation_id: String,
    store: Arc<dyn StoreClient>,
    cached: Option<Value>,
}

impl Job {
    pub(crate) fn new(store: Arc<dyn StoreClient>) -> Self {
        Job {
            correlation_id: Uuid::new_v4().urn().to_string(),
            store,
            cached: None,
        }
    }

    /// The id naming this job's result list.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Fetch the result without blocking.
    ///
    /// `Ok(None)` means "no result yet" — an expected outcome, not an
    /// error; poll again later or use [`wait`](Self::wait).
    pub async fn result(&mut self) -> Result<Option<Value>> {
        if let Some(value) = &self.cached {
            return Ok(Some(value.clone()));
        }

        let Some(bytes) = self.store.pop_right(&self.correlation_id).await? else {
            return Ok(None);
        };

        self.finish(&bytes).await.map(Some)
    }

    /// Block until the result arrives or `timeout_secs` elapses.
    ///
    /// A timeout of `0` blocks indefinitely — this follows the store's
    /// blocking-pop convention and is easy to reach for by accident when a
    /// "don't wait" zero was intended. `Ok(false)` on expiry is an expected
    /// outcome, not an error. On success the decoded value is cached and
    /// available from [`result`](Self::result).
    pub async fn wait(&mut self, timeout_secs: u64) -> Result<bool> {
        if self.cached.is_some() {
            return Ok(true);
        }

        let keys = [self.correlation_id.clone()];
        match self.store.pop_right_blocking(&keys, timeout_secs).await? {
            Some((_, bytes)) => {
                self.finish(&bytes).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete the result list (it is single-use), decode, cache.
    async fn finish(&mut self, bytes: &[u8]) -> Result<Value> {
        let keys = [self.correlation_id.clone()];
        self.store.delete(&keys).await?;

        let value: Value = serde_json::from_slice(bytes).map_err(DecodeError::Payload)?;
        trace!(correlation_id = %self.correlation_id, "job result retrieved");
        self.cached = Some(value.clone());
        Ok(value)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("correlation_id", &self.correlation_id)
            .field("cached", &self.cached.is_some())
            .finish()
    }
}
