//! The command surface the queue core depends on, plus the two shipped
//! implementations: Redis for production and an in-memory fake for tests
//! and single-process setups.

mod memory;
mod redis;

pub use self::redis::{RedisConnector, RedisStore};
pub use memory::{MemoryConnector, MemoryStore};

use async_trait::async_trait;

use crate::config::StoreConfig;
use crate::error::{Error, StoreError};

/// Minimal list/string command set the queue requires.
///
/// Every method maps 1:1 onto a store command. Implementations must fail
/// with [`StoreError`] on transport or protocol problems, and must never
/// report those as "empty" or "timed out".
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Liveness probe; used only to validate connectivity at connect time.
    async fn info(&self) -> Result<(), StoreError>;

    /// All keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Length of the list stored at `key` (0 when the key is missing).
    async fn list_len(&self, key: &str) -> Result<usize, StoreError>;

    /// Push values at the head of the list; returns the new length.
    async fn push_left(&self, key: &str, values: Vec<Vec<u8>>) -> Result<usize, StoreError>;

    /// Pop one value off the tail of the list, or `None` when empty.
    async fn pop_right(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Blocking pop across `keys`; returns the key that produced the value.
    ///
    /// `timeout_secs == 0` blocks indefinitely (the BRPOP convention). Only
    /// the calling task is suspended, never the whole process.
    async fn pop_right_blocking(
        &self,
        keys: &[String],
        timeout_secs: u64,
    ) -> Result<Option<(String, Vec<u8>)>, StoreError>;

    /// Remove keys, returning how many existed. Missing keys are not an
    /// error.
    async fn delete(&self, keys: &[String]) -> Result<usize, StoreError>;

    /// Set a TTL on `key`; returns whether the key existed.
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool, StoreError>;
}

/// Factory for store clients, injected into
/// [`Queue::connect`](crate::Queue::connect).
///
/// The seam is resolved at compile time: a non-conforming client is a type
/// error, not a runtime lookup. Invalid parameters must surface as
/// [`Error::Config`] and transport failures as [`Error::Store`] — the queue
/// treats only the latter as a retryable connect outcome.
#[async_trait]
pub trait StoreConnector {
    type Client: StoreClient + 'static;

    async fn open(&self, config: &StoreConfig) -> Result<Self::Client, Error>;
}
