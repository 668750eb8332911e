//! liteq — a minimal task queue over a store's list primitives.
//!
//! A producer enqueues a [`Task`] onto a named queue and gets back a
//! [`Job`]; a worker pops the task, does the work, and sends a result onto
//! the task's private result list; the producer blocks (or polls) on the
//! job until that result shows up. Redis is the reference store, but
//! anything implementing [`StoreClient`] works, including the bundled
//! [`MemoryStore`] for tests and single-process setups.
//!
//! ```rust,no_run
//! use liteq::{Queue, RedisConnector, StoreConfig, Task};
//!
//! #[tokio::main]
//! async fn main() -> liteq::Result<()> {
//!     let mut queue = Queue::new("emails", StoreConfig::default());
//!     if !queue.connect(&RedisConnector).await? {
//!         // Store unreachable; retry or fall back.
//!         return Ok(());
//!     }
//!
//!     let mut task = Task::new(&serde_json::json!({ "to": "user@example.com" }))?;
//!     let mut job = queue.enqueue(&mut task).await?;
//!
//!     if job.wait(10).await? {
//!         println!("result: {:?}", job.result().await?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Timeouts follow the BRPOP convention throughout: `0` means "block
//! forever", never "return immediately".

mod config;
mod error;
mod job;
mod queue;
pub mod store;
mod task;

pub use config::StoreConfig;
pub use error::{DecodeError, Error, Result, StoreError};
pub use job::Job;
pub use queue::{Queue, DEFAULT_RESULT_TTL_SECS, QUEUE_KEY_PREFIX};
pub use store::{
    MemoryConnector, MemoryStore, RedisConnector, RedisStore, StoreClient, StoreConnector,
};
pub use task::Task;
