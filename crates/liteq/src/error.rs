use thiserror::Error;

/// Errors surfaced by queue and job operations.
///
/// Absence outcomes are not in here on purpose: an empty queue, a timed-out
/// wait, and a not-yet-posted result are all ordinary return values
/// (`None`/`false`), so a tight polling loop never pays for error handling
/// just to learn there is no work.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was attempted before `connect()` succeeded.
    #[error("queue is not connected")]
    NotConnected,

    /// Connection parameters could not be turned into a usable store client.
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// The store client reported a transport or protocol failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored bytes could not be parsed back into the expected structure.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A payload, envelope, or result could not be encoded to JSON.
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// `send` was called with a task that was never enqueued.
    #[error("task has no correlation id (was it enqueued?)")]
    MissingCorrelationId,
}

/// Transport or protocol failure reported by a store client.
///
/// Implementations must never use this for "list is empty" or "pop timed
/// out" — those are values, not failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store command failed: {0}")]
    Command(String),
}

/// Bytes retrieved from the store did not parse as expected.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The queue list entry was not a valid wire envelope.
    #[error("malformed wire envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// A task payload or job result was not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Payload(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
