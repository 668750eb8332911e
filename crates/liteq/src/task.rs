use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Error, Result};

/// One unit of work: an opaque JSON payload plus, once enqueued, the
/// correlation id that names its result list.
///
/// The payload is encoded exactly once, at construction, and never
/// re-encoded afterwards. The correlation id is assigned exactly once, by
/// [`Queue::enqueue`](crate::Queue::enqueue); before that a task has no
/// stable identity.
#[derive(Debug, Clone, Default)]
pub struct Task {
    payload: String,
    correlation_id: String,
}

impl Task {
    /// Build a task from structured data, encoding it to JSON once.
    pub fn new<T: Serialize>(data: &T) -> Result<Self> {
        let payload = serde_json::to_string(data).map_err(Error::Encode)?;
        Ok(Task {
            payload,
            correlation_id: String::new(),
        })
    }

    /// Build a task from an already-encoded string, stored verbatim.
    pub fn raw(payload: impl Into<String>) -> Self {
        Task {
            payload: payload.into(),
            correlation_id: String::new(),
        }
    }

    pub(crate) fn from_wire(envelope: WireEnvelope) -> Self {
        Task {
            payload: envelope.payload,
            correlation_id: envelope.correlation_id,
        }
    }

    /// Decode the stored payload back to structured form.
    pub fn decoded_payload<T: DeserializeOwned>(&self) -> std::result::Result<T, DecodeError> {
        serde_json::from_str(&self.payload).map_err(DecodeError::Payload)
    }

    /// The stored payload, unchanged. Total; never fails.
    pub fn raw_payload(&self) -> &str {
        &self.payload
    }

    /// The correlation id naming this task's result list, once assigned.
    pub fn correlation_id(&self) -> Option<&str> {
        if self.correlation_id.is_empty() {
            None
        } else {
            Some(&self.correlation_id)
        }
    }

    pub(crate) fn assign_correlation_id(&mut self, id: &str) {
        self.correlation_id = id.to_string();
    }

    pub(crate) fn to_wire(&self) -> WireEnvelope {
        WireEnvelope {
            correlation_id: self.correlation_id.clone(),
            payload: self.payload.clone(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.payload)
    }
}

/// The structure that actually travels through the store's queue list.
///
/// The outer layer is generic (id plus opaque blob); the payload string is
/// the caller's own encoding, carried through untouched. Both fields are
/// required on decode; unknown fields are ignored.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireEnvelope {
    pub correlation_id: String,
    pub payload: String,
}

impl WireEnvelope {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(DecodeError::Envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        task_name: String,
        attempts: u32,
    }

    #[test]
    fn structured_payload_round_trips() {
        let payload = Payload {
            task_name: "high-five a sea otter".to_string(),
            attempts: 3,
        };
        let task = Task::new(&payload).unwrap();
        assert_eq!(task.decoded_payload::<Payload>().unwrap(), payload);
    }

    #[test]
    fn raw_payload_is_stored_verbatim() {
        let raw = r#"{"task_name":"high-five a sea otter"}"#;
        let task = Task::raw(raw);
        assert_eq!(task.raw_payload(), raw);
    }

    #[test]
    fn empty_task_is_the_documented_default() {
        let task = Task::default();
        assert_eq!(task.raw_payload(), "");
        assert!(task.correlation_id().is_none());
    }

    #[test]
    fn display_wraps_the_payload() {
        let task = Task::raw(r#"{"k":1}"#);
        assert_eq!(task.to_string(), r#"Task({"k":1})"#);
    }

    #[test]
    fn decode_failure_is_a_decode_error() {
        let task = Task::raw("not json");
        let err = task.decoded_payload::<Payload>().unwrap_err();
        assert!(matches!(err, DecodeError::Payload(_)));
    }

    #[test]
    fn envelope_requires_both_fields() {
        assert!(WireEnvelope::decode(br#"{"correlationId":"urn:uuid:x"}"#).is_err());
        assert!(WireEnvelope::decode(br#"{"payload":"{}"}"#).is_err());
        assert!(WireEnvelope::decode(b"garbage").is_err());
    }

    #[test]
    fn envelope_ignores_unknown_fields() {
        let envelope = WireEnvelope::decode(
            br#"{"correlationId":"urn:uuid:x","payload":"{}","futureField":42}"#,
        )
        .unwrap();
        assert_eq!(envelope.correlation_id, "urn:uuid:x");
        assert_eq!(envelope.payload, "{}");
    }

    proptest! {
        #[test]
        fn raw_round_trip_never_reencodes(payload in ".*") {
            let task = Task::raw(payload.clone());
            prop_assert_eq!(task.raw_payload(), payload.as_str());
        }

        #[test]
        fn structured_round_trip(task_name in ".*", attempts in any::<u32>()) {
            let payload = Payload { task_name, attempts };
            let task = Task::new(&payload).unwrap();
            prop_assert_eq!(task.decoded_payload::<Payload>().unwrap(), payload);
        }
    }
}
