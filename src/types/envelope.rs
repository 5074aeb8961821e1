//! Wire envelopes exchanged over the duplex stream and the unary calls.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::input::{HashResult, InputEncoding};

/// A fully resolved input ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedInput {
    pub affiliate: String,
    pub correlation_id: String,
    pub data: Bytes,
    /// Resolved payload format, e.g. `"raw-rgb8"` or `"png"`.
    pub format: String,
    pub encoding: InputEncoding,
    pub hashes: Vec<HashResult>,
}

/// One outbound write on the duplex stream.
///
/// An envelope with an empty input list is the keep-warm heartbeat form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub deployment_id: String,
    pub inputs: Vec<PreparedInput>,
}

impl RequestEnvelope {
    /// The keep-warm form: deployment id, no inputs.
    pub fn heartbeat(deployment_id: impl Into<String>) -> Self {
        Self {
            deployment_id: deployment_id.into(),
            inputs: Vec::new(),
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// One classification label and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub weight: f64,
}

/// The result for a single submitted input. Results arrive in arbitrary
/// order, interleaved with results for other inputs; callers must join on
/// `correlation_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputResult {
    pub correlation_id: String,
    #[serde(default)]
    pub classifications: Vec<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One inbound message on the duplex stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Request-level error; set when the whole envelope was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub results: Vec<InputResult>,
}

/// Read-only snapshot of a server-side processing context. Never cached;
/// re-fetched on every listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub deployment_id: String,
    /// Number of inputs queued server-side for this deployment.
    pub backlog: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_envelope_shape() {
        let envelope = RequestEnvelope::heartbeat("dep-1");
        assert!(envelope.is_heartbeat());
        assert_eq!(envelope.deployment_id, "dep-1");
    }

    #[test]
    fn test_response_envelope_optional_fields() {
        let json = r#"{"results":[{"correlation_id":"abc"}]}"#;
        let envelope: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.error.is_none());
        assert_eq!(envelope.results.len(), 1);
        assert!(envelope.results[0].classifications.is_empty());
        assert!(envelope.results[0].error.is_none());
    }
}
