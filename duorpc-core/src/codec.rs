//! Codec for request decoding and envelope encoding
//!
//! The pipeline works on decoded values; this module is the thin layer
//! between those values and JSON text.
//!
//! # Batch Messages
//!
//! A top-level JSON array is a JSON-RPC 2.0 batch. [`decode`] detects it and
//! returns the items as raw values so that each one is validated on its own.
//!
//! # Examples
//!
//! ```rust
//! use duorpc_core::codec::{self, Incoming};
//!
//! let incoming = codec::decode(r#"{"method":"ping","id":1}"#).unwrap();
//! assert!(matches!(incoming, Incoming::Single(_)));
//!
//! assert!(codec::decode("{not json").is_err());
//! ```

use crate::error::{codes, Error, ErrorObject, Result};
use crate::types::{Outcome, ProtocolVersion, ResponseEnvelope};
use serde::Serialize;
use serde_json::Value;

/// Decoded top-level message
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A single request object (not yet validated)
    Single(Value),
    /// A non-empty batch of raw request values
    Batch(Vec<Value>),
}

/// Decode request text
///
/// # Errors
///
/// Returns `Error::Parse` if the text is not valid JSON. A top-level array,
/// including an empty one, decodes to [`Incoming::Batch`].
pub fn decode(data: &str) -> Result<Incoming> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        tracing::debug!(error = %e, "Request text is not valid JSON");
        Error::Parse("Parse error".to_string())
    })?;

    match value {
        Value::Array(items) => Ok(Incoming::Batch(items)),
        other => Ok(Incoming::Single(other)),
    }
}

/// Encode any serializable message to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a response envelope
pub fn encode_envelope(envelope: &ResponseEnvelope) -> Result<String> {
    encode(envelope)
}

/// Encode a batch of already-serialized envelopes as a JSON array
///
/// Parts are joined verbatim, which avoids re-parsing bodies produced by
/// the single-call path.
pub fn encode_batch(parts: &[String]) -> String {
    format!("[{}]", parts.join(","))
}

/// Body to send when building a proper envelope failed
///
/// This is the generic internal-error envelope for failures outside the
/// pipeline's control. It never fails.
pub fn internal_error_body() -> String {
    let envelope = ResponseEnvelope::new(
        &ProtocolVersion::default(),
        None,
        Outcome::Failure(ErrorObject::new(codes::INTERNAL_ERROR, "Internal error")),
    );
    encode(&envelope).unwrap_or_else(|_| {
        format!(
            r#"{{"version":"1.1","error":{{"name":"JSONRPCError","code":{},"message":"Internal error"}}}}"#,
            codes::INTERNAL_ERROR
        )
    })
}
