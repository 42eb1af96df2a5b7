//! Identifier, protocol version and response envelope types
//!
//! These are the wire-facing data structures shared by JSON-RPC 1.1 and 2.0.
//! The two protocols differ only in how a response is tagged:
//!
//! - **1.1**: `{"version": "1.1", "id": ..., "result": ...}`
//! - **2.0**: `{"jsonrpc": "2.0", "id": ..., "result": ...}`
//!
//! and in the notification rule: a 2.0 request without an identifier never
//! gets a response at all.

use crate::error::ErrorObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Request identifier
///
/// Identifiers are JSON scalars. An absent id, a JSON `null` and an empty
/// string all mean "no identifier" and are represented as `Option::None`
/// by the request model, so an `Id` value is always a real identifier.
/// Numeric `0` and `false` are real identifiers.
///
/// # Examples
///
/// ```rust
/// use duorpc_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Numeric identifier, integer or float, preserved as received
    Number(serde_json::Number),
    /// Boolean identifier, accepted for 1.1 compatibility
    Bool(bool),
}

impl Id {
    /// Extract an identifier from the raw `id` member of a request
    ///
    /// Returns `Ok(None)` when there is no usable identifier and `Err` with
    /// the offending value when the member is an array or object.
    pub fn from_value(value: &Value) -> std::result::Result<Option<Id>, &Value> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => Ok(Some(Id::String(s.clone()))),
            Value::Number(n) => Ok(Some(Id::Number(n.clone()))),
            Value::Bool(b) => Ok(Some(Id::Bool(*b))),
            Value::Array(_) | Value::Object(_) => Err(value),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n.into())
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n.into())
    }
}

/// Declared protocol version of a request
///
/// Taken from the `jsonrpc` member, else `version`, else [`ProtocolVersion::DEFAULT`].
/// Only the first character matters for behavior: a version starting with
/// `2` selects JSON-RPC 2.0 semantics, anything else is handled as 1.x.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    /// Version assumed when a request declares none
    pub const DEFAULT: &'static str = "1.1";
    /// Tag placed in the `version` member of 1.x responses
    pub const V1_TAG: &'static str = "1.1";
    /// Tag placed in the `jsonrpc` member of 2.0 responses
    pub const V2_TAG: &'static str = "2.0";

    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// JSON-RPC 2.0 version
    pub fn v2() -> Self {
        Self::new(Self::V2_TAG)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Major version derived from the first character
    ///
    /// A first character that is not a digit yields 1.
    pub fn major(&self) -> u32 {
        self.0
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .filter(|major| *major > 0)
            .unwrap_or(1)
    }

    pub fn is_v2(&self) -> bool {
        self.major() == 2
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProtocolVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Result or error of a call
///
/// Flattened into the envelope, so the two members are mutually exclusive
/// by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// `"result": value`
    #[serde(rename = "result")]
    Success(Value),
    /// `"error": {...}`
    #[serde(rename = "error")]
    Failure(ErrorObject),
}

/// Response envelope for either protocol version
///
/// Exactly one of `jsonrpc` / `version` is set, and `id` is omitted when
/// the request carried none. Build it with [`ResponseEnvelope::new`] so the
/// tagging stays consistent.
///
/// # Examples
///
/// ```rust
/// use duorpc_core::{Id, Outcome, ProtocolVersion, ResponseEnvelope};
/// use serde_json::json;
///
/// let envelope = ResponseEnvelope::new(
///     &ProtocolVersion::v2(),
///     Some(Id::from(7i64)),
///     Outcome::Success(json!("pong")),
/// );
/// let text = serde_json::to_string(&envelope).unwrap();
/// assert_eq!(text, r#"{"jsonrpc":"2.0","id":7,"result":"pong"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// `"2.0"` on 2.0 responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// `"1.1"` on 1.x responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Identifier copied from the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// Result or error
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ResponseEnvelope {
    /// Create an envelope tagged for the given protocol version
    pub fn new(version: &ProtocolVersion, id: Option<Id>, outcome: Outcome) -> Self {
        let (jsonrpc, version) = if version.is_v2() {
            (Some(ProtocolVersion::V2_TAG.to_string()), None)
        } else {
            (None, Some(ProtocolVersion::V1_TAG.to_string()))
        };
        Self {
            jsonrpc,
            version,
            id,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }

    /// Result value, if this is a success envelope
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    /// Error object, if this is an error envelope
    pub fn error(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(err) => Some(err),
        }
    }
}

/// What the transport shell should send back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Serialized envelope (or batch of envelopes) to use as the body
    Body(String),
    /// Nothing to send: complete the exchange with an empty success response
    NoContent,
}

impl Reply {
    pub fn body(&self) -> Option<&str> {
        match self {
            Reply::Body(body) => Some(body),
            Reply::NoContent => None,
        }
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, Reply::NoContent)
    }
}
