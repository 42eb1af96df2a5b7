//! Request model
//!
//! A [`Request`] is the immutable, decoded view of one inbound call. It is
//! built once from the decoded JSON object handed over by the transport
//! shell and only read afterwards.
//!
//! # Parameter containers
//!
//! JSON-RPC lets a caller pass parameters as an array (positional) or as an
//! object (named). JSON-RPC 1.1 additionally allows an object whose keys are
//! decimal indices, optionally mixed with names:
//!
//! ```json
//! {"0": "x", "name": "y"}
//! ```
//!
//! [`Params`] keeps the container as received and [`ParamKey`] classifies
//! each key once, so the validator and binder never re-inspect raw key
//! strings.

use crate::error::{Error, Result};
use crate::types::{Id, ProtocolVersion};
use serde_json::{Map, Value};

/// Characters trimmed from both ends of a method name
const METHOD_TRIM: &[char] = &['"', '\''];

/// Parameter container of a request
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// `params` was a JSON array (or absent)
    Positional(Vec<Value>),
    /// `params` was a JSON object; keys may be names or decimal indices
    Named(Map<String, Value>),
}

/// Classified key of a parameter container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKey<'a> {
    /// Positional key: an array index, or a canonical decimal object key
    Index(usize),
    /// Named key
    Name(&'a str),
}

impl<'a> ParamKey<'a> {
    /// Classify an object key
    ///
    /// Only canonical decimal keys (`"0"`, `"12"`, not `"007"` or `"+1"`)
    /// are positional.
    pub fn classify(key: &'a str) -> Self {
        match key.parse::<usize>() {
            Ok(index) if key.bytes().all(|b| b.is_ascii_digit()) && index.to_string() == key => {
                ParamKey::Index(index)
            }
            _ => ParamKey::Name(key),
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, ParamKey::Index(_))
    }
}

impl std::fmt::Display for ParamKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKey::Index(index) => write!(f, "{}", index),
            ParamKey::Name(name) => write!(f, "{}", name),
        }
    }
}

impl Params {
    /// Interpret the raw `params` member
    ///
    /// Absent and `null` params become an empty positional list. Scalars
    /// are not parameter containers and yield `None`.
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) => Some(Params::Positional(Vec::new())),
            Some(Value::Array(items)) => Some(Params::Positional(items.clone())),
            Some(Value::Object(map)) => Some(Params::Named(map.clone())),
            Some(_) => None,
        }
    }

    /// Number of supplied parameters
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(items) => items.len(),
            Params::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over classified keys and their values, in received order
    pub fn iter(&self) -> Box<dyn Iterator<Item = (ParamKey<'_>, &Value)> + '_> {
        match self {
            Params::Positional(items) => {
                Box::new(items.iter().enumerate().map(|(i, v)| (ParamKey::Index(i), v)))
            }
            Params::Named(map) => Box::new(map.iter().map(|(k, v)| (ParamKey::classify(k), v))),
        }
    }

    /// Value supplied at a positional index
    pub fn by_index(&self, index: usize) -> Option<&Value> {
        match self {
            Params::Positional(items) => items.get(index),
            Params::Named(map) => map.get(&index.to_string()),
        }
    }

    /// Value supplied under a declared argument name
    pub fn by_name(&self, name: &str) -> Option<&Value> {
        match self {
            Params::Positional(_) => None,
            Params::Named(map) => map.get(name),
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

/// Decoded view of one inbound call
///
/// # Examples
///
/// ```rust
/// use duorpc_core::{Params, Request};
/// use serde_json::json;
///
/// let request = Request::from_value(&json!({
///     "jsonrpc": "2.0",
///     "method": " \"echo\" ",
///     "params": ["hi"],
///     "id": 1
/// }))
/// .unwrap();
///
/// assert_eq!(request.method(), "echo");
/// assert!(request.version().is_v2());
/// assert_eq!(request.params(), Some(&Params::Positional(vec![json!("hi")])));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    id: Option<Id>,
    method: String,
    version: ProtocolVersion,
    params: Option<Params>,
}

impl Request {
    /// Create a request programmatically
    pub fn new(
        method: impl AsRef<str>,
        params: Params,
        id: Option<Id>,
        version: ProtocolVersion,
    ) -> Self {
        Self {
            id,
            method: trim_method(method.as_ref()),
            version,
            params: Some(params),
        }
    }

    /// Build a request from a decoded JSON object, defaulting to version 1.1
    pub fn from_value(value: &Value) -> Result<Self> {
        Self::from_value_with_default(value, &ProtocolVersion::default())
    }

    /// Build a request from a decoded JSON object
    ///
    /// Fails only when the value is not an object or the `id` member is not a
    /// scalar. Everything else (empty method, scalar params) is left for the
    /// validator so errors are reported in pipeline order.
    pub fn from_value_with_default(value: &Value, default_version: &ProtocolVersion) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidRequest("Request must be a JSON object".to_string()))?;

        let id = Id::from_value(obj.get("id").unwrap_or(&Value::Null)).map_err(|bad| {
            Error::InvalidRequest(format!("Request id must be a scalar, got {}", bad))
        })?;

        let method = match obj.get("method") {
            Some(Value::String(name)) => trim_method(name),
            _ => String::new(),
        };

        let version = obj
            .get("jsonrpc")
            .or_else(|| obj.get("version"))
            .and_then(version_string)
            .map(ProtocolVersion::new)
            .unwrap_or_else(|| default_version.clone());

        Ok(Self {
            id,
            method,
            version,
            params: Params::from_value(obj.get("params")),
        })
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn version(&self) -> &ProtocolVersion {
        &self.version
    }

    /// Parameter container, or `None` when `params` was a scalar
    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    /// True for a 2.0 request without identifier
    pub fn is_notification(&self) -> bool {
        self.version.is_v2() && self.id.is_none()
    }
}

fn trim_method(name: &str) -> String {
    name.trim_matches(|c: char| c.is_whitespace() || METHOD_TRIM.contains(&c))
        .to_string()
}

fn version_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
