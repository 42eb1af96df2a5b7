//! Error types for duorpc
//!
//! This module provides the single failure channel of the request pipeline.
//! It defines three types:
//!
//! - **Error**: Classified pipeline error (uses thiserror)
//! - **ApplicationError**: Failure raised by a method implementation behind the registry
//! - **ErrorObject**: Wire-format error as it appears inside a response envelope
//!
//! # Error Codes
//!
//! Both JSON-RPC 1.1 and 2.0 share the same reserved codes:
//! - `-32700`: Parse error (invalid JSON, or params that are not an array or object)
//! - `-32600`: Invalid request (missing method)
//! - `-32601`: Procedure not found
//! - `-32602`: Invalid params (count, naming, mixing or type violations)
//! - `-32603`: Internal error
//!
//! Application-defined codes are passed through unchanged.
//!
//! # Examples
//!
//! ```rust
//! use duorpc_core::{Error, ErrorObject};
//!
//! let error = Error::ProcedureNotFound("system.unknown".into());
//! assert_eq!(error.code(), -32601);
//!
//! let wire = ErrorObject::from(&error);
//! assert_eq!(wire.name, "JSONRPCError");
//! assert_eq!(wire.code, -32601);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for duorpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reserved JSON-RPC error codes
pub mod codes {
    /// Invalid JSON was received, or params were not a container
    pub const PARSE: i32 = -32700;
    /// The JSON sent is not a valid request object
    pub const REQUEST: i32 = -32600;
    /// The procedure does not exist in the registry
    pub const PROCEDURE_NOT_FOUND: i32 = -32601;
    /// Invalid method parameter(s)
    pub const PARAMS: i32 = -32602;
    /// Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Name carried by every wire error object
pub const ERROR_NAME: &str = "JSONRPCError";

/// Classified error raised anywhere in the validate, bind, dispatch pipeline
///
/// Every variant maps to exactly one wire code through [`Error::code`].
/// Validation and binding stop at the first variant produced; errors are
/// never aggregated.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Input could not be parsed as JSON, or params were a scalar
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request object is malformed (missing method, non-scalar id, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The method name is unknown to the registry for this endpoint
    #[error("Procedure not found: {0}")]
    ProcedureNotFound(String),

    /// Parameter count, naming, mixing or type violation
    ///
    /// `data` carries structured diagnostics (offending key, expected type, ...)
    /// and is copied into the wire error object.
    #[error("Invalid params: {message}")]
    InvalidParams {
        /// Human-readable description of the violation
        message: String,
        /// Optional diagnostics
        data: Option<Value>,
    },

    /// Failure reported by the method implementation itself
    #[error("{0}")]
    Application(ApplicationError),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Uncategorized internal failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Batch request size exceeded the configured limit
    #[error("Batch size limit exceeded: limit={limit}, actual={actual}")]
    BatchSizeExceeded {
        /// The maximum allowed batch size
        limit: usize,
        /// The actual batch size that was rejected
        actual: usize,
    },
}

impl Error {
    /// Invalid params error without diagnostics
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Error::InvalidParams {
            message: message.into(),
            data: None,
        }
    }

    /// Invalid params error with structured diagnostics
    pub fn invalid_params_with_data(message: impl Into<String>, data: Value) -> Self {
        Error::InvalidParams {
            message: message.into(),
            data: Some(data),
        }
    }

    /// Wire code for this error
    ///
    /// Application errors keep their own code when they carry one and fall
    /// back to `INTERNAL_ERROR` otherwise.
    pub fn code(&self) -> i32 {
        match self {
            Error::Parse(_) => codes::PARSE,
            Error::InvalidRequest(_) | Error::BatchSizeExceeded { .. } => codes::REQUEST,
            Error::ProcedureNotFound(_) => codes::PROCEDURE_NOT_FOUND,
            Error::InvalidParams { .. } => codes::PARAMS,
            Error::Application(app) => app.code.unwrap_or(codes::INTERNAL_ERROR),
            Error::Serialization(_) | Error::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Short label used for log fields and metric attributes
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(_) => "parse",
            Error::InvalidRequest(_) => "invalid_request",
            Error::ProcedureNotFound(_) => "procedure_not_found",
            Error::InvalidParams { .. } => "invalid_params",
            Error::Application(_) => "application",
            Error::Serialization(_) => "serialization",
            Error::Internal(_) => "internal",
            Error::BatchSizeExceeded { .. } => "batch_size_exceeded",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<ApplicationError> for Error {
    fn from(err: ApplicationError) -> Self {
        Error::Application(err)
    }
}

/// Failure raised by a method implementation
///
/// A registry returns this (wrapped in [`Error::Application`]) when the
/// invoked method fails in a way it wants reported to the caller. When
/// `code` is `None` the dispatcher reports `INTERNAL_ERROR`.
///
/// ```rust
/// use duorpc_core::ApplicationError;
/// use serde_json::json;
///
/// let err = ApplicationError::new("Insufficient funds")
///     .with_code(1001)
///     .with_data(json!({"balance": 50}));
/// assert_eq!(err.code, Some(1001));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationError {
    /// Application-defined code, passed through unchanged when present
    pub code: Option<i32>,
    /// Human-readable message
    pub message: String,
    /// Optional application diagnostics
    pub data: Option<Value>,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "Application error [{}]: {}", code, self.message),
            None => write!(f, "Application error: {}", self.message),
        }
    }
}

impl std::error::Error for ApplicationError {}

/// Wire-format error object
///
/// This is the exact shape placed in the `error` member of a response
/// envelope, for both protocol versions:
///
/// ```json
/// {"name": "JSONRPCError", "code": -32602, "message": "...", "data": {...}}
/// ```
///
/// `data` is omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Always `"JSONRPCError"`
    pub name: String,
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Create a new error object with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            name: ERROR_NAME.to_string(),
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new error object with additional data
    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::new(code, message)
        }
    }
}

impl From<&Error> for ErrorObject {
    /// Convert a classified error into its wire object
    ///
    /// Messages are the bare description without the variant prefix that
    /// `Display` adds, so clients see e.g. `"Procedure not found: foo"` only
    /// once.
    fn from(err: &Error) -> Self {
        let code = err.code();
        match err {
            Error::Parse(msg) | Error::InvalidRequest(msg) | Error::Internal(msg) => {
                ErrorObject::new(code, msg.clone())
            }
            Error::ProcedureNotFound(method) => {
                ErrorObject::new(code, format!("Procedure not found: {}", method))
            }
            Error::InvalidParams { message, data } => match data {
                Some(data) => ErrorObject::with_data(code, message.clone(), data.clone()),
                None => ErrorObject::new(code, message.clone()),
            },
            Error::Application(app) => match &app.data {
                Some(data) => ErrorObject::with_data(code, app.message.clone(), data.clone()),
                None => ErrorObject::new(code, app.message.clone()),
            },
            Error::Serialization(_) | Error::BatchSizeExceeded { .. } => {
                ErrorObject::new(code, err.to_string())
            }
        }
    }
}

impl From<Error> for ErrorObject {
    fn from(err: Error) -> Self {
        ErrorObject::from(&err)
    }
}

impl std::fmt::Display for ErrorObject {
    /// Formats as "[code] message", e.g. "[-32601] Procedure not found: foo"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
