//! Method registry contract
//!
//! The registry is an external collaborator: it owns method descriptors and
//! the implementations behind them. The pipeline only needs two operations:
//!
//! - **lookup**: resolve a method name, for a given endpoint, to its descriptor
//! - **execute**: run a descriptor with bound arguments
//!
//! Implementations must be `Send + Sync`; the dispatcher shares one registry
//! across all concurrent calls and never mutates it. Any shared state behind
//! `execute` is the registry's own concern.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use duorpc_core::{ArgumentSpec, BoundArguments, MethodDescriptor, Result};
//! use duorpc_server::{CallContext, MethodRegistry};
//! use serde_json::{json, Value};
//!
//! struct Clock;
//!
//! #[async_trait]
//! impl MethodRegistry for Clock {
//!     fn lookup(&self, name: &str, _context: &CallContext) -> Option<MethodDescriptor> {
//!         (name == "clock.offset")
//!             .then(|| MethodDescriptor::new(name).arg(ArgumentSpec::required("hours", "int")))
//!     }
//!
//!     async fn execute(&self, _method: &MethodDescriptor, args: BoundArguments) -> Result<Value> {
//!         let hours: i64 = args.parse(0)?;
//!         Ok(json!({"offset_seconds": hours * 3600}))
//!     }
//! }
//! ```

use async_trait::async_trait;
use duorpc_core::{BoundArguments, MethodDescriptor, Result};
use serde_json::Value;

/// Endpoint the call arrived on
///
/// Registries may expose different method sets per endpoint; the context
/// is passed to every lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    endpoint: String,
}

impl CallContext {
    /// Endpoint name used when none is configured
    pub const DEFAULT_ENDPOINT: &'static str = "default";

    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ENDPOINT)
    }
}

/// Lookup and execution service for callable methods
#[async_trait]
pub trait MethodRegistry: Send + Sync {
    /// Resolve a method name for the given context
    ///
    /// Returns `None` when the method does not exist on this endpoint.
    fn lookup(&self, name: &str, context: &CallContext) -> Option<MethodDescriptor>;

    /// Execute a resolved method
    ///
    /// `args` holds exactly one value per declared argument. Return
    /// [`duorpc_core::Error::Application`] for failures that should reach the
    /// caller with an application code; any other error is reported as an
    /// internal error unless it is already protocol-classified.
    async fn execute(&self, method: &MethodDescriptor, args: BoundArguments) -> Result<Value>;
}
