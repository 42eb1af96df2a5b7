//! Server-side JSON-RPC 1.1 and 2.0 request pipeline
//!
//! This crate turns an incoming request into a reply by running it through
//! four stages:
//!
//! - **Validation**: protocol grammar checks and method lookup
//! - **Binding**: params mapped onto the method's declared arguments
//! - **Dispatch**: the registry executes the method, wrapped in middleware
//! - **Response**: the result or error is enveloped for the request's version
//!
//! Methods live behind the [`MethodRegistry`] trait, which the host
//! application implements. The crate carries no transport; a shell (HTTP
//! handler, socket loop, test harness) feeds request text or values in and
//! writes the [`Reply`](duorpc_core::Reply) back.
//!
//! # Quick Start
//!
//! ```rust
//! use async_trait::async_trait;
//! use duorpc_core::{ArgumentSpec, BoundArguments, MethodDescriptor, Reply, Result};
//! use duorpc_server::{CallContext, MethodRegistry, RpcServer};
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Math;
//!
//! #[async_trait]
//! impl MethodRegistry for Math {
//!     fn lookup(&self, name: &str, _context: &CallContext) -> Option<MethodDescriptor> {
//!         (name == "math.add").then(|| {
//!             MethodDescriptor::new(name)
//!                 .arg(ArgumentSpec::required("a", "int"))
//!                 .arg(ArgumentSpec::required("b", "int"))
//!         })
//!     }
//!
//!     async fn execute(&self, _method: &MethodDescriptor, args: BoundArguments) -> Result<Value> {
//!         Ok(json!(args.parse::<i64>(0)? + args.parse::<i64>(1)?))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let server = RpcServer::builder().registry(Arc::new(Math)).build()?;
//!
//! let reply = server
//!     .handle_str(r#"{"jsonrpc":"2.0","method":"math.add","params":{"a":2,"b":3},"id":1}"#)
//!     .await?;
//! assert_eq!(reply, Reply::Body(r#"{"jsonrpc":"2.0","id":1,"result":5}"#.to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! # Protocol Versions
//!
//! The major version decides the rules. 2.0 forbids mixing positional and
//! named params and answers notifications (no id) with nothing. 1.x allows
//! mixing, rejects a value supplied both by position and by name, and always
//! answers.

mod batch;
mod binder;
mod builder;
mod dispatcher;
mod metrics;
mod middleware;
mod registry;
mod response;
mod validator;

pub use batch::{BatchMode, BatchProcessor};
pub use binder::bind;
pub use builder::ServerBuilder;
pub use dispatcher::Dispatcher;
pub use metrics::ServerMetrics;
pub use middleware::{
    LoggingMiddleware, MetricsMiddleware, Middleware, MiddlewareAction, MiddlewareChain,
    MiddlewareContext, SyncMiddleware,
};
pub use registry::{CallContext, MethodRegistry};
pub use response::{build_reply, build_response, error_body};
pub use validator::validate;

/// Re-exported for implementing [`MethodRegistry`] and [`Middleware`]
pub use async_trait::async_trait;

use duorpc_core::{Reply, Request, Result};
use serde_json::Value;
use std::sync::Arc;

/// Configured request pipeline
///
/// Cheap to clone; clones share the same dispatcher, so a server can be
/// handed to every task of a transport shell.
#[derive(Clone)]
pub struct RpcServer {
    dispatcher: Arc<Dispatcher>,
}

impl RpcServer {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Handle raw request text, single or batch
    pub async fn handle_str(&self, data: &str) -> Result<Reply> {
        self.dispatcher.handle_str(data).await
    }

    /// Handle one decoded request object
    pub async fn handle_value(&self, value: &Value) -> Result<Reply> {
        self.dispatcher.handle_value(value).await
    }

    pub async fn handle(&self, request: &Request) -> Result<Reply> {
        self.dispatcher.handle(request).await
    }

    /// Run a request and return the method result without enveloping it
    pub async fn call(&self, request: &Request) -> Result<Value> {
        self.dispatcher.call(request).await
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
