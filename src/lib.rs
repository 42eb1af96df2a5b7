//! duorpc - JSON-RPC 1.1 and 2.0 request pipeline
//!
//! This is the convenience crate that re-exports the duorpc sub-crates. Use
//! it if you want a single dependency for the whole pipeline.
//!
//! # Architecture
//!
//! - **duorpc-core**: Request model, method descriptors, errors, codec, observability
//! - **duorpc-server**: Registry trait, validator, binder, dispatcher, batches, middleware
//!
//! # Quick Start
//!
//! ```rust
//! use duorpc::core::{ArgumentSpec, BoundArguments, MethodDescriptor, Result};
//! use duorpc::server::{async_trait, CallContext, MethodRegistry};
//! use duorpc::RpcServer;
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl MethodRegistry for Greeter {
//!     fn lookup(&self, name: &str, _context: &CallContext) -> Option<MethodDescriptor> {
//!         (name == "greet").then(|| {
//!             MethodDescriptor::new(name).arg(ArgumentSpec::optional(
//!                 "name",
//!                 "string",
//!                 Some(json!("world")),
//!             ))
//!         })
//!     }
//!
//!     async fn execute(&self, _method: &MethodDescriptor, args: BoundArguments) -> Result<Value> {
//!         Ok(json!(format!("Hello, {}!", args.parse::<String>(0)?)))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let server = RpcServer::builder().registry(Arc::new(Greeter)).build()?;
//! let reply = server.handle_str(r#"{"version":"1.1","method":"greet","id":1}"#).await?;
//! assert_eq!(reply.body(), Some(r#"{"version":"1.1","id":1,"result":"Hello, world!"}"#));
//! # Ok(())
//! # }
//! ```

pub use duorpc_core as core;
pub use duorpc_server as server;

// Convenience re-exports of the most commonly used types
pub use duorpc_core::{Error, Reply, Request, Result};
pub use duorpc_server::{MethodRegistry, RpcServer};
