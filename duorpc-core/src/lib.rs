//! Core types for a dual JSON-RPC 1.1 / 2.0 server
//!
//! This crate provides the data model shared by the request pipeline:
//!
//! - **Request model**: decoded, immutable view of one call ([`Request`], [`Params`])
//! - **Descriptors**: method signatures and bound arguments ([`MethodDescriptor`], [`BoundArguments`])
//! - **Envelopes**: version-tagged responses ([`ResponseEnvelope`], [`Reply`])
//! - **Error handling**: the classified error taxonomy ([`Error`], [`ErrorObject`])
//! - **Codec**: text decoding and envelope encoding
//! - **Observability**: tracing subscriber and OpenTelemetry bootstrap
//!
//! # Protocol versions
//!
//! A request selects its protocol through the `jsonrpc` or `version` member
//! (default `"1.1"`). Versions starting with `2` get JSON-RPC 2.0 semantics:
//! no mixing of positional and named params, notifications without
//! response, and `"jsonrpc": "2.0"` on responses. Everything else is
//! handled as 1.1.
//!
//! # Example
//!
//! ```rust
//! use duorpc_core::{codec, Request};
//!
//! let incoming = codec::decode(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#).unwrap();
//! if let codec::Incoming::Single(value) = incoming {
//!     let request = Request::from_value(&value).unwrap();
//!     assert_eq!(request.method(), "ping");
//!     assert!(!request.is_notification());
//! }
//! ```

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod observability;
pub mod request;
pub mod types;

pub use descriptor::{ArgType, ArgumentSpec, BoundArguments, MethodDescriptor};
pub use error::{codes, ApplicationError, Error, ErrorObject, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use request::{ParamKey, Params, Request};
pub use types::{Id, Outcome, ProtocolVersion, Reply, ResponseEnvelope};
