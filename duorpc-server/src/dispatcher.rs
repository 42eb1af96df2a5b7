//! Call dispatch
//!
//! The dispatcher owns the registry handle and runs each call through
//! validate → bind → execute → respond. Every failure along the way is
//! folded into an error envelope, so callers only see `Err` when an envelope
//! itself could not be serialized.
//!
//! Three entry points exist, one per input shape:
//!
//! - [`Dispatcher::handle_str`] for raw JSON text, batches included
//! - [`Dispatcher::handle_value`] for an already decoded request object
//! - [`Dispatcher::handle`] for a constructed [`Request`]
//!
//! [`Dispatcher::call`] runs the same pipeline but returns the method result
//! (or the classified error) instead of an envelope.

use crate::batch::BatchProcessor;
use crate::binder::bind;
use crate::metrics::ServerMetrics;
use crate::middleware::{MiddlewareChain, MiddlewareContext};
use crate::registry::{CallContext, MethodRegistry};
use crate::response::{build_response, error_body, failure};
use crate::validator::validate;
use duorpc_core::codec::{self, Incoming};
use duorpc_core::{Error, Outcome, ProtocolVersion, Reply, Request, Result};
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Request pipeline bound to one registry and endpoint
pub struct Dispatcher {
    registry: Arc<dyn MethodRegistry>,
    context: CallContext,
    default_version: ProtocolVersion,
    middleware: MiddlewareChain,
    batch: BatchProcessor,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Dispatcher {
    /// Dispatcher on the default endpoint with no middleware
    pub fn new(registry: Arc<dyn MethodRegistry>) -> Self {
        Self {
            registry,
            context: CallContext::default(),
            default_version: ProtocolVersion::default(),
            middleware: MiddlewareChain::new(),
            batch: BatchProcessor::default(),
            metrics: None,
        }
    }

    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }

    /// Version assumed when a request declares none
    pub fn with_default_version(mut self, version: ProtocolVersion) -> Self {
        self.default_version = version;
        self
    }

    pub fn with_middleware(mut self, middleware: MiddlewareChain) -> Self {
        self.middleware = middleware;
        self
    }

    pub fn with_batch(mut self, batch: BatchProcessor) -> Self {
        self.batch = batch;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    pub fn default_version(&self) -> &ProtocolVersion {
        &self.default_version
    }

    pub(crate) fn metrics(&self) -> Option<&ServerMetrics> {
        self.metrics.as_deref()
    }

    /// Handle raw request text
    ///
    /// Invalid JSON and empty batches are answered with an error envelope. A
    /// top-level array is processed as a batch.
    pub async fn handle_str(&self, data: &str) -> Result<Reply> {
        match codec::decode(data) {
            Ok(Incoming::Single(value)) => self.handle_value(&value).await,
            Ok(Incoming::Batch(items)) => self.batch.process(self, items).await,
            Err(err) => self.reject(&err, &self.default_version),
        }
    }

    /// Handle one decoded request value
    pub async fn handle_value(&self, value: &Value) -> Result<Reply> {
        match Request::from_value_with_default(value, &self.default_version) {
            Ok(request) => self.handle(&request).await,
            Err(err) => self.reject(&err, &self.default_version),
        }
    }

    /// Handle a request and build its reply
    #[tracing::instrument(
        skip(self, request),
        fields(method = %request.method(), version = %request.version(), id = ?request.id())
    )]
    pub async fn handle(&self, request: &Request) -> Result<Reply> {
        let start = Instant::now();

        let outcome = match self.call(request).await {
            Ok(value) => Outcome::Success(value),
            Err(err) => {
                self.report(&err);
                failure(&err)
            }
        };

        if let Some(metrics) = self.metrics() {
            let status = match outcome {
                Outcome::Success(_) => "success",
                Outcome::Failure(_) => "error",
            };
            metrics.record_call(request.method(), status, start.elapsed().as_secs_f64());
        }

        let reply = build_response(outcome, request)?;
        if reply.is_no_content() {
            tracing::debug!("Notification processed, reply suppressed");
            if let Some(metrics) = self.metrics() {
                metrics.record_notification(request.method());
            }
        }

        Ok(reply)
    }

    /// Run the pipeline and return the method result
    ///
    /// A panic inside the registry's `execute` is reported as an internal
    /// error carrying the panic message.
    pub async fn call(&self, request: &Request) -> Result<Value> {
        let descriptor = validate(request, self.registry.as_ref(), &self.context)?;
        tracing::debug!(arguments = descriptor.argument_count(), "Request validated");

        let arguments = bind(request, &descriptor)?;
        tracing::debug!(bound = arguments.len(), "Arguments bound");

        let registry = &self.registry;
        let descriptor = &descriptor;
        let ctx = MiddlewareContext::for_request(request, arguments);

        self.middleware
            .execute(ctx, move |ctx| async move {
                AssertUnwindSafe(registry.execute(descriptor, ctx.arguments))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(Error::Internal(panic_message(panic))))
            })
            .await
    }

    /// Error envelope for input that never became a request
    fn reject(&self, err: &Error, version: &ProtocolVersion) -> Result<Reply> {
        self.report(err);
        error_body(err, version)
    }

    fn report(&self, err: &Error) {
        match err {
            Error::Internal(_) | Error::Serialization(_) => {
                tracing::error!(code = err.code(), error = %err, "Call failed")
            }
            _ => tracing::warn!(code = err.code(), kind = err.kind(), error = %err, "Call rejected"),
        }
        if let Some(metrics) = self.metrics() {
            metrics.record_error(err.kind());
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Method panicked".to_string()
    }
}
