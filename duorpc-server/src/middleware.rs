//! Middleware around method execution
//!
//! Middleware intercepts the registry `execute` step of a call. By the time
//! it runs, the request has been validated and its arguments bound, so a
//! middleware sees the final [`BoundArguments`] and may rewrite them,
//! short-circuit the call with its own result, or observe the outcome.
//!
//! Common uses:
//! - Logging and auditing
//! - Caching of idempotent methods
//! - Call counting and latency measurement
//!
//! # Middleware Chain
//!
//! `pre_handle` runs in registration order, then the method, then
//! `post_handle` in reverse order. A `ShortCircuit` skips the method and
//! the remaining middleware.
//!
//! # Examples
//!
//! ```rust
//! use duorpc_server::{LoggingMiddleware, MiddlewareChain};
//!
//! let mut chain = MiddlewareChain::new();
//! chain.add_sync(LoggingMiddleware);
//! assert_eq!(chain.len(), 1);
//! ```

use async_trait::async_trait;
use duorpc_core::{BoundArguments, Id, ProtocolVersion, Request, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Action to take after middleware pre-processing
#[derive(Debug, Clone)]
pub enum MiddlewareAction {
    /// Continue to next middleware/method
    Continue,
    /// Skip the method and use this value as the call result
    ShortCircuit(Value),
}

/// Call information passed through the chain
#[derive(Debug, Clone)]
pub struct MiddlewareContext {
    /// The method being called
    pub method: String,
    /// Declared protocol version of the call
    pub version: ProtocolVersion,
    /// Request identifier, if any
    pub request_id: Option<Id>,
    /// Arguments handed to the registry
    pub arguments: BoundArguments,
    /// Metadata for passing data between middleware
    pub metadata: HashMap<String, Value>,
    /// When the call entered the chain
    pub started_at: Instant,
}

impl MiddlewareContext {
    pub fn new(method: impl Into<String>, arguments: BoundArguments) -> Self {
        Self {
            method: method.into(),
            version: ProtocolVersion::default(),
            request_id: None,
            arguments,
            metadata: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Context for a validated request
    pub fn for_request(request: &Request, arguments: BoundArguments) -> Self {
        Self {
            method: request.method().to_string(),
            version: request.version().clone(),
            request_id: request.id().cloned(),
            arguments,
            metadata: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

/// Trait for async middleware
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Called before the method runs
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction>;

    /// Called after the method ran; errors returned here are ignored
    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()>;
}

/// Trait for synchronous middleware
pub trait SyncMiddleware: Send + Sync {
    fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction>;

    fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()>;
}

struct SyncMiddlewareAdapter<T: SyncMiddleware> {
    inner: T,
}

#[async_trait]
impl<T: SyncMiddleware + 'static> Middleware for SyncMiddlewareAdapter<T> {
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
        self.inner.pre_handle(ctx)
    }

    async fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()> {
        self.inner.post_handle(ctx, result)
    }
}

/// Chain of middleware to execute in order
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub fn add_sync<T: SyncMiddleware + 'static>(&mut self, middleware: T) {
        self.middlewares
            .push(Arc::new(SyncMiddlewareAdapter { inner: middleware }));
    }

    /// Run the chain around `method`
    ///
    /// A failing `pre_handle` aborts the call with its error.
    pub async fn execute<F, Fut>(&self, mut ctx: MiddlewareContext, method: F) -> Result<Value>
    where
        F: FnOnce(MiddlewareContext) -> Fut + Send,
        Fut: std::future::Future<Output = Result<Value>> + Send,
    {
        for middleware in &self.middlewares {
            if let MiddlewareAction::ShortCircuit(value) = middleware.pre_handle(&mut ctx).await? {
                return Ok(value);
            }
        }

        let result = method(ctx.clone()).await;

        for middleware in self.middlewares.iter().rev() {
            if let Err(e) = middleware.post_handle(&mut ctx, &result).await {
                tracing::warn!(method = %ctx.method, error = %e, "post_handle failed");
            }
        }

        result
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }
}

/// Logs every call and its outcome through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl SyncMiddleware for LoggingMiddleware {
    fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
        tracing::info!(
            method = %ctx.method,
            version = %ctx.version,
            request_id = ?ctx.request_id,
            arguments = ctx.arguments.len(),
            "Call started"
        );
        Ok(MiddlewareAction::Continue)
    }

    fn post_handle(&self, ctx: &mut MiddlewareContext, result: &Result<Value>) -> Result<()> {
        match result {
            Ok(_) => tracing::info!(method = %ctx.method, "Call succeeded"),
            Err(e) => tracing::warn!(method = %ctx.method, error = %e, "Call failed"),
        }
        Ok(())
    }
}

/// Counts calls and records each call's duration in the context metadata
///
/// The start time is kept in [`MiddlewareContext::started_at`].
pub struct MetricsMiddleware {
    call_count: AtomicU64,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self {
            call_count: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Middleware for MetricsMiddleware {
    async fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        ctx.started_at = Instant::now();
        Ok(MiddlewareAction::Continue)
    }

    async fn post_handle(&self, ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
        let elapsed_ms = ctx.started_at.elapsed().as_secs_f64() * 1000.0;
        ctx.insert_metadata("metrics.duration_ms", Value::from(elapsed_ms));
        tracing::debug!(method = %ctx.method, duration_ms = elapsed_ms, "Call timed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duorpc_core::Error;
    use serde_json::json;

    struct TagMiddleware {
        name: String,
    }

    impl TagMiddleware {
        fn new(name: impl Into<String>) -> Self {
            Self { name: name.into() }
        }
    }

    impl SyncMiddleware for TagMiddleware {
        fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            ctx.insert_metadata(format!("{}_pre", self.name), Value::Bool(true));
            Ok(MiddlewareAction::Continue)
        }

        fn post_handle(&self, ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            ctx.insert_metadata(format!("{}_post", self.name), Value::Bool(true));
            Ok(())
        }
    }

    struct ShortCircuitMiddleware;

    impl SyncMiddleware for ShortCircuitMiddleware {
        fn pre_handle(&self, _ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            Ok(MiddlewareAction::ShortCircuit(json!("cached")))
        }

        fn post_handle(&self, _ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            Ok(())
        }
    }

    struct DoubleFirstArgument;

    impl SyncMiddleware for DoubleFirstArgument {
        fn pre_handle(&self, ctx: &mut MiddlewareContext) -> Result<MiddlewareAction> {
            let n = ctx.arguments.parse::<i64>(0)?;
            ctx.arguments = BoundArguments::from(vec![json!(n * 2)]);
            Ok(MiddlewareAction::Continue)
        }

        fn post_handle(&self, _ctx: &mut MiddlewareContext, _result: &Result<Value>) -> Result<()> {
            Ok(())
        }
    }

    fn ctx() -> MiddlewareContext {
        MiddlewareContext::new("test_method", BoundArguments::from(vec![json!(21)]))
    }

    #[tokio::test]
    async fn test_pre_handle_order() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(TagMiddleware::new("first"));
        chain.add_sync(TagMiddleware::new("second"));

        let result = chain
            .execute(ctx(), |ctx| async move {
                assert!(ctx.get_metadata("first_pre").is_some());
                assert!(ctx.get_metadata("second_pre").is_some());
                Ok(json!("done"))
            })
            .await;

        assert_eq!(result.unwrap(), json!("done"));
    }

    #[tokio::test]
    async fn test_short_circuit_skips_method() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(TagMiddleware::new("first"));
        chain.add_sync(ShortCircuitMiddleware);

        let result = chain
            .execute(ctx(), |_ctx| async move { Err(Error::Internal("method ran".into())) })
            .await;

        assert_eq!(result.unwrap(), json!("cached"));
    }

    #[tokio::test]
    async fn test_arguments_can_be_rewritten() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(DoubleFirstArgument);

        let result = chain
            .execute(ctx(), |ctx| async move { Ok(ctx.arguments.get(0).cloned().unwrap_or_default()) })
            .await;

        assert_eq!(result.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn test_method_error_propagates() {
        let mut chain = MiddlewareChain::new();
        chain.add_sync(LoggingMiddleware::new());

        let result = chain
            .execute(ctx(), |_ctx| async move { Err(Error::Internal("boom".into())) })
            .await;

        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_metrics_middleware_counts() {
        let metrics = Arc::new(MetricsMiddleware::new());
        let mut chain = MiddlewareChain::new();
        chain.add(metrics.clone());

        for _ in 0..3 {
            chain
                .execute(ctx(), |_ctx| async move { Ok(Value::Null) })
                .await
                .unwrap();
        }

        assert_eq!(metrics.call_count(), 3);
    }

    #[tokio::test]
    async fn test_metrics_middleware_records_duration() {
        let metrics = MetricsMiddleware::new();
        let mut ctx = ctx();

        metrics.pre_handle(&mut ctx).await.unwrap();
        metrics.post_handle(&mut ctx, &Ok(Value::Null)).await.unwrap();

        assert!(ctx.get_metadata("metrics.duration_ms").is_some());
    }

    #[tokio::test]
    async fn test_metrics_middleware_with_short_circuit() {
        let metrics = Arc::new(MetricsMiddleware::new());
        let mut chain = MiddlewareChain::new();
        chain.add(metrics.clone());
        chain.add_sync(ShortCircuitMiddleware);

        for _ in 0..100 {
            let result = chain
                .execute(ctx(), |_ctx| async move { Err(Error::Internal("method ran".into())) })
                .await;
            assert_eq!(result.unwrap(), json!("cached"));
        }
        assert_eq!(metrics.call_count(), 100);

        // A later call is timed from its own start, unaffected by the skipped ones
        let mut ctx = ctx();
        metrics.pre_handle(&mut ctx).await.unwrap();
        let started = ctx.started_at;
        metrics.post_handle(&mut ctx, &Ok(Value::Null)).await.unwrap();

        let recorded = ctx.get_metadata("metrics.duration_ms").and_then(Value::as_f64).unwrap();
        assert!(recorded >= 0.0);
        assert!(recorded <= started.elapsed().as_secs_f64() * 1000.0);
        assert_eq!(metrics.call_count(), 101);
    }
}
