//! Server builder for constructing JSON-RPC servers
//!
//! The builder provides a fluent API for configuring and creating an
//! [`RpcServer`]. It allows you to:
//! - Inject the method registry
//! - Choose the endpoint and default protocol version
//! - Configure batch processing
//! - Add middleware
//! - Enable observability and metrics
//!
//! # Examples
//!
//! ```rust,no_run
//! use duorpc_server::{BatchMode, LoggingMiddleware, MethodRegistry, RpcServer};
//! use std::sync::Arc;
//!
//! # fn example(registry: Arc<dyn MethodRegistry>) -> duorpc_core::Result<()> {
//! let server = RpcServer::builder()
//!     .registry(registry)
//!     .endpoint("public")
//!     .default_version("2.0")
//!     .batch_mode(BatchMode::Parallel)
//!     .max_batch_size(100)
//!     .use_sync_middleware(LoggingMiddleware)
//!     .with_default_observability()
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::{
    BatchMode, BatchProcessor, CallContext, Dispatcher, MethodRegistry, Middleware,
    MiddlewareChain, RpcServer, ServerMetrics, SyncMiddleware,
};
use duorpc_core::{Error, ObservabilityConfig, ProtocolVersion, Result};
use std::sync::Arc;

/// Builder for [`RpcServer`]
pub struct ServerBuilder {
    registry: Option<Arc<dyn MethodRegistry>>,
    endpoint: String,
    default_version: ProtocolVersion,
    batch_mode: BatchMode,
    max_batch_size: Option<usize>,
    middleware_chain: MiddlewareChain,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
    enable_metrics: bool,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            endpoint: CallContext::DEFAULT_ENDPOINT.to_string(),
            default_version: ProtocolVersion::default(),
            batch_mode: BatchMode::default(),
            max_batch_size: None,
            middleware_chain: MiddlewareChain::new(),
            observability_config: None,
            service_name: None,
            enable_metrics: false,
        }
    }

    /// Set the method registry (required)
    pub fn registry(mut self, registry: Arc<dyn MethodRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Endpoint name passed to every registry lookup
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Version assumed for requests that declare none
    pub fn default_version(mut self, version: impl Into<ProtocolVersion>) -> Self {
        self.default_version = version.into();
        self
    }

    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    pub fn max_batch_size(mut self, max_size: usize) -> Self {
        self.max_batch_size = Some(max_size);
        self
    }

    pub fn use_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware_chain.add(middleware);
        self
    }

    pub fn use_sync_middleware<T: SyncMiddleware + 'static>(mut self, middleware: T) -> Self {
        self.middleware_chain.add_sync(middleware);
        self
    }

    /// Initialize tracing and OpenTelemetry export on build
    ///
    /// Implies metrics recording.
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Record metrics against the globally installed meter provider
    pub fn enable_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    pub fn build(self) -> Result<RpcServer> {
        let registry = self
            .registry
            .ok_or_else(|| Error::Internal("No method registry specified".to_string()))?;

        let metrics = match self.observability_config {
            Some(mut config) => {
                if let Some(name) = &self.service_name {
                    config.service_name = name.clone();
                }

                duorpc_core::init_observability(config.clone()).map_err(|e| {
                    Error::Internal(format!("Failed to initialize observability: {}", e))
                })?;

                Some(Arc::new(ServerMetrics::new(config.service_name)))
            }
            None if self.enable_metrics => {
                let name = self.service_name.unwrap_or_else(|| "duorpc-server".to_string());
                Some(Arc::new(ServerMetrics::new(name)))
            }
            None => None,
        };

        tracing::info!(
            endpoint = %self.endpoint,
            default_version = %self.default_version,
            batch_mode = self.batch_mode.as_str(),
            middleware = self.middleware_chain.len(),
            "Server configured"
        );

        let mut dispatcher = Dispatcher::new(registry)
            .with_context(CallContext::new(self.endpoint))
            .with_default_version(self.default_version)
            .with_middleware(self.middleware_chain)
            .with_batch(BatchProcessor::with_limit(self.batch_mode, self.max_batch_size));

        if let Some(metrics) = metrics {
            dispatcher = dispatcher.with_metrics(metrics);
        }

        Ok(RpcServer::new(dispatcher))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
