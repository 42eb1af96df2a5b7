//! Batch processing for JSON-RPC 2.0 requests
//!
//! A top-level JSON array carries several calls in one message. Every element
//! goes through the single-call path on its own, with its own version, id and
//! notification rule. The bodies are collected in request order and
//! notifications contribute nothing.
//!
//! # Batch Modes
//!
//! - **Parallel**: Run all elements concurrently on the current task
//! - **Sequential**: Run elements in order, for calls that depend on each other
//!
//! # Size Limiting
//!
//! A configured maximum rejects oversized batches with a single
//! `INVALID_REQUEST` envelope.
//!
//! # Examples
//!
//! ```rust
//! use duorpc_server::{BatchMode, BatchProcessor};
//!
//! // Parallel processing with 100-request limit
//! let processor = BatchProcessor::with_limit(BatchMode::Parallel, Some(100));
//! assert_eq!(processor.max_size(), Some(100));
//!
//! // Sequential processing, unlimited size
//! let sequential = BatchProcessor::new(BatchMode::Sequential);
//! assert_eq!(sequential.mode(), BatchMode::Sequential);
//! ```

use crate::dispatcher::Dispatcher;
use crate::response::error_body;
use duorpc_core::{codec, Error, ProtocolVersion, Reply, Result};
use futures::future::join_all;
use serde_json::Value;

/// Mode for processing batch requests
///
/// Replies are returned in request order in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Process all elements concurrently
    #[default]
    Parallel,

    /// Process elements one after another
    Sequential,
}

impl BatchMode {
    /// Label used for log fields and metric attributes
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchMode::Parallel => "parallel",
            BatchMode::Sequential => "sequential",
        }
    }
}

/// Processor for handling batch requests
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    mode: BatchMode,
    max_size: Option<usize>,
}

impl BatchProcessor {
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            max_size: None,
        }
    }

    /// Create a new batch processor with mode and max batch size
    pub fn with_limit(mode: BatchMode, max_size: Option<usize>) -> Self {
        Self { mode, max_size }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Process the elements of a batch through `dispatcher`
    ///
    /// Returns [`Reply::NoContent`] when every element was a notification.
    #[tracing::instrument(skip(self, dispatcher, items), fields(batch_size = items.len(), mode = self.mode.as_str()))]
    pub async fn process(&self, dispatcher: &Dispatcher, items: Vec<Value>) -> Result<Reply> {
        if items.is_empty() {
            let err = Error::InvalidRequest("Batch cannot be empty".to_string());
            if let Some(metrics) = dispatcher.metrics() {
                metrics.record_error(err.kind());
            }
            return error_body(&err, &ProtocolVersion::v2());
        }

        if let Some(max_size) = self.max_size {
            if items.len() > max_size {
                tracing::warn!(
                    batch_size = items.len(),
                    max_size = max_size,
                    "Batch size exceeded"
                );
                let err = Error::BatchSizeExceeded {
                    limit: max_size,
                    actual: items.len(),
                };
                if let Some(metrics) = dispatcher.metrics() {
                    metrics.record_error(err.kind());
                }
                return error_body(&err, &ProtocolVersion::v2());
            }
        }

        if let Some(metrics) = dispatcher.metrics() {
            metrics.record_batch(items.len() as u64, self.mode.as_str());
        }

        let replies = match self.mode {
            BatchMode::Parallel => join_all(items.iter().map(|item| dispatcher.handle_value(item))).await,
            BatchMode::Sequential => {
                let mut replies = Vec::with_capacity(items.len());
                for item in &items {
                    replies.push(dispatcher.handle_value(item).await);
                }
                replies
            }
        };

        let bodies: Vec<String> = replies
            .into_iter()
            .filter_map(|reply| match reply {
                Ok(Reply::Body(body)) => Some(body),
                Ok(Reply::NoContent) => None,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize batch element reply");
                    Some(codec::internal_error_body())
                }
            })
            .collect();

        tracing::debug!(response_count = bodies.len(), "Batch processing completed");

        if bodies.is_empty() {
            return Ok(Reply::NoContent);
        }
        Ok(Reply::Body(codec::encode_batch(&bodies)))
    }
}
