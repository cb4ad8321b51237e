//! Per-invocation context handed to every function.
//!
//! The context carries the request-scoped values a function may rely on
//! (request id, logger, metrics client) as explicit fields, together with the
//! cancellation token that bounds the invocation's lifetime.

mod logger;
mod stat;

pub use logger::Logger;
pub use stat::{MetricsStat, NopStat, Stat};

use std::fmt;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Execution context for a single function invocation.
#[derive(Clone, Default)]
pub struct InvocationContext {
    /// Name the function was invoked under.
    pub function_name: String,
    /// Request ID for tracing.
    pub request_id: String,
    cancellation: CancellationToken,
    logger: Option<Logger>,
    stat: Option<Arc<dyn Stat>>,
}

impl InvocationContext {
    /// Create a new context with its own cancellation token.
    pub fn new(function_name: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Bind the context to an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Attach a logger to the context, replacing any previous one.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Attach a metrics client to the context, replacing any previous one.
    pub fn with_stat(mut self, stat: Arc<dyn Stat>) -> Self {
        self.stat = Some(stat);
        self
    }

    /// The logger injected for this invocation, if any.
    pub fn logger(&self) -> Option<&Logger> {
        self.logger.as_ref()
    }

    /// The injected logger, or a field-less logger when none was injected.
    pub fn log(&self) -> Logger {
        self.logger.clone().unwrap_or_default()
    }

    /// The metrics client injected for this invocation, if any.
    pub fn stat(&self) -> Option<&Arc<dyn Stat>> {
        self.stat.as_ref()
    }

    /// The token that is canceled when this invocation should stop.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Whether the invocation has been canceled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the invocation is canceled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancellation.cancelled()
    }

    /// Detach the context from its current lifetime.
    ///
    /// The returned context keeps every value of `self` but takes its
    /// cancellation from a fresh root token, so canceling `self` never
    /// cancels the detached copy. Canceling the detached copy is left to
    /// whoever holds its token.
    pub fn detach(&self) -> Self {
        Self {
            cancellation: CancellationToken::new(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("function_name", &self.function_name)
            .field("request_id", &self.request_id)
            .field("cancelled", &self.cancellation.is_cancelled())
            .field("logger", &self.logger)
            .field("stat", &self.stat.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach_keeps_values() {
        let original = InvocationContext::new("echo", "req-1")
            .with_logger(Logger::new().with_field("key", "value"))
            .with_stat(Arc::new(NopStat));

        let detached = original.detach();

        assert_eq!(detached.function_name, "echo");
        assert_eq!(detached.request_id, "req-1");
        assert_eq!(detached.logger().and_then(|l| l.field("key")), Some("value"));
        assert!(detached.stat().is_some());
    }

    #[test]
    fn test_detach_ignores_original_cancellation() {
        let original = InvocationContext::new("echo", "req-1");
        let detached = original.detach();

        original.cancellation().cancel();
        assert!(original.is_cancelled());
        assert!(!detached.is_cancelled(), "detached context was prematurely canceled");

        detached.cancellation().cancel();
        assert!(detached.is_cancelled(), "detached context ignored its own cancellation");
    }

    #[test]
    fn test_detached_values_can_be_extended() {
        let original = InvocationContext::new("echo", "req-1")
            .with_logger(Logger::new().with_field("key", "value"));

        let detached = original
            .detach()
            .with_logger(original.log().with_field("key2", "value2"));

        let logger = detached.logger().unwrap();
        assert_eq!(logger.field("key"), Some("value"));
        assert_eq!(logger.field("key2"), Some("value2"));
        assert_eq!(original.logger().unwrap().field("key2"), None);
    }

    #[test]
    fn test_log_defaults_to_empty_logger() {
        let ctx = InvocationContext::new("echo", "req-1");
        assert!(ctx.logger().is_none());
        assert!(ctx.log().fields().is_empty());
    }
}
