//! Logger injection.

use crate::context::{InvocationContext, Logger};
use crate::fetcher::{FetchError, Fetcher};
use crate::function::{Function, InvokeError, Signature};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Wraps fetched functions so that every invocation gets its own copy of
/// the logger, tagged with the function name and request id.
pub struct LoggingFetcher {
    inner: Arc<dyn Fetcher>,
    logger: Logger,
}

impl LoggingFetcher {
    pub fn new(inner: Arc<dyn Fetcher>, logger: Logger) -> Self {
        Self { inner, logger }
    }
}

#[async_trait]
impl Fetcher for LoggingFetcher {
    async fn fetch(
        &self,
        ctx: &InvocationContext,
        name: &str,
    ) -> Result<Arc<dyn Function>, FetchError> {
        let function = self.inner.fetch(ctx, name).await?;
        Ok(Arc::new(LoggingFunction {
            inner: function,
            logger: self.logger.clone(),
        }))
    }
}

struct LoggingFunction {
    inner: Arc<dyn Function>,
    logger: Logger,
}

#[async_trait]
impl Function for LoggingFunction {
    async fn invoke(&self, ctx: InvocationContext, payload: Bytes) -> Result<Bytes, InvokeError> {
        let logger = self
            .logger
            .clone()
            .with_field("function", ctx.function_name.as_str())
            .with_field("request_id", ctx.request_id.as_str());
        self.inner.invoke(ctx.with_logger(logger), payload).await
    }

    fn source(&self) -> &Signature {
        self.inner.source()
    }

    fn declared_errors(&self) -> &[InvokeError] {
        self.inner.declared_errors()
    }
}
