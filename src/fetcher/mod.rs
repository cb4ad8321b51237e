//! Function lookup.
//!
//! A [`Fetcher`] resolves a function name to an invocable [`Function`].
//! [`StaticFetcher`] is the in-memory registry; the other fetchers decorate
//! another fetcher and wrap whatever it returns:
//!
//! ```text
//! LoggingFetcher ─► StatFetcher ─► MockingFetcher ─► StaticFetcher
//! ```
//!
//! Decorators may be stacked in any order. They never alter the error
//! returned by the fetcher they wrap.

mod logging;
pub mod mocking;
mod stat;
mod static_fetcher;

pub use logging::LoggingFetcher;
pub use mocking::{MockFunction, MockVerifyError, MockingFetcher, SynthesisError};
pub use stat::StatFetcher;
pub use static_fetcher::StaticFetcher;

use crate::context::InvocationContext;
use crate::function::{short_type_name, Function};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for function lookup strategies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the function registered under `name`.
    ///
    /// Implementations must return [`FetchError::NotFound`] when no such
    /// function exists.
    async fn fetch(
        &self,
        ctx: &InvocationContext,
        name: &str,
    ) -> Result<Arc<dyn Function>, FetchError>;
}

#[async_trait]
impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    async fn fetch(
        &self,
        ctx: &InvocationContext,
        name: &str,
    ) -> Result<Arc<dyn Function>, FetchError> {
        (**self).fetch(ctx, name).await
    }
}

/// A failed lookup for a resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resource ({id}) not found")]
pub struct NotFoundError {
    /// The key used when looking for the resource.
    pub id: String,
}

impl NotFoundError {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No function is registered under the requested name.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The lookup itself failed.
    #[error("{source}")]
    Internal {
        /// Short type name of the underlying error.
        error_type: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Wrap an infrastructure failure.
    pub fn internal<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FetchError::Internal {
            error_type: short_type_name::<E>(),
            source: Box::new(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }

    /// Name of the error variant, as reported in error envelopes.
    pub fn error_type(&self) -> &'static str {
        match self {
            FetchError::NotFound(_) => short_type_name::<NotFoundError>(),
            FetchError::Internal { error_type, .. } => *error_type,
        }
    }
}
