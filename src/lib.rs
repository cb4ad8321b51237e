//! # Funcgate - Lambda Invoke API runtime
//!
//! Funcgate serves a static set of in-process functions behind an HTTP
//! endpoint compatible with the AWS Lambda `Invoke` API:
//!
//! ```text
//! POST /2015-03-31/functions/{functionName}/invocations
//! X-Amz-Invocation-Type: RequestResponse | Event | DryRun | Error
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Server (hyper, http1)                         │
//! │   /healthcheck      /metrics      /{version}/functions/{name}/...   │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                   │
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Invoke (gateway)                              │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │ LoggingFetcher ─► StatFetcher ─► MockingFetcher ─► Static   │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use funcgate::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let functions = StaticFetcher::new().with_function(
//!         "double",
//!         LambdaFunction::value(|_ctx, n: u64| async move { n * 2 }),
//!     );
//!
//!     Server::new(RuntimeConfig::from_env()?, functions)?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Mock mode
//!
//! With `FUNCGATE_MOCK_MODE=true` every function is replaced by a mock that
//! returns the zero value of its output type, and the `Error` invocation type
//! answers with any of a function's declared errors.

pub mod context;
pub mod fetcher;
pub mod function;
pub mod gateway;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::context::{InvocationContext, Logger, Stat};
    pub use crate::fetcher::{Fetcher, StaticFetcher};
    pub use crate::function::{Function, InvokeError, LambdaFunction, Signature};
    pub use crate::gateway::Invoke;
    pub use crate::runtime::{RuntimeConfig, Server};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use context::InvocationContext;
pub use fetcher::{FetchError, Fetcher, StaticFetcher};
pub use function::{Function, InvokeError, LambdaFunction};
pub use gateway::Invoke;
pub use runtime::{RuntimeConfig, Server};
