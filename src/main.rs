//! Funcgate runtime with a few sample functions.
//!
//! ```text
//! curl -X POST localhost:8080/2015-03-31/functions/hello/invocations
//! curl -X POST -d '{"name": "me"}' localhost:8080/2015-03-31/functions/helloYou/invocations
//! curl -X POST -d 'data' localhost:8080/2015-03-31/functions/echo/invocations
//! curl -X POST -H 'X-Amz-Invocation-Type: Event' localhost:8080/2015-03-31/functions/error/invocations
//! ```

use clap::Parser;
use figment::providers::Serialized;
use funcgate::prelude::*;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing_subscriber::EnvFilter;

/// Command line overrides, applied over `FUNCGATE_*` variables.
#[derive(Parser, Debug, Serialize)]
#[command(name = "funcgate", version, about, after_help = RuntimeConfig::help())]
struct Cli {
    /// Host address to bind to
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,

    /// Version segment of the Invoke path
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,

    /// Replace every function with a no-op mock
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    mock_mode: bool,

    /// Bound for Event invocations in milliseconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    event_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HelloYouInput {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Serialize)]
struct HelloYouOutput {
    greeting: String,
}

/// Raised by the `error` function on every call.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Unlucky(String);

fn functions() -> StaticFetcher {
    StaticFetcher::new()
        .with_function(
            "hello",
            LambdaFunction::value(|_ctx, _: ()| async { "Hello ƛ!".to_string() }),
        )
        .with_function(
            "helloYou",
            LambdaFunction::returning(|_ctx, input: HelloYouInput| async move {
                let name = if input.name.is_empty() { "ƛ".to_string() } else { input.name };
                Ok::<_, Infallible>(HelloYouOutput {
                    greeting: format!("Hello {}!", name),
                })
            }),
        )
        .with_function(
            "echo",
            LambdaFunction::raw(|ctx, payload| async move {
                ctx.log().debug(format!("echoing {} bytes", payload.len()));
                Ok::<_, InvokeError>(payload)
            }),
        )
        .with_function(
            "error",
            LambdaFunction::fallible(|ctx, _: serde_json::Value| async move {
                ctx.log().warn("failing on purpose");
                Err::<(), _>(Unlucky("better luck next time".to_string()))
            })
            .with_errors([InvokeError::new("Unlucky", "better luck next time")]),
        )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config =
        RuntimeConfig::from_figment(RuntimeConfig::figment().merge(Serialized::defaults(cli)))?;
    let functions = functions();
    tracing::info!("Registered functions: {}", functions.names().join(", "));
    tracing::info!(
        "Try: curl -X POST http://localhost:{}/{}/functions/hello/invocations",
        config.port,
        config.api_version
    );

    let server = Server::new(config, functions)?.bind().await?;
    server
        .serve_with_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
