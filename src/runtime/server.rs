//! HTTP server exposing the Invoke API.

use crate::context::{Logger, MetricsStat};
use crate::fetcher::{
    Fetcher, LoggingFetcher, MockVerifyError, MockingFetcher, NotFoundError, StatFetcher,
    StaticFetcher,
};
use crate::gateway::Invoke;
use crate::http::{InvokeResponse, LambdaError};
use crate::runtime::{init_metrics, RuntimeConfig};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::PrometheusHandle;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::convert::Infallible;
use std::future::{pending, Future};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Error type for server startup and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Mock(#[from] MockVerifyError),
}

/// The function runtime server.
///
/// Routes `POST /{api_version}/functions/{name}/invocations` to the
/// invocation gateway and answers liveness checks on the health path.
pub struct Server {
    /// Server configuration.
    config: RuntimeConfig,
    router: Arc<Router>,
}

impl Server {
    /// Create a server for a static set of functions.
    ///
    /// The functions are decorated with logger and metrics injection. In
    /// mock mode they are replaced by mocks, and a function that cannot be
    /// mocked fails construction.
    pub fn new(config: RuntimeConfig, functions: StaticFetcher) -> Result<Self, ServerError> {
        if config.mock_mode {
            MockingFetcher::verify(&functions)?;
            info!("Mock mode enabled for {} function(s)", functions.len());
        }
        Ok(Self::assemble(config, Arc::new(functions)))
    }

    /// Create a server over any fetcher.
    ///
    /// The fetcher goes through the same pipeline as in [`Server::new`],
    /// mocking included, but nothing is verified up front: a function that
    /// cannot be mocked answers 500 when invoked.
    pub fn with_fetcher(config: RuntimeConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::assemble(config, fetcher)
    }

    fn assemble(config: RuntimeConfig, mut fetcher: Arc<dyn Fetcher>) -> Self {
        if config.mock_mode {
            fetcher = Arc::new(MockingFetcher::new(fetcher));
        }
        fetcher = Arc::new(StatFetcher::new(fetcher, Arc::new(MetricsStat::new("funcgate"))));
        fetcher = Arc::new(LoggingFetcher::new(
            fetcher,
            Logger::new().with_field("service", "funcgate"),
        ));

        let invoke = Invoke::new(fetcher)
            .mock_mode(config.mock_mode)
            .max_body_size(config.max_body_size)
            .event_timeout(config.event_timeout_duration());
        let mut router = Router::new(
            invoke,
            config.api_version.clone(),
            config.health_path.clone(),
        );
        if config.metrics_enabled {
            router = router.with_metrics(config.metrics_path.clone(), init_metrics());
        }
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// Get the request router.
    pub fn router(&self) -> Arc<Router> {
        self.router.clone()
    }

    /// Bind the listener without accepting connections yet.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        Ok(BoundServer {
            listener,
            local_addr,
            router: self.router,
        })
    }

    /// Bind and serve until the process stops.
    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.serve().await
    }
}

/// A server whose listener is bound.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Arc<Router>,
}

impl BoundServer {
    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections forever.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(pending()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep being served after shutdown.
    pub async fn serve_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()>,
    {
        info!("Listening on {}", self.local_addr);
        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Shutting down listener on {}", self.local_addr);
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let router = self.router.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let router = router.clone();
                    async move {
                        debug!("{} {} from {}", req.method(), req.uri().path(), remote_addr);
                        Ok::<_, Infallible>(router.handle(req).await)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Maps request paths onto the gateway.
pub struct Router {
    invoke: Invoke,
    api_version: String,
    health_path: String,
    metrics: Option<(String, PrometheusHandle)>,
}

impl Router {
    pub fn new(
        invoke: Invoke,
        api_version: impl Into<String>,
        health_path: impl Into<String>,
    ) -> Self {
        Self {
            invoke,
            api_version: api_version.into(),
            health_path: health_path.into(),
            metrics: None,
        }
    }

    /// Serve the Prometheus page of `handle` on `GET path`.
    pub fn with_metrics(mut self, path: impl Into<String>, handle: PrometheusHandle) -> Self {
        self.metrics = Some((path.into(), handle));
        self
    }

    /// Route a request.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let path = req.uri().path().to_string();

        if path == self.health_path && matches!(*req.method(), Method::GET | Method::HEAD) {
            return InvokeResponse::new(StatusCode::OK).body(".").into_response();
        }
        if let Some((metrics_path, handle)) = &self.metrics {
            if path == *metrics_path && req.method() == Method::GET {
                return InvokeResponse::new(StatusCode::OK)
                    .header("Content-Type", "text/plain; version=0.0.4")
                    .body(handle.render())
                    .into_response();
            }
        }

        match self.function_name(&path) {
            Some(name) if req.method() == Method::POST => self.invoke.serve(&name, req).await,
            Some(_) => InvokeResponse::new(StatusCode::METHOD_NOT_ALLOWED)
                .header("Allow", "POST")
                .into_response(),
            None => InvokeResponse::error(
                StatusCode::NOT_FOUND,
                &LambdaError::from(&NotFoundError::new(path.as_str())),
            )
            .into_response(),
        }
    }

    /// Extract `{name}` from `/{api_version}/functions/{name}/invocations`.
    ///
    /// The name is percent-decoded; one that does not decode to UTF-8 does
    /// not match.
    fn function_name<'a>(&self, path: &'a str) -> Option<Cow<'a, str>> {
        let mut segments = path.trim_start_matches('/').split('/');
        match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(version), Some("functions"), Some(name), Some("invocations"), None)
                if version == self.api_version && !name.is_empty() =>
            {
                percent_decode_str(name).decode_utf8().ok()
            }
            _ => None,
        }
    }
}
