//! The invocation gateway.
//!
//! [`Invoke`] implements the `Invoke` call of the Lambda API on top of a
//! [`Fetcher`]. For each request it:
//!
//! 1. resolves the function (404 when unknown, 500 when the lookup fails),
//! 2. reads the invocation type and the payload (400 when unreadable),
//! 3. dispatches:
//!    - `DryRun`: 204, the function is not invoked;
//!    - `Event`: the function runs on a detached context in a background
//!      task and the gateway answers 202 right away;
//!    - `RequestResponse`: the function runs on the request context and its
//!      output (or error envelope) becomes the response;
//!    - `Error`: mock mode only, answers with one of the function's declared
//!      errors;
//!    - anything else: 400 `InvalidParameterValueException`.
//!
//! Every response carries `X-Amz-Executed-Version: latest`. Nothing is
//! retried.

mod classify;

pub use classify::{ErrorClassifier, InputErrorClassifier};

use crate::context::InvocationContext;
use crate::fetcher::{FetchError, Fetcher, NotFoundError};
use crate::function::handler::INVALID_REQUEST_CONTENT;
use crate::function::Function;
use crate::http::{
    requested_error, InvocationType, InvokeResponse, LambdaError, EXECUTED_VERSION,
    EXECUTED_VERSION_HEADER,
};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, warn, Instrument, Span};

/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_SIZE: usize = 6 * 1024 * 1024;

const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValueException";
const REQUEST_TOO_LARGE: &str = "RequestTooLargeException";

/// HTTP handler for function invocations.
pub struct Invoke {
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<dyn ErrorClassifier>,
    mock_mode: bool,
    max_body_size: usize,
    event_timeout: Option<Duration>,
}

impl Invoke {
    /// Create a gateway over `fetcher` with the default classifier.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            classifier: Arc::new(InputErrorClassifier),
            mock_mode: false,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            event_timeout: None,
        }
    }

    /// Enable mock-mode features such as the `Error` invocation type.
    pub fn mock_mode(mut self, enabled: bool) -> Self {
        self.mock_mode = enabled;
        self
    }

    /// Replace the error classifier.
    pub fn classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Set the maximum accepted payload size.
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Bound background (`Event`) invocations. `None` leaves them unbounded.
    pub fn event_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.event_timeout = timeout;
        self
    }

    /// Handle one invocation of `function_name`.
    ///
    /// The request context is canceled when this future completes or is
    /// dropped; only `Event` invocations run past that point.
    pub async fn serve<B>(&self, function_name: &str, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let cancellation = CancellationToken::new();
        let _guard = cancellation.clone().drop_guard();
        let ctx = InvocationContext::new(function_name, generate_request_id())
            .with_cancellation(cancellation);
        let span = info_span!(
            "invoke",
            function = %ctx.function_name,
            request_id = %ctx.request_id
        );

        self.dispatch(ctx, request)
            .instrument(span)
            .await
            .header(EXECUTED_VERSION_HEADER, EXECUTED_VERSION)
            .into_response()
    }

    async fn dispatch<B>(&self, ctx: InvocationContext, request: Request<B>) -> InvokeResponse
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let function = match self.fetcher.fetch(&ctx, &ctx.function_name).await {
            Ok(function) => function,
            Err(err) => {
                let status = match err {
                    FetchError::NotFound(_) => StatusCode::NOT_FOUND,
                    FetchError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                warn!(error = %err, "Failed to resolve function");
                return InvokeResponse::error(status, &LambdaError::from(&err));
            }
        };

        let (parts, body) = request.into_parts();
        let invocation_type = InvocationType::from_headers(&parts.headers);

        let payload = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                let error_type = if err.is::<LengthLimitError>() {
                    REQUEST_TOO_LARGE
                } else {
                    INVALID_REQUEST_CONTENT
                };
                warn!(error = %err, "Failed to read payload");
                return InvokeResponse::error(
                    StatusCode::BAD_REQUEST,
                    &LambdaError::new(error_type, err.to_string()),
                );
            }
        };

        debug!(invocation_type = %invocation_type, "Invoking");

        match invocation_type {
            InvocationType::DryRun => InvokeResponse::new(StatusCode::NO_CONTENT),
            InvocationType::Event => {
                self.spawn_event(function, ctx.detach(), payload);
                InvokeResponse::new(StatusCode::ACCEPTED)
            }
            InvocationType::RequestResponse => self.request_response(function, ctx, payload).await,
            InvocationType::Error if self.mock_mode => {
                simulate_error(function.as_ref(), &requested_error(&parts.headers))
            }
            other => InvokeResponse::error(
                StatusCode::BAD_REQUEST,
                &LambdaError::new(
                    INVALID_PARAMETER_VALUE,
                    format!("InvocationType {} not valid", other),
                ),
            ),
        }
    }

    async fn request_response(
        &self,
        function: Arc<dyn Function>,
        ctx: InvocationContext,
        payload: Bytes,
    ) -> InvokeResponse {
        match function.invoke(ctx, payload).await {
            Ok(output) => InvokeResponse::new(StatusCode::OK).body(output),
            Err(err) => {
                let status = self.classifier.classify(&err);
                error!(error_type = err.error_type(), error = %err, "Function error");
                InvokeResponse::error(status, &LambdaError::from(&err)).function_error()
            }
        }
    }

    fn spawn_event(&self, function: Arc<dyn Function>, ctx: InvocationContext, payload: Bytes) {
        let timeout = self.event_timeout;
        let invocation = async move {
            let token = ctx.cancellation().clone();
            let call = function.invoke(ctx, payload);

            let result = match timeout {
                None => call.await,
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => {
                        token.cancel();
                        warn!(timeout = ?limit, "Event invocation timed out");
                        return;
                    }
                },
            };

            match result {
                Ok(_) => debug!("Event invocation completed"),
                Err(err) => error!(
                    error_type = err.error_type(),
                    error = %err,
                    "Event invocation failed"
                ),
            }
        };
        tokio::spawn(invocation.instrument(Span::current()));
    }
}

/// Answer with the declared error named `name`, or 404 if undeclared.
fn simulate_error(function: &dyn Function, name: &str) -> InvokeResponse {
    match function
        .declared_errors()
        .iter()
        .find(|declared| declared.error_type() == name)
    {
        Some(declared) => {
            InvokeResponse::error(StatusCode::INTERNAL_SERVER_ERROR, &LambdaError::from(declared))
                .function_error()
        }
        None => InvokeResponse::error(
            StatusCode::NOT_FOUND,
            &LambdaError::from(&NotFoundError::new(name)),
        ),
    }
}

/// Generate a unique request ID.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", timestamp, sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{InvokeError, LambdaFunction};

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }

    #[test]
    fn test_simulate_error() {
        let function = LambdaFunction::nothing(|_ctx, _: ()| async {})
            .with_errors([InvokeError::new("Throttled", "slow down")]);

        let response = simulate_error(&function, "Throttled");
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = response.envelope().unwrap().unwrap();
        assert_eq!(envelope, LambdaError::new("Throttled", "slow down"));

        let response = simulate_error(&function, "Missing");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let envelope = response.envelope().unwrap().unwrap();
        assert_eq!(envelope.error_type, "NotFoundError");
        assert_eq!(envelope.message, "resource (Missing) not found");
    }
}
