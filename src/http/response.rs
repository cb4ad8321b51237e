//! Invocation responses and the Lambda-style error envelope.

use crate::fetcher::{FetchError, NotFoundError};
use crate::function::InvokeError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};

/// Header reporting the executed function version.
pub const EXECUTED_VERSION_HEADER: &str = "X-Amz-Executed-Version";
/// Header reporting whether an error was handled or unhandled.
pub const FUNCTION_ERROR_HEADER: &str = "X-Amz-Function-Error";
/// The only version this runtime ever executes.
pub const EXECUTED_VERSION: &str = "latest";

pub const FUNCTION_ERROR_HANDLED: &str = "Handled";
pub const FUNCTION_ERROR_UNHANDLED: &str = "Unhandled";

/// Error envelope returned as the body of failed invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaError {
    #[serde(rename = "errorMessage")]
    pub message: String,
    #[serde(rename = "errorType")]
    pub error_type: String,
    /// Always empty: no stack is captured.
    #[serde(rename = "stackTrace")]
    pub stack_trace: Vec<String>,
}

impl LambdaError {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: error_type.into(),
            stack_trace: Vec::new(),
        }
    }
}

impl From<&InvokeError> for LambdaError {
    fn from(err: &InvokeError) -> Self {
        LambdaError::new(err.error_type(), err.message())
    }
}

impl From<&FetchError> for LambdaError {
    fn from(err: &FetchError) -> Self {
        LambdaError::new(err.error_type(), err.to_string())
    }
}

impl From<&NotFoundError> for LambdaError {
    fn from(err: &NotFoundError) -> Self {
        LambdaError::new("NotFoundError", err.to_string())
    }
}

/// Response builder for invocation results.
#[derive(Debug, Clone)]
pub struct InvokeResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Option<Bytes>,
}

impl InvokeResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A response carrying an error envelope.
    pub fn error(status: StatusCode, envelope: &LambdaError) -> Self {
        // A struct of strings always serializes.
        let body = serde_json::to_vec(envelope).unwrap_or_default();
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body)
    }

    /// Add a header to the response.
    pub fn header(mut self, key: &'static str, value: &'static str) -> Self {
        self.headers.push((key, value));
        self
    }

    /// Set the response body. An empty body is omitted.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }

    /// Mark the response as a function error, classified by status.
    ///
    /// 4xx responses are `Handled`, 5xx responses `Unhandled`; any other
    /// status leaves the response untouched.
    pub fn function_error(self) -> Self {
        if self.status.is_server_error() {
            self.header(FUNCTION_ERROR_HEADER, FUNCTION_ERROR_UNHANDLED)
        } else if self.status.is_client_error() {
            self.header(FUNCTION_ERROR_HEADER, FUNCTION_ERROR_HANDLED)
        } else {
            self
        }
    }

    /// Parse the body as an error envelope if present.
    pub fn envelope(&self) -> Option<Result<LambdaError, serde_json::Error>> {
        self.body.as_ref().map(|b| serde_json::from_slice(b))
    }

    /// Convert into a hyper response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.unwrap_or_default()));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, hyper::header::HeaderValue::from_static(value));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(LambdaError::new("NotFoundError", "resource (x) not found"))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "errorMessage": "resource (x) not found",
                "errorType": "NotFoundError",
                "stackTrace": []
            })
        );
    }

    #[test]
    fn test_function_error_header() {
        let handled = InvokeResponse::new(StatusCode::BAD_REQUEST).function_error();
        assert_eq!(handled.headers, [(FUNCTION_ERROR_HEADER, FUNCTION_ERROR_HANDLED)]);

        let unhandled = InvokeResponse::new(StatusCode::INTERNAL_SERVER_ERROR).function_error();
        assert_eq!(unhandled.headers, [(FUNCTION_ERROR_HEADER, FUNCTION_ERROR_UNHANDLED)]);

        let ok = InvokeResponse::new(StatusCode::OK).function_error();
        assert!(ok.headers.is_empty());
    }

    #[test]
    fn test_empty_body_omitted() {
        let response = InvokeResponse::new(StatusCode::OK).body(Bytes::new());
        assert!(response.body.is_none());
    }

    #[test]
    fn test_into_response() {
        let response = InvokeResponse::error(
            StatusCode::NOT_FOUND,
            &LambdaError::from(&NotFoundError::new("x")),
        )
        .header(EXECUTED_VERSION_HEADER, EXECUTED_VERSION);

        let envelope = response.envelope().unwrap().unwrap();
        assert_eq!(envelope.error_type, "NotFoundError");

        let response = response.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[EXECUTED_VERSION_HEADER], "latest");
        assert_eq!(response.headers()["content-type"], "application/json");
    }
}
