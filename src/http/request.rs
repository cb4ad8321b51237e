//! Invocation request headers.

use hyper::HeaderMap;
use std::fmt;

/// Header selecting the invocation type.
pub const INVOCATION_TYPE_HEADER: &str = "X-Amz-Invocation-Type";
/// Header naming the declared error to simulate in `Error` mode.
pub const ERROR_TYPE_HEADER: &str = "X-Error-Type";

/// How the caller wants the function to be invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InvocationType {
    /// Invoke synchronously and return the result.
    #[default]
    RequestResponse,
    /// Invoke in the background and return immediately.
    Event,
    /// Validate the request without invoking.
    DryRun,
    /// Simulate one of the function's declared errors (mock mode only).
    Error,
    /// Anything else, kept verbatim for the error message.
    Unknown(String),
}

impl InvocationType {
    /// Parse a header value. Matching is exact, as in the upstream API.
    pub fn parse(value: &str) -> Self {
        match value {
            "RequestResponse" => InvocationType::RequestResponse,
            "Event" => InvocationType::Event,
            "DryRun" => InvocationType::DryRun,
            "Error" => InvocationType::Error,
            other => InvocationType::Unknown(other.to_string()),
        }
    }

    /// Read the invocation type from request headers.
    ///
    /// A missing or empty header means `RequestResponse`. A header that is
    /// not valid visible ASCII is reported as `Unknown`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(INVOCATION_TYPE_HEADER) {
            None => InvocationType::default(),
            Some(value) => match value.to_str() {
                Ok("") => InvocationType::default(),
                Ok(v) => InvocationType::parse(v),
                Err(_) => {
                    InvocationType::Unknown(String::from_utf8_lossy(value.as_bytes()).into_owned())
                }
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InvocationType::RequestResponse => "RequestResponse",
            InvocationType::Event => "Event",
            InvocationType::DryRun => "DryRun",
            InvocationType::Error => "Error",
            InvocationType::Unknown(other) => other,
        }
    }
}

impl fmt::Display for InvocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read the declared error name requested for `Error` mode.
pub fn requested_error(headers: &HeaderMap) -> String {
    headers
        .get(ERROR_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    #[test]
    fn test_parse() {
        assert_eq!(InvocationType::parse("RequestResponse"), InvocationType::RequestResponse);
        assert_eq!(InvocationType::parse("Event"), InvocationType::Event);
        assert_eq!(InvocationType::parse("DryRun"), InvocationType::DryRun);
        assert_eq!(InvocationType::parse("Error"), InvocationType::Error);
        assert_eq!(
            InvocationType::parse("event"),
            InvocationType::Unknown("event".to_string())
        );
    }

    #[test]
    fn test_from_headers_default() {
        let mut headers = HeaderMap::new();
        assert_eq!(InvocationType::from_headers(&headers), InvocationType::RequestResponse);

        headers.insert(INVOCATION_TYPE_HEADER, HeaderValue::from_static(""));
        assert_eq!(InvocationType::from_headers(&headers), InvocationType::RequestResponse);

        headers.insert(INVOCATION_TYPE_HEADER, HeaderValue::from_static("bogus"));
        assert_eq!(InvocationType::from_headers(&headers).to_string(), "bogus");
    }

    #[test]
    fn test_requested_error() {
        let mut headers = HeaderMap::new();
        assert_eq!(requested_error(&headers), "");
        headers.insert(ERROR_TYPE_HEADER, HeaderValue::from_static("Throttled"));
        assert_eq!(requested_error(&headers), "Throttled");
    }
}
