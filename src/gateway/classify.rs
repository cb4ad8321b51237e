//! Mapping of function errors to HTTP status codes.

use crate::function::InvokeError;
use hyper::StatusCode;

/// Decides the status code reported for a failed synchronous invocation.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, err: &InvokeError) -> StatusCode;
}

/// Default classifier: payloads that failed to decode are the caller's
/// fault (400), everything else is the function's (500).
#[derive(Debug, Clone, Copy, Default)]
pub struct InputErrorClassifier;

impl ErrorClassifier for InputErrorClassifier {
    fn classify(&self, err: &InvokeError) -> StatusCode {
        if err.is_malformed_input() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl<F> ErrorClassifier for F
where
    F: Fn(&InvokeError) -> StatusCode + Send + Sync,
{
    fn classify(&self, err: &InvokeError) -> StatusCode {
        self(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classifier() {
        let classifier = InputErrorClassifier;
        assert_eq!(
            classifier.classify(&InvokeError::malformed_input("InvalidRequestContentException", "bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            classifier.classify(&InvokeError::new("Boom", "boom")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_closure_classifier() {
        let classifier = |err: &InvokeError| {
            if err.error_type() == "Validation" {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::BAD_GATEWAY
            }
        };
        assert_eq!(
            classifier.classify(&InvokeError::new("Validation", "bad field")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            classifier.classify(&InvokeError::new("Other", "x")),
            StatusCode::BAD_GATEWAY
        );
    }
}
