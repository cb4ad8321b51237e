//! The function trait and the errors an invocation may produce.

use crate::context::InvocationContext;
use crate::function::signature::Signature;
use async_trait::async_trait;
use bytes::Bytes;

/// Error type reported when a payload could not be decoded into the
/// function's input type.
pub const INVALID_REQUEST_CONTENT: &str = "InvalidRequestContentException";

/// Error type reported when a function's output could not be encoded.
pub const SERIALIZATION_ERROR: &str = "SerializationError";

/// An invocable function.
///
/// Every function shares the same byte-oriented contract regardless of the
/// typed signature it was built from; [`source`](Function::source) keeps the
/// original shape around for mock synthesis.
#[async_trait]
pub trait Function: Send + Sync {
    /// Run the function against a raw payload.
    async fn invoke(&self, ctx: InvocationContext, payload: Bytes) -> Result<Bytes, InvokeError>;

    /// The signature the function was built from.
    fn source(&self) -> &Signature;

    /// Named errors the function documents that it may return.
    fn declared_errors(&self) -> &[InvokeError] {
        &[]
    }
}

/// Broad category of an invocation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The payload could not be decoded into the function's input.
    MalformedInput,
    /// The function itself failed.
    Function,
}

/// An error returned by a function invocation.
///
/// `error_type` names the error variant. It is what ends up in the
/// `errorType` field of the error envelope and what the `Error` invocation
/// mode matches against.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvokeError {
    kind: ErrorKind,
    error_type: String,
    message: String,
}

impl InvokeError {
    /// Create a function error with an explicit variant name.
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Function,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-input error.
    pub fn malformed_input(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedInput,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Describe an arbitrary error, naming it after its type.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::new(short_type_name::<E>(), err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_malformed_input(&self) -> bool {
        self.kind == ErrorKind::MalformedInput
    }
}

impl From<serde_json::Error> for InvokeError {
    fn from(err: serde_json::Error) -> Self {
        InvokeError::malformed_input(INVALID_REQUEST_CONTENT, err.to_string())
    }
}

/// The last path segment of a type name, without generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("user {0} does not exist")]
    struct UnknownUser(u32);

    #[test]
    fn test_from_error_uses_type_name() {
        let err = InvokeError::from_error(&UnknownUser(7));
        assert_eq!(err.error_type(), "UnknownUser");
        assert_eq!(err.message(), "user 7 does not exist");
        assert_eq!(err.kind(), ErrorKind::Function);
        assert_eq!(err.to_string(), "user 7 does not exist");
    }

    #[test]
    fn test_serde_error_is_malformed_input() {
        let err: InvokeError = serde_json::from_slice::<u32>(b"\"nope\"").unwrap_err().into();
        assert!(err.is_malformed_input());
        assert_eq!(err.error_type(), INVALID_REQUEST_CONTENT);
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<InvokeError>(), "InvokeError");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(short_type_name::<u8>(), "u8");
    }
}
