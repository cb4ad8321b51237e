//! Mock mode: signature-preserving no-op stand-ins.
//!
//! A mocked function accepts any payload, performs no work and returns the
//! zero value of its original output type (or nothing, if the original
//! returned nothing). It never returns an error. The original's declared
//! errors are kept so the `Error` invocation mode can still simulate them.

use crate::context::InvocationContext;
use crate::fetcher::{FetchError, Fetcher, StaticFetcher};
use crate::function::{Function, InvokeError, Output, Signature};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Why a mock could not be synthesized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// The function never recorded its signature.
    #[error("signature of the function is opaque and cannot be mocked")]
    Opaque,

    /// The zero value of the output type failed to encode.
    #[error("zero value of {type_name} failed to encode: {message}")]
    ZeroValue {
        type_name: &'static str,
        message: String,
    },
}

/// A registered function that cannot be mocked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("function '{name}' cannot be mocked: {source}")]
pub struct MockVerifyError {
    pub name: String,
    pub source: SynthesisError,
}

/// A synthesized no-op function.
#[derive(Debug, Clone)]
pub struct MockFunction {
    source: Signature,
    errors: Vec<InvokeError>,
    zero: Bytes,
}

/// Build a mock with the same signature and declared errors as `function`.
///
/// The zero output is computed once here, so every call of the mock returns
/// identical bytes.
pub fn synthesize(function: &dyn Function) -> Result<MockFunction, SynthesisError> {
    let source = *function.source();
    let zero = match source.output() {
        Output::Nothing | Output::Error => Bytes::new(),
        Output::Value(value) | Output::ValueAndError(value) => {
            value.zero().map_err(|err| SynthesisError::ZeroValue {
                type_name: value.name(),
                message: err.to_string(),
            })?
        }
        Output::Opaque => return Err(SynthesisError::Opaque),
    };
    Ok(MockFunction {
        source,
        errors: function.declared_errors().to_vec(),
        zero,
    })
}

#[async_trait]
impl Function for MockFunction {
    async fn invoke(&self, _ctx: InvocationContext, _payload: Bytes) -> Result<Bytes, InvokeError> {
        Ok(self.zero.clone())
    }

    fn source(&self) -> &Signature {
        &self.source
    }

    fn declared_errors(&self) -> &[InvokeError] {
        &self.errors
    }
}

/// Fetches functions from another fetcher and replaces them with mocks.
pub struct MockingFetcher {
    inner: Arc<dyn Fetcher>,
}

impl MockingFetcher {
    pub fn new(inner: Arc<dyn Fetcher>) -> Self {
        Self { inner }
    }

    /// Check that every function in `functions` can be mocked.
    ///
    /// Run this before serving in mock mode so that an unmockable function
    /// stops startup instead of failing individual requests.
    pub fn verify(functions: &StaticFetcher) -> Result<(), MockVerifyError> {
        for name in functions.names() {
            if let Some(function) = functions.get(name) {
                synthesize(function.as_ref()).map_err(|source| MockVerifyError {
                    name: name.to_string(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Fetcher for MockingFetcher {
    async fn fetch(
        &self,
        ctx: &InvocationContext,
        name: &str,
    ) -> Result<Arc<dyn Function>, FetchError> {
        let function = self.inner.fetch(ctx, name).await?;
        let mock = synthesize(function.as_ref()).map_err(FetchError::internal)?;
        Ok(Arc::new(mock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::LambdaFunction;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct Input {}

    #[derive(Serialize, Default)]
    struct Out {
        count: u32,
        label: String,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("always fails")]
    struct AlwaysFails;

    struct Opaque;

    #[async_trait]
    impl Function for Opaque {
        async fn invoke(&self, _ctx: InvocationContext, payload: Bytes) -> Result<Bytes, InvokeError> {
            Ok(payload)
        }

        fn source(&self) -> &Signature {
            static OPAQUE: std::sync::OnceLock<Signature> = std::sync::OnceLock::new();
            OPAQUE.get_or_init(Signature::opaque)
        }
    }

    #[tokio::test]
    async fn test_mock_returns_zero_value_every_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let real = LambdaFunction::returning(move |_ctx, _: Input| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<Out, _>(AlwaysFails) }
        });

        let mock = synthesize(&real).unwrap();
        assert_eq!(mock.source(), real.source());

        for _ in 0..3 {
            let out = mock
                .invoke(InvocationContext::default(), Bytes::from_static(b"{}"))
                .await
                .unwrap();
            assert_eq!(out, Bytes::from_static(br#"{"count":0,"label":""}"#));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mock_shapes() {
        let nothing = synthesize(&LambdaFunction::nothing(|_ctx, _: ()| async {})).unwrap();
        let error_only = synthesize(&LambdaFunction::fallible(|_ctx, _: ()| async {
            Err::<(), _>(AlwaysFails)
        }))
        .unwrap();
        let value = synthesize(&LambdaFunction::value(|_ctx, _: ()| async { 42u64 })).unwrap();
        let raw = synthesize(&LambdaFunction::raw(|_ctx, p| async move {
            Ok::<_, InvokeError>(p)
        }))
        .unwrap();

        let ctx = InvocationContext::default;
        assert!(nothing.invoke(ctx(), Bytes::new()).await.unwrap().is_empty());
        assert!(error_only.invoke(ctx(), Bytes::new()).await.unwrap().is_empty());
        assert_eq!(value.invoke(ctx(), Bytes::new()).await.unwrap(), "0");
        assert!(raw.invoke(ctx(), Bytes::from_static(b"data")).await.unwrap().is_empty());
    }

    #[test]
    fn test_mock_keeps_declared_errors() {
        let real = LambdaFunction::fallible(|_ctx, _: ()| async { Ok::<(), AlwaysFails>(()) })
            .with_errors([InvokeError::from_error(&AlwaysFails)]);
        let mock = synthesize(&real).unwrap();
        assert_eq!(mock.declared_errors(), real.declared_errors());
    }

    #[test]
    fn test_opaque_cannot_be_mocked() {
        assert_eq!(synthesize(&Opaque).unwrap_err(), SynthesisError::Opaque);

        let functions = StaticFetcher::new()
            .with_function("fine", LambdaFunction::nothing(|_ctx, _: ()| async {}))
            .with_function("opaque", Opaque);
        let err = MockingFetcher::verify(&functions).unwrap_err();
        assert_eq!(err.name, "opaque");
    }

    #[tokio::test]
    async fn test_fetch_mocks_and_propagates_errors() {
        let functions = StaticFetcher::new().with_function("opaque", Opaque).with_function(
            "echo",
            LambdaFunction::raw(|_ctx, p| async move { Ok::<_, InvokeError>(p) }),
        );
        let fetcher = MockingFetcher::new(Arc::new(functions));
        let ctx = InvocationContext::default();

        let echo = fetcher.fetch(&ctx, "echo").await.unwrap();
        let out = echo.invoke(ctx.clone(), Bytes::from_static(b"data")).await.unwrap();
        assert!(out.is_empty());

        assert!(fetcher.fetch(&ctx, "missing").await.err().unwrap().is_not_found());
        assert!(!fetcher.fetch(&ctx, "opaque").await.err().unwrap().is_not_found());
    }
}
