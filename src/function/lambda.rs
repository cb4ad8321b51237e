//! Adapter turning typed async closures into [`Function`]s.
//!
//! Payloads are JSON. The input is decoded into the closure's parameter type
//! (an empty payload decodes as `null`, so `()` and `Option<T>` parameters
//! accept an empty body) and the output is encoded back to JSON. One
//! constructor exists per accepted native shape:
//!
//! | constructor                     | closure returns   |
//! |---------------------------------|-------------------|
//! | [`LambdaFunction::nothing`]     | `()`              |
//! | [`LambdaFunction::value`]       | `O`               |
//! | [`LambdaFunction::fallible`]    | `Result<(), E>`   |
//! | [`LambdaFunction::returning`]   | `Result<O, E>`    |
//! | [`LambdaFunction::raw`]         | `Result<Bytes, InvokeError>` on the raw payload |

use crate::context::InvocationContext;
use crate::function::handler::{Function, InvokeError, SERIALIZATION_ERROR};
use crate::function::signature::{Output, Signature, ValueType};
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

type InvokeFuture = Pin<Box<dyn Future<Output = Result<Bytes, InvokeError>> + Send>>;
type Callable = Box<dyn Fn(InvocationContext, Bytes) -> InvokeFuture + Send + Sync>;

/// A function built from a typed closure.
pub struct LambdaFunction {
    callable: Callable,
    source: Signature,
    errors: Vec<InvokeError>,
}

impl LambdaFunction {
    /// Wrap a closure that returns nothing.
    pub fn nothing<F, Fut, I>(f: F) -> Self
    where
        F: Fn(InvocationContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        I: DeserializeOwned + 'static,
    {
        Self::build(Signature::taking::<I>(Output::Nothing), move |ctx, payload| {
            let input = decode::<I>(&payload)?;
            let fut = f(ctx, input);
            Ok(async move {
                fut.await;
                Ok::<_, InvokeError>(Bytes::new())
            })
        })
    }

    /// Wrap a closure that returns a value.
    pub fn value<F, Fut, I, O>(f: F) -> Self
    where
        F: Fn(InvocationContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
        I: DeserializeOwned + 'static,
        O: Serialize + Default + 'static,
    {
        let source = Signature::taking::<I>(Output::Value(ValueType::of::<O>()));
        Self::build(source, move |ctx, payload| {
            let input = decode::<I>(&payload)?;
            let fut = f(ctx, input);
            Ok(async move { encode(&fut.await) })
        })
    }

    /// Wrap a closure that only reports success or failure.
    pub fn fallible<F, Fut, I, E>(f: F) -> Self
    where
        F: Fn(InvocationContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        I: DeserializeOwned + 'static,
        E: std::error::Error + 'static,
    {
        Self::build(Signature::taking::<I>(Output::Error), move |ctx, payload| {
            let input = decode::<I>(&payload)?;
            let fut = f(ctx, input);
            Ok(async move { fut.await.map(|()| Bytes::new()).map_err(into_invoke_error) })
        })
    }

    /// Wrap a closure that returns a value or an error.
    pub fn returning<F, Fut, I, O, E>(f: F) -> Self
    where
        F: Fn(InvocationContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
        I: DeserializeOwned + 'static,
        O: Serialize + Default + 'static,
        E: std::error::Error + 'static,
    {
        let source = Signature::taking::<I>(Output::ValueAndError(ValueType::of::<O>()));
        Self::build(source, move |ctx, payload| {
            let input = decode::<I>(&payload)?;
            let fut = f(ctx, input);
            Ok(async move {
                match fut.await {
                    Ok(output) => encode(&output),
                    Err(err) => Err(into_invoke_error(err)),
                }
            })
        })
    }

    /// Wrap a closure working on the raw payload bytes.
    pub fn raw<F, Fut>(f: F) -> Self
    where
        F: Fn(InvocationContext, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes, InvokeError>> + Send + 'static,
    {
        let source = Signature::taking::<Bytes>(Output::ValueAndError(ValueType::raw()));
        Self {
            callable: Box::new(move |ctx: InvocationContext, payload: Bytes| -> InvokeFuture {
                Box::pin(f(ctx, payload))
            }),
            source,
            errors: Vec::new(),
        }
    }

    /// Document the errors this function may return.
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = InvokeError>) -> Self {
        self.errors = errors.into_iter().collect();
        self
    }

    fn build<P, Fut>(source: Signature, prepare: P) -> Self
    where
        P: Fn(InvocationContext, Bytes) -> Result<Fut, InvokeError> + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes, InvokeError>> + Send + 'static,
    {
        let callable: Callable = Box::new(move |ctx: InvocationContext, payload: Bytes| {
            let fut: InvokeFuture = match prepare(ctx, payload) {
                Ok(fut) => Box::pin(fut),
                Err(err) => Box::pin(std::future::ready(Err(err))),
            };
            fut
        });
        Self {
            callable,
            source,
            errors: Vec::new(),
        }
    }
}

#[async_trait]
impl Function for LambdaFunction {
    async fn invoke(&self, ctx: InvocationContext, payload: Bytes) -> Result<Bytes, InvokeError> {
        (self.callable)(ctx, payload).await
    }

    fn source(&self) -> &Signature {
        &self.source
    }

    fn declared_errors(&self) -> &[InvokeError] {
        &self.errors
    }
}

impl fmt::Debug for LambdaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaFunction")
            .field("source", &self.source)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

/// Decode a JSON payload, treating an empty payload as `null`.
pub(crate) fn decode<I: DeserializeOwned>(payload: &[u8]) -> Result<I, InvokeError> {
    let payload: &[u8] = if payload.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        payload
    };
    serde_json::from_slice(payload).map_err(InvokeError::from)
}

/// Encode an output value as JSON. `()` encodes as an empty payload.
pub(crate) fn encode<O: Serialize + 'static>(output: &O) -> Result<Bytes, InvokeError> {
    if TypeId::of::<O>() == TypeId::of::<()>() {
        return Ok(Bytes::new());
    }
    serde_json::to_vec(output)
        .map(Bytes::from)
        .map_err(|e| InvokeError::new(SERIALIZATION_ERROR, e.to_string()))
}

/// Pass `InvokeError`s through untouched, describe anything else.
fn into_invoke_error<E: std::error::Error + 'static>(err: E) -> InvokeError {
    match (&err as &dyn Any).downcast_ref::<InvokeError>() {
        Some(invoke_err) => invoke_err.clone(),
        None => InvokeError::from_error(&err),
    }
}
