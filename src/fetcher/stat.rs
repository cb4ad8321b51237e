//! Metrics client injection.

use crate::context::{InvocationContext, Stat};
use crate::fetcher::{FetchError, Fetcher};
use crate::function::{Function, InvokeError, Signature};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

/// Wraps fetched functions so that every invocation sees the shared metrics
/// client, and records an invocation counter and duration per call.
pub struct StatFetcher {
    inner: Arc<dyn Fetcher>,
    stat: Arc<dyn Stat>,
}

impl StatFetcher {
    pub fn new(inner: Arc<dyn Fetcher>, stat: Arc<dyn Stat>) -> Self {
        Self { inner, stat }
    }
}

#[async_trait]
impl Fetcher for StatFetcher {
    async fn fetch(
        &self,
        ctx: &InvocationContext,
        name: &str,
    ) -> Result<Arc<dyn Function>, FetchError> {
        let function = self.inner.fetch(ctx, name).await?;
        Ok(Arc::new(StatFunction {
            inner: function,
            stat: self.stat.clone(),
        }))
    }
}

struct StatFunction {
    inner: Arc<dyn Function>,
    stat: Arc<dyn Stat>,
}

#[async_trait]
impl Function for StatFunction {
    async fn invoke(&self, ctx: InvocationContext, payload: Bytes) -> Result<Bytes, InvokeError> {
        let function = ctx.function_name.clone();
        let start = Instant::now();

        let result = self
            .inner
            .invoke(ctx.with_stat(self.stat.clone()), payload)
            .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(_) => "error",
        };
        let tags = [("function", function.as_str()), ("outcome", outcome)];
        self.stat.count("invocations", 1, &tags);
        self.stat.timing("invocation_duration", start.elapsed(), &tags);
        result
    }

    fn source(&self) -> &Signature {
        self.inner.source()
    }

    fn declared_errors(&self) -> &[InvokeError] {
        self.inner.declared_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StaticFetcher;
    use crate::function::LambdaFunction;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStat {
        counts: Mutex<Vec<(String, u64, Vec<String>)>>,
    }

    impl Stat for RecordingStat {
        fn count(&self, name: &str, value: u64, tags: &[(&str, &str)]) {
            let tags = tags.iter().map(|(k, v)| format!("{k}:{v}")).collect();
            self.counts.lock().unwrap().push((name.to_string(), value, tags));
        }
        fn gauge(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) {}
        fn histogram(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) {}
    }

    #[tokio::test]
    async fn test_injects_stat_and_records_outcome() {
        let inner = StaticFetcher::new()
            .with_function(
                "sampled",
                LambdaFunction::raw(|ctx, _payload| async move {
                    let seen = if ctx.stat().is_some() { "yes" } else { "no" };
                    Ok::<_, InvokeError>(Bytes::from_static(seen.as_bytes()))
                }),
            )
            .with_function(
                "fail",
                LambdaFunction::raw(|_ctx, _payload| async move {
                    Err::<Bytes, _>(InvokeError::new("Boom", "boom"))
                }),
            );
        let stat = Arc::new(RecordingStat::default());
        let fetcher = StatFetcher::new(Arc::new(inner), stat.clone());

        let ctx = InvocationContext::new("sampled", "req-1");
        let sampled = fetcher.fetch(&ctx, "sampled").await.unwrap();
        assert_eq!(sampled.invoke(ctx, Bytes::new()).await.unwrap(), "yes");

        let ctx = InvocationContext::new("fail", "req-2");
        let fail = fetcher.fetch(&ctx, "fail").await.unwrap();
        assert!(fail.invoke(ctx, Bytes::new()).await.is_err());

        let counts = stat.counts.lock().unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].0, "invocations");
        assert_eq!(counts[0].2, ["function:sampled", "outcome:success"]);
        assert_eq!(counts[1].2, ["function:fail", "outcome:error"]);
    }
}
