//! In-memory function registry.

use crate::context::InvocationContext;
use crate::fetcher::{FetchError, Fetcher, NotFoundError};
use crate::function::Function;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A fixed mapping of names to functions.
///
/// The mapping is assembled before the runtime starts and never changes
/// afterwards: adding, replacing or removing a function means building a new
/// registry and restarting. Every invocation runs in-process and shares the
/// runtime's resources.
#[derive(Clone, Default)]
pub struct StaticFetcher {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl StaticFetcher {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn with_function(mut self, name: impl Into<String>, function: impl Function + 'static) -> Self {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    /// Register an already shared function under `name`.
    pub fn with_shared(mut self, name: impl Into<String>, function: Arc<dyn Function>) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// Look up a function without going through the async fetch path.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Arc<dyn Function>)> for StaticFetcher {
    fn from_iter<T: IntoIterator<Item = (S, Arc<dyn Function>)>>(iter: T) -> Self {
        Self {
            functions: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(
        &self,
        _ctx: &InvocationContext,
        name: &str,
    ) -> Result<Arc<dyn Function>, FetchError> {
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| NotFoundError::new(name).into())
    }
}

impl fmt::Debug for StaticFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticFetcher")
            .field("functions", &self.names())
            .finish()
    }
}
