//! Batched, concurrent parameter lookup.
//!
//! Paths are split into batches no larger than the store's limit and every
//! batch runs as its own task. All batches run to completion; the first
//! error observed while joining is reported alongside whatever the
//! successful batches returned.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::core::normalize::normalize;
use crate::error::StoreError;

/// Path identifier to resolved value.
pub type ParamMap = HashMap<String, String>;

/// A source that can turn parameter paths into values.
///
/// Implementations may return only the subset they could resolve, or fail
/// the whole request; the fetcher reconciles either against the paths it
/// asked for.
#[async_trait]
pub trait ParamsGetter: Send + Sync {
    async fn get_params(&self, names: &[String]) -> Result<ParamMap, StoreError>;
}

/// A getter together with its batch limit, fixed at construction.
#[derive(Clone)]
pub struct ParamStore {
    getter: Arc<dyn ParamsGetter>,
    limit: Option<NonZeroUsize>,
}

impl ParamStore {
    /// Wrap a getter with no batch limit.
    pub fn new(getter: impl ParamsGetter + 'static) -> Self {
        Self::from_arc(Arc::new(getter))
    }

    pub fn from_arc(getter: Arc<dyn ParamsGetter>) -> Self {
        Self {
            getter,
            limit: None,
        }
    }

    /// Cap the number of names per request. Zero means unlimited.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = NonZeroUsize::new(limit);
        self
    }

    pub fn limit(&self) -> Option<NonZeroUsize> {
        self.limit
    }

    /// Resolve `paths`, one task per batch.
    ///
    /// Result keys are normalized, so a store that answers qualified
    /// requests with bare paths (or the reverse) still lines up. Duplicate
    /// paths are not collapsed. With no paths the getter is never called.
    pub async fn fetch(&self, paths: &[String], cancel: &CancellationToken) -> Fetched {
        let batches = chunk(self.limit, paths);
        debug!(
            paths = paths.len(),
            batches = batches.len(),
            limit = self.limit.map(NonZeroUsize::get),
            "fetching parameters"
        );

        // One slot per batch; each task only ever fills its own index.
        let mut results: Vec<Option<ParamMap>> = vec![None; batches.len()];
        let mut tasks = JoinSet::new();

        for (index, batch) in batches.into_iter().enumerate() {
            let getter = Arc::clone(&self.getter);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                trace!(index, size = batch.len(), "dispatching batch");
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(StoreError::Cancelled),
                    result = getter.get_params(&batch) => result,
                };
                (index, result)
            });
        }

        let mut error = None;
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((index, Ok(values))) => {
                    trace!(index, resolved = values.len(), "batch complete");
                    results[index] = Some(values);
                    continue;
                }
                Ok((index, Err(e))) => {
                    debug!(index, error = %e, "batch failed");
                    e
                }
                Err(e) => StoreError::TaskFailed(e.to_string()),
            };
            if error.is_none() {
                error = Some(failure);
            }
        }

        let mut values = ParamMap::with_capacity(paths.len());
        for batch in results.into_iter().flatten() {
            for (name, value) in batch {
                values.insert(normalize(&name).to_string(), value);
            }
        }

        Fetched { values, error }
    }
}

impl std::fmt::Debug for ParamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamStore")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`ParamStore::fetch`].
#[derive(Debug, Default)]
pub struct Fetched {
    /// Merged results of every batch that succeeded, keyed by normalized path.
    pub values: ParamMap,
    /// First error observed, if any batch failed.
    pub error: Option<StoreError>,
}

impl Fetched {
    /// Value for `path`, looked up by its normalized form.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.values.get(normalize(path)).map(String::as_str)
    }

    /// Requested paths with no value, in request order, without duplicates.
    pub fn missing<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for path in paths {
            if self.get(path).is_none() && !missing.iter().any(|m| m == path) {
                missing.push(path.to_string());
            }
        }
        missing
    }

    /// All-or-nothing view: the error if any batch failed, else the values.
    pub fn into_result(self) -> Result<ParamMap, StoreError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.values),
        }
    }
}

/// Split `paths` into contiguous batches of at most `limit` names.
///
/// No limit yields a single batch; no paths yield no batches.
pub fn chunk(limit: Option<NonZeroUsize>, paths: &[String]) -> Vec<Vec<String>> {
    if paths.is_empty() {
        return Vec::new();
    }
    let size = limit.map_or(paths.len(), NonZeroUsize::get);
    paths.chunks(size).map(<[String]>::to_vec).collect()
}

/// In-memory parameter source.
///
/// Answers with the subset of requested names it knows, keyed by the bare
/// path even when asked with the qualified form, the way Parameter Store
/// does.
#[derive(Debug, Clone, Default)]
pub struct StaticParams {
    values: ParamMap,
}

impl StaticParams {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl ParamsGetter for StaticParams {
    async fn get_params(&self, names: &[String]) -> Result<ParamMap, StoreError> {
        Ok(names
            .iter()
            .filter_map(|name| {
                let bare = normalize(name);
                self.values
                    .get(bare)
                    .map(|value| (bare.to_string(), value.clone()))
            })
            .collect())
    }
}
