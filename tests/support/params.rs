//! Parameter sources for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use awsenv::core::fetch::{ParamMap, ParamsGetter};
use awsenv::core::normalize::normalize;
use awsenv::error::StoreError;

/// Answers with bare paths and records every batch it is asked for.
///
/// In strict mode a single unknown name fails the whole batch.
pub struct MapParams {
    values: HashMap<String, String>,
    strict: bool,
    batches: Mutex<Vec<Vec<String>>>,
    calls: AtomicUsize,
}

impl MapParams {
    pub fn new(values: &[(&str, &str)]) -> Self {
        Self {
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            strict: false,
            batches: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ParamsGetter for MapParams {
    async fn get_params(&self, names: &[String]) -> Result<ParamMap, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(names.to_vec());

        let mut out = ParamMap::new();
        for name in names {
            let bare = normalize(name);
            match self.values.get(bare) {
                Some(v) => {
                    out.insert(bare.to_string(), v.clone());
                }
                None if self.strict => {
                    return Err(StoreError::Request(format!("not found: {name}")));
                }
                None => {}
            }
        }
        Ok(out)
    }
}

/// Always fails.
pub struct FailingParams;

#[async_trait]
impl ParamsGetter for FailingParams {
    async fn get_params(&self, _: &[String]) -> Result<ParamMap, StoreError> {
        Err(StoreError::Request("forced".into()))
    }
}
