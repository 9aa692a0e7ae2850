//! Environment variable replacement.
//!
//! Finds variables whose values carry the marker prefix, resolves the
//! referenced parameters in one batched fetch, and maps the results back
//! onto the variable names.

use std::collections::{BTreeMap, BTreeSet};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::core::environ::{parse_environment, Environment, ProcessEnv};
use crate::core::fetch::ParamStore;
use crate::core::scan::{scan_values, Prefix};
use crate::error::{Error, Result};

/// What to do with a prefixed variable whose parameter was not found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unresolved {
    /// Fail the whole replacement, listing every missing path.
    #[default]
    Fail,
    /// Unset the variable and carry on.
    Unset,
}

/// Resolved variables, ready to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacements {
    /// Variable name to resolved value.
    pub values: BTreeMap<String, String>,
    /// Variables to unset (only under [`Unresolved::Unset`]).
    pub unset: Vec<String>,
}

impl Replacements {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.unset.is_empty()
    }
}

/// Replaces prefixed environment values with parameter values.
#[derive(Debug)]
pub struct EnvReplacer<E = ProcessEnv> {
    prefix: Prefix,
    store: ParamStore,
    env: E,
    unresolved: Unresolved,
}

impl EnvReplacer<ProcessEnv> {
    /// Replacer over the real process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyPrefix` if `prefix` is empty.
    pub fn new(prefix: impl Into<String>, store: ParamStore) -> Result<Self> {
        Self::with_env(prefix, store, ProcessEnv)
    }
}

impl<E: Environment> EnvReplacer<E> {
    /// Replacer over a caller-supplied environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyPrefix` if `prefix` is empty.
    pub fn with_env(prefix: impl Into<String>, store: ParamStore, env: E) -> Result<Self> {
        Ok(Self {
            prefix: Prefix::new(prefix)?,
            store,
            env,
            unresolved: Unresolved::default(),
        })
    }

    pub fn unresolved(mut self, policy: Unresolved) -> Self {
        self.unresolved = policy;
        self
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// Compute replacements without touching the environment.
    ///
    /// Every prefixed variable pointing at the same path receives the same
    /// value.
    ///
    /// # Errors
    ///
    /// A store failure is returned as-is. Under [`Unresolved::Fail`], paths
    /// the store did not return produce `Error::NotFound`.
    pub async fn replacements(&self, cancel: &CancellationToken) -> Result<Replacements> {
        let vars = parse_environment(self.env.environ());
        let markers = scan_values(&self.prefix, &vars);
        debug!(
            vars = vars.len(),
            prefixed = markers.len(),
            prefix = %self.prefix,
            "scanned environment"
        );

        if markers.is_empty() {
            return Ok(Replacements::default());
        }

        let paths: Vec<String> = markers
            .iter()
            .map(|m| m.path.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let fetched = self.store.fetch(&paths, cancel).await;
        if let Some(e) = fetched.error {
            return Err(e.into());
        }

        let mut replacements = Replacements::default();
        let mut missing = BTreeSet::new();

        for marker in markers {
            match fetched.get(&marker.path) {
                Some(value) => {
                    replacements.values.insert(marker.name, value.to_string());
                }
                None => match self.unresolved {
                    Unresolved::Fail => {
                        missing.insert(marker.path);
                    }
                    Unresolved::Unset => {
                        warn!(name = %marker.name, path = %marker.path, "parameter not found, unsetting");
                        replacements.unset.push(marker.name);
                    }
                },
            }
        }

        if !missing.is_empty() {
            return Err(Error::NotFound(missing.into_iter().collect()));
        }

        debug!(
            replaced = replacements.values.len(),
            unset = replacements.unset.len(),
            "resolved environment"
        );
        Ok(replacements)
    }

    /// Resolve and write every replacement into the environment.
    ///
    /// Nothing is written unless resolution succeeds. Once writing starts,
    /// every pending change is attempted and the first failure is returned.
    /// There is no rollback.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or the first write failure.
    pub async fn replace_all(&self, cancel: &CancellationToken) -> Result<()> {
        let replacements = self.replacements(cancel).await?;
        let mut first = None;

        for (name, value) in &replacements.values {
            if let Err(e) = self.env.set_var(name, value) {
                debug!(name = %name, error = %e, "set failed");
                first.get_or_insert(e);
            }
        }
        for name in &replacements.unset {
            if let Err(e) = self.env.remove_var(name) {
                debug!(name = %name, error = %e, "unset failed");
                first.get_or_insert(e);
            }
        }

        match first {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// [`replace_all`](Self::replace_all) for callers with no recovery path.
    ///
    /// # Panics
    ///
    /// Panics with the error message if replacement fails.
    pub async fn must_replace_all(&self, cancel: &CancellationToken) {
        if let Err(e) = self.replace_all(cancel).await {
            error!(error = %e, "environment replacement failed");
            panic!("awsenv: {e}");
        }
    }
}
