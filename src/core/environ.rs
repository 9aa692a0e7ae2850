//! Process environment access.
//!
//! The replacer reads and writes the environment through [`Environment`] so
//! tests (and embedders) can hand it an isolated [`MemoryEnv`] instead of the
//! real process environment.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::ApplyError;

/// Read-all / write-one access to a set of environment variables.
pub trait Environment: Send + Sync {
    /// Snapshot as raw `NAME=VALUE` entries.
    fn environ(&self) -> Vec<String>;

    fn set_var(&self, name: &str, value: &str) -> Result<(), ApplyError>;

    fn remove_var(&self, name: &str) -> Result<(), ApplyError>;
}

/// Parse `NAME=VALUE` entries into a map.
///
/// Splits on the first `=`; entries without one are skipped. Later
/// duplicates win.
pub fn parse_environment<I, S>(entries: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            entry
                .as_ref()
                .split_once('=')
                .map(|(name, value)| (name.to_string(), value.to_string()))
        })
        .collect()
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    /// Entries whose name or value is not valid UTF-8 are skipped.
    fn environ(&self) -> Vec<String> {
        std::env::vars_os()
            .filter_map(|(name, value)| {
                let name = name.into_string().ok()?;
                let value = value.into_string().ok()?;
                Some(format!("{name}={value}"))
            })
            .collect()
    }

    fn set_var(&self, name: &str, value: &str) -> Result<(), ApplyError> {
        // std::env::set_var panics on these instead of reporting them.
        let reason = invalid_name(name).or_else(|| {
            value
                .contains('\0')
                .then_some("value contains a NUL byte")
        });
        if let Some(reason) = reason {
            return Err(ApplyError::SetVar {
                name: name.to_string(),
                reason: reason.to_string(),
            });
        }
        std::env::set_var(name, value);
        Ok(())
    }

    fn remove_var(&self, name: &str) -> Result<(), ApplyError> {
        if let Some(reason) = invalid_name(name) {
            return Err(ApplyError::RemoveVar {
                name: name.to_string(),
                reason: reason.to_string(),
            });
        }
        std::env::remove_var(name);
        Ok(())
    }
}

fn invalid_name(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name is empty")
    } else if name.contains('=') {
        Some("name contains '='")
    } else if name.contains('\0') {
        Some("name contains a NUL byte")
    } else {
        None
    }
}

/// An isolated, in-memory environment.
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: Mutex<BTreeMap<String, String>>,
}

impl MemoryEnv {
    pub fn new<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: Mutex::new(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.vars.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Environment for MemoryEnv {
    fn environ(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect()
    }

    fn set_var(&self, name: &str, value: &str) -> Result<(), ApplyError> {
        if let Some(reason) = invalid_name(name) {
            return Err(ApplyError::SetVar {
                name: name.to_string(),
                reason: reason.to_string(),
            });
        }
        self.lock().insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_var(&self, name: &str) -> Result<(), ApplyError> {
        self.lock().remove(name);
        Ok(())
    }
}
