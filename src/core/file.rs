//! In-place replacement of prefixed tokens in a text file.
//!
//! The file is handled as bytes, so lines that are not valid UTF-8 pass
//! through untouched. Only the first prefixed token on each line is replaced. The same path
//! may appear on any number of lines. Everything outside the token span is
//! written back byte for byte, and the file keeps its permissions.

use std::collections::{BTreeSet, HashMap};
use std::fs::Permissions;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::core::fetch::ParamStore;
use crate::core::scan::{scan_bytes, LineMarker, Prefix};
use crate::error::{ApplyError, ConfigError, Error, Result};

/// Replaces prefixed tokens in one file.
#[derive(Debug)]
pub struct FileReplacer {
    prefix: Prefix,
    path: PathBuf,
    permissions: Permissions,
    store: ParamStore,
}

impl FileReplacer {
    /// Validate the prefix and capture the file's current permissions.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the prefix or path is empty, or the file
    /// cannot be stat'ed. No store request is made.
    pub fn new(prefix: impl Into<String>, path: impl AsRef<Path>, store: ParamStore) -> Result<Self> {
        let prefix = Prefix::new(prefix)?;
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyFilePath.into());
        }

        let metadata = std::fs::metadata(path).map_err(|source| ConfigError::FileStat {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            prefix,
            path: path.to_path_buf(),
            permissions: metadata.permissions(),
            store,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve every prefixed token and rewrite the file.
    ///
    /// Tokens whose path the store did not return are left as they are.
    ///
    /// # Errors
    ///
    /// A read or store failure aborts before anything is written.
    pub async fn replace_all(&self, cancel: &CancellationToken) -> Result<()> {
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|source| Error::ReadFile {
                path: self.path.clone(),
                source,
            })?;

        let mut lines: Vec<Vec<u8>> = content
            .split(|&b| b == b'\n')
            .map(<[u8]>::to_vec)
            .collect();
        let markers: Vec<LineMarker> = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| scan_bytes(&self.prefix, i, line))
            .collect();

        debug!(
            path = %self.path.display(),
            lines = lines.len(),
            markers = markers.len(),
            "scanned file"
        );

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

        let mut replaced = 0;
        let mut skipped: HashMap<&str, usize> = HashMap::new();
        for marker in &markers {
            match fetched.get(&marker.path) {
                Some(value) => {
                    lines[marker.line].splice(marker.start..marker.end, value.bytes());
                    replaced += 1;
                }
                None => *skipped.entry(marker.path.as_str()).or_default() += 1,
            }
        }
        for (path, count) in &skipped {
            debug!(param = %path, occurrences = count, "parameter not found, leaving as is");
        }

        self.write(&lines.join(&b'\n')).await?;
        debug!(path = %self.path.display(), replaced, "file rewritten");
        Ok(())
    }

    /// [`replace_all`](Self::replace_all) for callers with no recovery path.
    ///
    /// # Panics
    ///
    /// Panics with the error message if replacement fails.
    pub async fn must_replace_all(&self, cancel: &CancellationToken) {
        if let Err(e) = self.replace_all(cancel).await {
            error!(error = %e, path = %self.path.display(), "file replacement failed");
            panic!("awsenv: {e}");
        }
    }

    async fn write(&self, content: &[u8]) -> Result<()> {
        let wrap = |source| ApplyError::WriteFile {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&self.path, content).await.map_err(wrap)?;
        tokio::fs::set_permissions(&self.path, self.permissions.clone())
            .await
            .map_err(wrap)?;
        Ok(())
    }
}
