//! File mode.
//!
//! Rewrites a file in place, replacing the first prefixed token per line.

use tokio_util::sync::CancellationToken;

use crate::cli::output;
use crate::core::file::FileReplacer;
use crate::error::Result;

/// Replace parameters in the replacer's file.
pub async fn execute(replacer: &FileReplacer, cancel: &CancellationToken) -> Result<()> {
    replacer.replace_all(cancel).await?;
    output::success(&format!("updated {}", replacer.path().display()));
    Ok(())
}
