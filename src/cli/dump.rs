//! Dump mode.
//!
//! Prints resolved variables as shell statements for `eval` or `source`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::environ::Environment;
use crate::core::replacer::{EnvReplacer, Replacements};
use crate::error::Result;

/// JSON shape of `--json` output.
#[derive(Debug, Serialize)]
struct Dump<'a> {
    replaced: &'a BTreeMap<String, String>,
    unset: &'a [String],
}

/// Resolve and print replacements to stdout.
pub async fn execute<E: Environment>(
    replacer: &EnvReplacer<E>,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let replacements = replacer.replacements(cancel).await?;

    if replacements.is_empty() {
        info!("nothing to replace");
        if !json {
            return Ok(());
        }
    }

    let rendered = if json {
        render_json(&replacements)?
    } else {
        render_exports(&replacements)
    };
    print!("{rendered}");
    Ok(())
}

/// `export NAME=$'value'` per replaced variable, then `unset NAME` lines.
pub fn render_exports(replacements: &Replacements) -> String {
    let mut out = String::new();
    for (name, value) in &replacements.values {
        info!(envvar = %name, "replacing");
        let _ = writeln!(out, "export {}={}", name, shell_quote(value));
    }
    for name in &replacements.unset {
        let _ = writeln!(out, "unset {}", name);
    }
    out
}

fn render_json(replacements: &Replacements) -> Result<String> {
    let dump = Dump {
        replaced: &replacements.values,
        unset: &replacements.unset,
    };
    let mut out = serde_json::to_string_pretty(&dump)
        .map_err(|e| crate::error::Error::Other(format!("failed to serialize output: {e}")))?;
    out.push('\n');
    Ok(out)
}

/// Quote `value` as an ANSI-C string (`$'...'`).
pub fn shell_quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 3);
    quoted.push_str("$'");
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\x{:02x}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
