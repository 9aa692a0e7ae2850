//! Marker scanning.
//!
//! Finds values that start with the marker prefix (environment mode) and
//! prefixed tokens embedded in lines of text (file mode).

use std::collections::BTreeMap;
use std::fmt;

use crate::core::normalize::qualified_prefix_len;
use crate::error::ConfigError;

/// A validated, non-empty marker prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix(String);

impl Prefix {
    /// Validate a prefix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyPrefix` for the empty string, which would
    /// otherwise match every value.
    pub fn new(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path identifier carried by `value`, if it is prefixed.
    ///
    /// A value equal to the prefix yields an empty identifier.
    pub fn strip<'a>(&self, value: &'a str) -> Option<&'a str> {
        value.strip_prefix(self.0.as_str())
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A prefixed environment value: variable name and the identifier it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvMarker {
    pub name: String,
    pub path: String,
}

/// Collect every variable whose value carries the prefix.
///
/// Output follows the map's (sorted) name order.
pub fn scan_values(prefix: &Prefix, vars: &BTreeMap<String, String>) -> Vec<EnvMarker> {
    vars.iter()
        .filter_map(|(name, value)| {
            prefix.strip(value).map(|path| EnvMarker {
                name: name.clone(),
                path: path.to_string(),
            })
        })
        .collect()
}

/// A prefixed token found in one line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMarker {
    /// Zero-based line number.
    pub line: usize,
    /// Byte offset where the prefix starts.
    pub start: usize,
    /// Byte offset just past the identifier.
    pub end: usize,
    pub path: String,
}

/// Find the first prefixed token in `text`.
///
/// The identifier is the longest run of identifier-safe characters right
/// after the prefix, so quotes, commas and whitespace around the marker
/// stay outside the replaced span. A leading parameter ARN is taken whole.
pub fn scan_line(prefix: &Prefix, line: usize, text: &str) -> Option<LineMarker> {
    let start = text.find(prefix.as_str())?;
    let rest = &text[start + prefix.as_str().len()..];
    let len = token_len(rest);

    Some(LineMarker {
        line,
        start,
        end: start + prefix.as_str().len() + len,
        path: rest[..len].to_string(),
    })
}

/// [`scan_line`] over raw bytes.
///
/// The line may hold invalid UTF-8 anywhere; only the stretch from the
/// prefix up to the first invalid byte is decoded, which is enough to hold
/// any identifier.
pub fn scan_bytes(prefix: &Prefix, line: usize, bytes: &[u8]) -> Option<LineMarker> {
    let needle = prefix.as_str().as_bytes();
    let start = bytes.windows(needle.len()).position(|w| w == needle)?;
    let tail = &bytes[start..];
    let text = match std::str::from_utf8(tail) {
        Ok(text) => text,
        Err(e) => std::str::from_utf8(&tail[..e.valid_up_to()]).ok()?,
    };

    let marker = scan_line(prefix, line, text)?;
    Some(LineMarker {
        start: start + marker.start,
        end: start + marker.end,
        ..marker
    })
}

/// Byte length of the identifier at the start of `text`.
fn token_len(text: &str) -> usize {
    let qualified = qualified_prefix_len(text).unwrap_or(0);
    let tail = &text[qualified..];
    let run = tail
        .char_indices()
        .find(|&(_, c)| !is_path_char(c))
        .map_or(tail.len(), |(i, _)| i);
    qualified + run
}

/// Characters allowed in a Parameter Store path.
pub fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '_' | '-' | '.')
}
