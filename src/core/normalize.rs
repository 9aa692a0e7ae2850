//! Parameter identifier normalization.
//!
//! Parameter Store accepts either a bare path (`/app/secret`) or the full
//! parameter ARN (`arn:aws:ssm:us-east-1:123456789012:parameter/app/secret`),
//! but always answers with the bare path. Both request and result keys go
//! through [`normalize`] so the two forms meet on the same key.

use std::sync::LazyLock;

use regex::Regex;

/// `arn:<partition>:ssm:<region>:<account>:parameter`, anchored at the start.
static ARN_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^arn:aws[a-z-]*:ssm:[^:/]*:[^:/]*:parameter").expect("valid ARN pattern")
});

/// Strip a leading Parameter Store ARN prefix, leaving the bare path.
///
/// Only strips when a `/`-rooted path follows, so the result never starts
/// with another ARN prefix and normalizing twice changes nothing.
///
/// # Example
///
/// ```
/// use awsenv::core::normalize::normalize;
///
/// let arn = "arn:aws:ssm:us-east-1:123456789012:parameter/remote/password";
/// assert_eq!(normalize(arn), "/remote/password");
/// assert_eq!(normalize("/remote/password"), "/remote/password");
/// ```
pub fn normalize(path: &str) -> &str {
    match qualified_prefix_len(path) {
        Some(len) => &path[len..],
        None => path,
    }
}

/// Length of the ARN prefix at the start of `text`, if one is present and
/// followed by `/`.
pub(crate) fn qualified_prefix_len(text: &str) -> Option<usize> {
    let m = ARN_PREFIX.find(text)?;
    text[m.end()..].starts_with('/').then_some(m.end())
}
