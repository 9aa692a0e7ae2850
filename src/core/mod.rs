//! Core library components.
//!
//! The replacement engine: scanning for prefixed values, batched parameter
//! lookup, identifier normalization, and applying results to the
//! environment or a file.

pub mod constants;
pub mod environ;
pub mod fetch;
pub mod file;
pub mod normalize;
pub mod replacer;
pub mod scan;

#[cfg(feature = "aws")]
pub mod ssm;
