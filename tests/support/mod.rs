//! Test support utilities for awsenv integration tests.
//!
//! Provides isolated environments, parameter sources and helper commands.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod params;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use params::*;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with an isolated temp directory.
///
/// The directory doubles as HOME for the binary, so no shared AWS profile
/// leaks into a test.
pub struct Test {
    pub dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Write `content` to `name` inside the test dir.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("failed to write file");
        path
    }

    /// Read `name` from the test dir.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("failed to read file")
    }
}
