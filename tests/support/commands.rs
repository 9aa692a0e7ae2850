//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create an aws-env command with a clean, offline-safe environment.
    ///
    /// Only PATH is carried over. HOME points at the test dir, credentials
    /// are static dummies and instance metadata lookups are disabled.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("aws-env").expect("failed to find aws-env binary");
        cmd.env_clear();
        if let Some(path) = std::env::var_os("PATH") {
            cmd.env("PATH", path);
        }
        cmd.env("HOME", self.dir.path());
        cmd.env("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE");
        cmd.env("AWS_SECRET_ACCESS_KEY", "not-a-real-secret");
        cmd.env("AWS_EC2_METADATA_DISABLED", "true");
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run aws-env with `args`.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run aws-env")
    }
}
