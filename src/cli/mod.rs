//! Command-line interface.

pub mod dump;
pub mod file;
pub mod output;
pub mod run;

use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::constants::{DEFAULT_PREFIX, DEFAULT_REGION};
use crate::core::file::FileReplacer;
use crate::core::replacer::{EnvReplacer, Unresolved};
use crate::core::scan::Prefix;
use crate::core::ssm::{self, AwsOptions};
use crate::error::Result;

const DESCRIPTION: &str = "\
aws-env behaves similarly to the posix env command: if passed a command (with
optional arguments), that command is invoked with additional environment
variables set from Parameter Store. If no command is passed, aws-env prints
export statements suitable for use with eval or source.

With --file, the first prefixed token on each line of the file is replaced in
place. A token ends at the first character that cannot appear in a parameter
path, so surrounding quotes and commas are kept.";

/// aws-env - set environment variables from AWS Parameter Store.
#[derive(Debug, Parser)]
#[command(
    name = "aws-env",
    about = "Set environment variables with values from Parameter Store",
    long_about = DESCRIPTION,
    version
)]
pub struct Cli {
    /// Prefix shared by values that should be replaced (value, NOT name)
    #[arg(long, env = "AWS_ENV_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// AWS region Parameter Store is in
    #[arg(long, env = "AWS_ENV_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// AWS profile to use for auth
    #[arg(long, env = "AWS_ENV_PROFILE")]
    pub profile: Option<String>,

    /// AWS role to assume after initial creds
    #[arg(long, env = "AWS_ENV_ASSUME_ROLE", value_name = "ROLE_ARN")]
    pub assume_role: Option<String>,

    /// File to update in place with Parameter Store values
    #[arg(short, long, conflicts_with = "command")]
    pub file: Option<PathBuf>,

    /// Unset prefixed variables whose parameter does not exist instead of failing
    #[arg(long, env = "AWS_ENV_UNSET_MISSING")]
    pub unset_missing: bool,

    /// Print replacements as JSON instead of export statements
    #[arg(long, conflicts_with_all = ["file", "command"])]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Program to run, followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "PROGRAM")]
    pub command: Vec<String>,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Print export statements (or JSON).
    Dump { json: bool },
    /// Run a program with the resolved environment.
    Run(Vec<String>),
    /// Rewrite a file in place.
    File(PathBuf),
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if let Some(path) = &self.file {
            Mode::File(path.clone())
        } else if self.command.is_empty() {
            Mode::Dump { json: self.json }
        } else {
            Mode::Run(self.command.clone())
        }
    }

    pub fn aws_options(&self) -> AwsOptions {
        AwsOptions {
            region: self.region.clone(),
            profile: self.profile.clone(),
            assume_role: self.assume_role.clone(),
        }
    }

    fn unresolved(&self) -> Unresolved {
        if self.unset_missing {
            Unresolved::Unset
        } else {
            Unresolved::Fail
        }
    }
}

/// Execute the parsed command line.
///
/// Returns the process exit code.
///
/// # Errors
///
/// Returns error if configuration is invalid or replacement fails.
pub fn execute(cli: Cli) -> Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_cli(cli))
}

async fn run_cli(cli: Cli) -> Result<i32> {
    info!(version = env!("CARGO_PKG_VERSION"), "aws-env starting");

    // Reject bad configuration before talking to AWS.
    Prefix::new(cli.prefix.as_str())?;

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received Ctrl+C, cancelling requests");
            token.cancel();
        }
    });

    let store = ssm::store(&cli.aws_options()).await;

    match cli.mode() {
        Mode::File(path) => {
            let replacer = FileReplacer::new(cli.prefix.as_str(), &path, store)?;
            file::execute(&replacer, &cancel).await?;
            Ok(0)
        }
        Mode::Dump { json } => {
            let replacer = EnvReplacer::new(cli.prefix.as_str(), store)?.unresolved(cli.unresolved());
            dump::execute(&replacer, json, &cancel).await?;
            Ok(0)
        }
        Mode::Run(command) => {
            let replacer = EnvReplacer::new(cli.prefix.as_str(), store)?.unresolved(cli.unresolved());
            run::execute(&replacer, &command, &cancel).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("aws-env").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.mode(), Mode::Dump { json: false });
        assert!(!cli.unset_missing);
    }

    #[test]
    fn test_run_mode_keeps_program_flags() {
        let cli = parse(&["--region", "eu-west-1", "env", "-i", "--foo"]);
        assert_eq!(cli.region, "eu-west-1");
        assert_eq!(
            cli.mode(),
            Mode::Run(vec!["env".into(), "-i".into(), "--foo".into()])
        );
    }

    #[test]
    fn test_file_mode() {
        let cli = parse(&["-f", "app.cnf"]);
        assert_eq!(cli.mode(), Mode::File(PathBuf::from("app.cnf")));
    }

    #[test]
    fn test_file_and_command_conflict() {
        let result = Cli::try_parse_from(["aws-env", "-f", "app.cnf", "echo"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_aws_options() {
        let cli = parse(&["--profile", "ops", "--assume-role", "arn:aws:iam::1:role/r"]);
        let options = cli.aws_options();
        assert_eq!(options.profile.as_deref(), Some("ops"));
        assert_eq!(options.assume_role.as_deref(), Some("arn:aws:iam::1:role/r"));
    }

    #[test]
    fn test_unset_missing() {
        assert_eq!(parse(&["--unset-missing"]).unresolved(), Unresolved::Unset);
        assert_eq!(parse(&[]).unresolved(), Unresolved::Fail);
    }
}
