//! aws-env - set environment variables from AWS Parameter Store.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use awsenv::cli::{execute, output, Cli};
use awsenv::core::constants::LOG_ENV;
use awsenv::error::{ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so dump output on stdout stays eval-safe.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("awsenv=debug")
        } else {
            EnvFilter::new("awsenv=warn")
        }
    });

    let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    if cli.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.without_time())
            .init();
    }

    match execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let suggestion = match &e {
                Error::NotFound(_) => Some("check the parameter paths referenced by prefixed values"),
                Error::Store(_) => Some("check --region, --profile and AWS credentials"),
                Error::Config(ConfigError::EmptyPrefix) => Some("pass a non-empty --prefix"),
                Error::CommandNotFound(_) => Some("check the program name and PATH"),
                _ => None,
            };

            output::error(&e.to_string());
            if let Some(hint) = suggestion {
                output::hint(hint);
            }
            std::process::exit(1);
        }
    }
}
