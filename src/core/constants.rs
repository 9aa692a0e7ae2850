//! Constants used throughout awsenv.
//!
//! Centralizes magic strings and configuration values.

/// Default marker prefix flagging a value as a Parameter Store reference.
pub const DEFAULT_PREFIX: &str = "awsenv:";

/// Maximum number of names a single `GetParameters` call accepts.
pub const SSM_BATCH_LIMIT: usize = 10;

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Session name used when assuming a role.
pub const ASSUME_ROLE_SESSION: &str = "awsenv_assume_role_session";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "AWS_ENV_LOG";
