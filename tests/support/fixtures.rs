//! Test fixtures and constants.

/// Config with no markers.
pub const PLAIN_CNF: &str = r#"
mysql_users:
 (
	{
		username = "username"
		password = "password"
		default_hostgroup = 0
		max_connections=1000
		default_schema="information_schema"
		active = 1
	}
 )
"#;

/// Config with quoted markers.
pub const QUOTED_CNF: &str = r#"
mysql_users:
 (
	{
		username = "awsenv:/path/to/the/username"
		password = "awsenv:/path/to/the/password"
		default_hostgroup = 0
		max_connections=1000
		default_schema="information_schema"
		active = 1
	}
 )
"#;

/// Comma-terminated fields, each path used twice.
pub const REPEATED_CNF: &str = r#"
mysql_users:
 (
	{
		username = "awsenv:/path/to/the/username",
		password = "awsenv:/path/to/the/password",
		default_hostgroup = 0,
		active = 1,
		admin_username = "awsenv:/path/to/the/username",
		admin_password = "awsenv:/path/to/the/password",
	}
 )
"#;

/// A bare path next to a cross-account ARN.
pub const MIXED_CNF: &str = r#"
mysql_users:
 (
	{
		username = "awsenv:/path/to/the/username",
		password = "awsenv:arn:aws:ssm:us-east-1:123456789012:parameter/remote/password",
	}
 )
"#;

/// Parameters backing the configs above.
pub const PARAMS: &[(&str, &str)] = &[
    ("/path/to/the/username", "user"),
    ("/path/to/the/password", "password"),
    ("/remote/password", "remote_pass"),
];
