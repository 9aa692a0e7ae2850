/// Skip a test if AWS credentials or a known parameter are not configured.
#[macro_export]
macro_rules! skip_without_aws {
    () => {
        if std::env::var("AWS_ACCESS_KEY_ID").is_err() && std::env::var("AWS_PROFILE").is_err() {
            eprintln!("SKIPPED: no AWS credentials (AWS_ACCESS_KEY_ID or AWS_PROFILE)");
            return;
        }
        if std::env::var("AWS_ENV_TEST_PARAM").is_err() {
            eprintln!("SKIPPED: AWS_ENV_TEST_PARAM not set (name of an existing parameter)");
            return;
        }
    };
}
