//! AWS Systems Manager Parameter Store resolver.
//!
//! Enable with `--features aws` (on by default).
//!
//! Credentials come from the default provider chain (environment, shared
//! profile, web identity, ECS, instance metadata), optionally narrowed to a
//! named profile and then exchanged for an assumed role.

use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::Parameter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::core::constants::{ASSUME_ROLE_SESSION, DEFAULT_PREFIX, DEFAULT_REGION, SSM_BATCH_LIMIT};
use crate::core::fetch::{ParamMap, ParamStore, ParamsGetter};
use crate::core::replacer::EnvReplacer;
use crate::error::StoreError;

/// Where and as whom to talk to Parameter Store.
#[derive(Debug, Clone)]
pub struct AwsOptions {
    pub region: String,
    pub profile: Option<String>,
    /// Role ARN to assume after resolving the base credentials.
    pub assume_role: Option<String>,
}

impl Default for AwsOptions {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            profile: None,
            assume_role: None,
        }
    }
}

/// Build an SDK config from `options`.
pub async fn load_config(options: &AwsOptions) -> SdkConfig {
    let region = Region::new(options.region.clone());
    debug!(
        region = %region,
        profile = options.profile.as_deref(),
        assume_role = options.assume_role.as_deref(),
        "loading AWS config"
    );

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region.clone());
    if let Some(profile) = &options.profile {
        loader = loader.profile_name(profile);
    }
    let base = loader.load().await;

    let Some(role) = &options.assume_role else {
        return base;
    };

    let provider = AssumeRoleProvider::builder(role)
        .session_name(ASSUME_ROLE_SESSION)
        .region(region.clone())
        .configure(&base)
        .build()
        .await;

    aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(provider)
        .load()
        .await
}

/// Resolves parameters with `GetParameters`.
#[derive(Debug, Clone)]
pub struct SsmParams {
    client: aws_sdk_ssm::Client,
    decrypt: bool,
}

impl SsmParams {
    /// Resolver with decryption of `SecureString` values enabled.
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self {
            client,
            decrypt: true,
        }
    }

    pub fn from_config(config: &SdkConfig) -> Self {
        Self::new(aws_sdk_ssm::Client::new(config))
    }

    pub fn with_decryption(mut self, decrypt: bool) -> Self {
        self.decrypt = decrypt;
        self
    }

    /// Wrap in a [`ParamStore`] capped at the API's batch limit.
    pub fn into_store(self) -> ParamStore {
        ParamStore::new(self).with_limit(SSM_BATCH_LIMIT)
    }
}

#[async_trait]
impl ParamsGetter for SsmParams {
    async fn get_params(&self, names: &[String]) -> std::result::Result<ParamMap, StoreError> {
        let output = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(self.decrypt)
            .send()
            .await
            .map_err(|e| StoreError::Request(DisplayErrorContext(&e).to_string()))?;

        let invalid = output.invalid_parameters();
        if !invalid.is_empty() {
            trace!(invalid = ?invalid, "store reported invalid parameters");
        }

        Ok(collect_parameters(output.parameters()))
    }
}

/// Name to value for every parameter carrying both.
fn collect_parameters(parameters: &[Parameter]) -> ParamMap {
    parameters
        .iter()
        .filter_map(|p| Some((p.name()?.to_string(), p.value()?.to_string())))
        .collect()
}

/// Replace prefixed variables in the process environment using the default
/// AWS config.
///
/// # Panics
///
/// Panics if any variable cannot be resolved or written.
pub async fn must_replace_env() {
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    must_replace_env_with(&config).await;
}

/// [`must_replace_env`] with a caller-supplied AWS config.
///
/// # Panics
///
/// Panics if any variable cannot be resolved or written.
pub async fn must_replace_env_with(config: &SdkConfig) {
    let store = SsmParams::from_config(config).into_store();
    match EnvReplacer::new(DEFAULT_PREFIX, store) {
        Ok(replacer) => replacer.must_replace_all(&CancellationToken::new()).await,
        Err(e) => panic!("awsenv: {e}"),
    }
}

/// Build a [`ParamStore`] for `options`.
pub async fn store(options: &AwsOptions) -> ParamStore {
    let config = load_config(options).await;
    SsmParams::from_config(&config).into_store()
}
