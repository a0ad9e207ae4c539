use aws_config::{BehaviorVersion, SdkConfig, meta::region::RegionProviderChain};
use aws_sdk_bedrockruntime::{config::Region, types::InferenceConfiguration};
use bon::Builder;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-haiku-20240307-v1:0";

const REGION_ENV: &str = "BEDROCK_REGION";
const PROFILE_ENV: &str = "BEDROCK_PROFILE";
const MODEL_ID_ENV: &str = "BEDROCK_MODEL_ID";

/// Inference settings sent with every Converse call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceParams {
    pub max_tokens: i32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.5,
            top_p: 0.9,
        }
    }
}

impl InferenceParams {
    pub(crate) fn to_sdk(self) -> InferenceConfiguration {
        InferenceConfiguration::builder()
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .top_p(self.top_p)
            .build()
    }
}

/// Where and how the AWS clients are created.
///
/// Credentials are never held here; they come from the AWS default provider
/// chain (environment, profile files, SSO, instance metadata).
#[derive(Debug, Clone, Builder)]
pub struct BedrockConfig {
    /// Region override. Falls back to the SDK default chain, then `us-east-1`.
    #[builder(into)]
    pub region: Option<String>,
    /// Named profile from the shared AWS config files.
    #[builder(into)]
    pub profile: Option<String>,
    #[builder(default = DEFAULT_MODEL_ID.to_string(), into)]
    pub model_id: String,
    #[builder(default)]
    pub inference: InferenceParams,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BedrockConfig {
    /// Reads `BEDROCK_REGION`, `BEDROCK_PROFILE` and `BEDROCK_MODEL_ID`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self::builder()
            .maybe_region(non_empty(REGION_ENV))
            .maybe_profile(non_empty(PROFILE_ENV))
            .model_id(non_empty(MODEL_ID_ENV).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()))
            .build()
    }

    pub async fn load_sdk_config(&self) -> SdkConfig {
        let region_provider = match &self.region {
            Some(region) => {
                RegionProviderChain::first_try(Region::new(region.clone())).or_default_provider()
            }
            None => RegionProviderChain::default_provider(),
        }
        .or_else(DEFAULT_REGION);

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }

        log::debug!(
            "Loading AWS configuration (region override: {:?}, profile: {:?})",
            self.region,
            self.profile
        );
        loader.load().await
    }
}
