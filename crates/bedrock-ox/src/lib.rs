#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Amazon Bedrock helpers: model invocation (one-shot and streamed), the
//! Converse API with images, documents and tools, agents, knowledge bases
//! and Textract identity-document analysis.
//!
//! Authentication, signing, retries and transport belong to the AWS SDK.
//! What this crate owns is turning a streamed response into text, see
//! [`StreamingTextAccumulator`].

pub mod accumulator;
pub mod agent;
pub mod config;
pub mod conversion;
pub mod converse;
pub mod error;
pub mod event;
pub mod invoke;
pub mod message;
pub mod prelude;
pub mod request;
pub mod response;
pub mod sink;
pub mod textract;
pub mod tool;

pub use accumulator::StreamingTextAccumulator;
pub use agent::{AgentInvocation, BedrockAgent};
pub use config::{BedrockConfig, InferenceParams};
pub use error::BedrockError;
pub use event::StreamEvent;
pub use sink::{StdoutSink, TextSink};
pub use textract::{IdentityField, Textract};

use aws_sdk_bedrockruntime::Client as BedrockRuntimeClient;

/// Client for the Bedrock runtime (`InvokeModel*` and `Converse`).
#[derive(Debug, Clone)]
pub struct Bedrock {
    client: BedrockRuntimeClient,
    inference: InferenceParams,
}

impl Bedrock {
    /// Create a client from the AWS environment and `BEDROCK_*` variables.
    pub async fn load_from_env() -> Self {
        Self::from_config(&BedrockConfig::from_env()).await
    }

    pub async fn from_config(config: &BedrockConfig) -> Self {
        let sdk_config = config.load_sdk_config().await;
        Self {
            client: BedrockRuntimeClient::new(&sdk_config),
            inference: config.inference,
        }
    }

    /// Wrap an already configured SDK client.
    pub fn with_client(client: BedrockRuntimeClient) -> Self {
        Self {
            client,
            inference: InferenceParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_bedrockruntime::config::{BehaviorVersion, Config, Region};

    #[test]
    fn test_with_client_uses_default_inference() {
        let config = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();

        let bedrock = Bedrock::with_client(BedrockRuntimeClient::from_conf(config));
        assert_eq!(bedrock.inference, InferenceParams::default());
    }
}
