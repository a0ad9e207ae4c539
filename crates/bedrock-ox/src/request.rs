use bon::Builder;
use serde::Serialize;

use crate::{error::BedrockError, message::Message};

pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Output budget for one-shot invocations.
pub const INVOKE_MAX_TOKENS: u32 = 512;
/// Output budget for streamed invocations.
pub const STREAM_MAX_TOKENS: u32 = 15120;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Native Anthropic Messages payload for `InvokeModel` and
/// `InvokeModelWithResponseStream`.
#[derive(Debug, Clone, Serialize, Builder)]
#[builder(builder_type(vis = "pub"), state_mod(vis = "pub"))]
pub struct InvokeRequest {
    #[builder(field)]
    pub messages: Vec<Message>,
    #[builder(default = ANTHROPIC_VERSION.to_string(), into)]
    pub anthropic_version: String,
    #[builder(default = INVOKE_MAX_TOKENS)]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
}

impl<S: invoke_request_builder::State> InvokeRequestBuilder<S> {
    pub fn messages(mut self, messages: impl IntoIterator<Item = impl Into<Message>>) -> Self {
        self.messages = messages.into_iter().map(Into::into).collect();
        self
    }

    pub fn message(mut self, message: impl Into<Message>) -> Self {
        self.messages.push(message.into());
        self
    }
}

impl InvokeRequest {
    /// Single user prompt at the default temperature.
    pub fn prompt(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self::builder()
            .message(Message::user(prompt))
            .max_tokens(max_tokens)
            .temperature(DEFAULT_TEMPERATURE)
            .build()
    }

    pub fn to_body(&self) -> Result<Vec<u8>, BedrockError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_payload() {
        let request = InvokeRequest::prompt("Provide details about beluga.", INVOKE_MAX_TOKENS);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 512,
                "temperature": 0.5,
                "messages": [{
                    "role": "user",
                    "content": [{ "type": "text", "text": "Provide details about beluga." }]
                }]
            })
        );
    }

    #[test]
    fn test_prompt_with_quotes_stays_valid_json() {
        let request = InvokeRequest::prompt(r#"Say "hi" \ then {{stop}}"#, STREAM_MAX_TOKENS);
        let body = request.to_body().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["max_tokens"], 15120);
        assert_eq!(
            value["messages"][0]["content"][0]["text"],
            r#"Say "hi" \ then {{stop}}"#
        );
    }

    #[test]
    fn test_builder_defaults() {
        let request = InvokeRequest::builder()
            .messages(["first", "second"])
            .system("Be brief")
            .build();

        assert_eq!(request.anthropic_version, ANTHROPIC_VERSION);
        assert_eq!(request.max_tokens, INVOKE_MAX_TOKENS);
        assert_eq!(request.messages.len(), 2);

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("temperature").is_none());
        assert_eq!(value["system"], "Be brief");
    }
}
