use serde::Deserialize;

/// Native Anthropic Messages response returned by `InvokeModel`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub content: Vec<ResponseContent>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

impl InvokeResponse {
    /// First text block of the response.
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|content| match content {
            ResponseContent::Text { text } => Some(text.as_str()),
            ResponseContent::Other => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "id": "msg_bdrk_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-haiku-20240307",
            "content": [{"type": "text", "text": "Belugas are white whales."}],
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {"input_tokens": 21, "output_tokens": 9}
        }"#;

        let response: InvokeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), Some("Belugas are white whales."));
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(
            response.usage,
            Some(Usage {
                input_tokens: 21,
                output_tokens: 9
            })
        );
    }

    #[test]
    fn test_text_skips_non_text_blocks() {
        let body = r#"{
            "content": [
                {"type": "tool_use", "id": "toolu_1", "name": "lookup", "input": {}},
                {"type": "text", "text": "done"}
            ]
        }"#;

        let response: InvokeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.content[0], ResponseContent::Other);
        assert_eq!(response.text(), Some("done"));
    }

    #[test]
    fn test_empty_content_has_no_text() {
        let response: InvokeResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert_eq!(response.text(), None);
    }
}
