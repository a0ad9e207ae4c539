//! Tool use over the Converse API.
//!
//! The model is offered one tool. When it answers with a `toolUse` block the
//! handler runs locally and its JSON result goes back as a `toolResult`; the
//! model's follow-up text is the answer.

use aws_sdk_bedrockruntime::types::{
    ContentBlock, Message, Tool, ToolConfiguration, ToolInputSchema, ToolResultBlock,
    ToolResultContentBlock, ToolResultStatus, ToolSpecification,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Bedrock,
    conversion::{document_to_json, json_to_document},
    converse::{first_text, user_message},
    error::BedrockError,
};

pub const DEFAULT_TOOL_MODEL_ID: &str = "cohere.command-r-v1:0";

/// A locally executed tool the model may call.
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool input.
    fn input_schema(&self) -> Value;

    fn call(&self, input: Value) -> Result<Value, BedrockError>;
}

impl Bedrock {
    /// Ask `prompt` with `handler` available and return the final answer.
    pub async fn use_tool(
        &self,
        model_id: &str,
        prompt: &str,
        handler: &dyn ToolHandler,
    ) -> Result<String, BedrockError> {
        let tool_config = tool_configuration(handler)?;
        let inference = self.inference.to_sdk();

        let mut messages = vec![user_message(vec![ContentBlock::Text(prompt.to_string())])?];
        let reply = self
            .converse(
                model_id,
                messages.clone(),
                Some(inference.clone()),
                Some(tool_config.clone()),
            )
            .await?;

        let results = tool_results(&reply, handler)?;
        if results.is_empty() {
            return first_text(&reply);
        }

        messages.push(reply);
        messages.push(user_message(results)?);

        let answer = self
            .converse(model_id, messages, Some(inference), Some(tool_config))
            .await?;
        first_text(&answer)
    }
}

pub fn tool_configuration(handler: &dyn ToolHandler) -> Result<ToolConfiguration, BedrockError> {
    let spec = ToolSpecification::builder()
        .name(handler.name())
        .description(handler.description())
        .input_schema(ToolInputSchema::Json(json_to_document(handler.input_schema())))
        .build()
        .map_err(|e| BedrockError::request_builder("tool specification", e))?;

    ToolConfiguration::builder()
        .tools(Tool::ToolSpec(spec))
        .build()
        .map_err(|e| BedrockError::request_builder("tool configuration", e))
}

/// Answers every tool request in `reply`. Requests for tools other than
/// `handler` get an error result so no `toolUse` id is left unanswered.
fn tool_results(
    reply: &Message,
    handler: &dyn ToolHandler,
) -> Result<Vec<ContentBlock>, BedrockError> {
    let mut results = Vec::new();

    for block in reply.content() {
        let Ok(tool_use) = block.as_tool_use() else {
            continue;
        };

        let result = if tool_use.name() == handler.name() {
            log::debug!("Calling tool `{}` ({})", tool_use.name(), tool_use.tool_use_id());
            let output = handler.call(document_to_json(tool_use.input()))?;

            ToolResultBlock::builder()
                .tool_use_id(tool_use.tool_use_id())
                .content(ToolResultContentBlock::Json(json_to_document(output)))
        } else {
            log::warn!("Model requested unknown tool `{}`", tool_use.name());

            ToolResultBlock::builder()
                .tool_use_id(tool_use.tool_use_id())
                .content(ToolResultContentBlock::Text(format!(
                    "Unknown tool `{}`",
                    tool_use.name()
                )))
                .status(ToolResultStatus::Error)
        };

        let result = result
            .build()
            .map_err(|e| BedrockError::request_builder("tool result", e))?;
        results.push(ContentBlock::ToolResult(result));
    }

    Ok(results)
}

/// Most popular song on a radio station, looked up by call sign.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopSongTool;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TopSong {
    pub song: String,
    pub artist: String,
}

#[derive(Debug, Deserialize)]
struct TopSongInput {
    sign: String,
}

impl TopSongTool {
    pub fn top_song(sign: &str) -> TopSong {
        match sign {
            "WZPZ" => TopSong {
                song: "Elemental Hotel".to_string(),
                artist: "8 Storey Hike".to_string(),
            },
            _ => TopSong {
                song: "No Song".to_string(),
                artist: String::new(),
            },
        }
    }
}

impl ToolHandler for TopSongTool {
    fn name(&self) -> &str {
        "topSongsTool"
    }

    fn description(&self) -> &str {
        "Get the most popular song played on a radio station."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sign": {
                    "type": "string",
                    "description": "The call sign for the radio station for which you want the most popular song. Example calls signs are WZPZ, and WKRP."
                }
            },
            "required": ["sign"]
        })
    }

    fn call(&self, input: Value) -> Result<Value, BedrockError> {
        let input: TopSongInput =
            serde_json::from_value(input).map_err(|e| BedrockError::ToolInputParse(e.to_string()))?;
        Ok(serde_json::to_value(Self::top_song(&input.sign))?)
    }
}
