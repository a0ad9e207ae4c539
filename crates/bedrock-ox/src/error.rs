use thiserror::Error;

#[derive(Error, Debug)]
pub enum BedrockError {
    /// A stream chunk could not be decoded as the expected event record.
    #[error("Failed to decode stream chunk: {0}")]
    Decode(String),

    /// A content delta event did not carry the text it promised.
    #[error("Malformed stream event: {0}")]
    Schema(String),

    /// The response stream faulted before it ended.
    #[error("Error reading from the response stream: {0}")]
    Transport(String),

    /// A chunk was pushed after the call had already failed.
    #[error("Stream accumulation aborted by an earlier error: {0}")]
    Aborted(String),

    #[error("AWS InvokeModel API error: {0}")]
    InvokeModel(String),

    #[error("AWS Converse API error: {0}")]
    Converse(String),

    #[error("AWS InvokeAgent API error: {0}")]
    Agent(String),

    #[error("AWS RetrieveAndGenerate API error: {0}")]
    KnowledgeBase(String),

    #[error("AWS Textract API error: {0}")]
    Textract(String),

    #[error("Failed to build a request for the Bedrock API: {0}")]
    RequestBuilder(String),

    #[error("The model returned no response content")]
    NoResponse,

    #[error("Failed to parse the tool input arguments from the model: {0}")]
    ToolInputParse(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BedrockError {
    pub(crate) fn request_builder(what: &str, error: impl std::fmt::Display) -> Self {
        Self::RequestBuilder(format!("Failed to build {what}: {error}"))
    }

    /// Whether the error came out of streaming accumulation rather than a request.
    pub fn is_stream_error(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::Schema(_) | Self::Transport(_) | Self::Aborted(_)
        )
    }
}
