//! Common imports for working with Amazon Bedrock.
//!
//! ```rust,no_run
//! use bedrock_ox::prelude::*;
//!
//! # async fn example() -> Result<(), BedrockError> {
//! let bedrock = Bedrock::load_from_env().await;
//! let text = bedrock
//!     .invoke_model_with_stream(DEFAULT_MODEL_ID, "Tell me about belugas", StdoutSink::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use crate::{
    Bedrock,
    BedrockError,
    accumulator::StreamingTextAccumulator,
    agent::{AgentInvocation, BedrockAgent},
    config::{BedrockConfig, DEFAULT_MODEL_ID, InferenceParams},
    event::{ChunkDecoder, ContentDeltaDecoder, StreamEvent, Utf8Decoder},
    message::{Content, Message, Role},
    request::InvokeRequest,
    response::InvokeResponse,
    sink::{StdoutSink, TextSink},
    textract::{IdentityField, Textract},
    tool::{ToolHandler, TopSongTool},
};
