//! Decoding of individual response-stream chunks.
//!
//! Bedrock delivers a streamed model response as a sequence of payload parts.
//! For Anthropic models every part is one JSON event record such as
//! `{"type":"content_block_delta","delta":{"type":"text_delta","text":"Hel"}}`.

use std::{fmt::Display, pin::pin};

use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use serde_json::Value;

use crate::error::BedrockError;

/// Event kind carrying an incremental text fragment.
pub const CONTENT_BLOCK_DELTA: &str = "content_block_delta";

/// One decoded stream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental fragment of generated text.
    ContentDelta { text: String },
    /// Any other well-formed event (`message_start`, `message_stop`, `ping`, ...).
    Other { kind: String },
}

impl StreamEvent {
    /// Decodes a single chunk.
    ///
    /// Bytes that are not a JSON object with a string `type` field are a
    /// [`BedrockError::Decode`]. A `content_block_delta` record without a
    /// string at `delta.text` is a [`BedrockError::Schema`]. Unknown kinds
    /// decode to [`StreamEvent::Other`].
    pub fn decode(chunk: &[u8]) -> Result<Self, BedrockError> {
        let record: Value =
            serde_json::from_slice(chunk).map_err(|e| BedrockError::Decode(e.to_string()))?;

        let kind = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BedrockError::Decode("event record has no `type` field".to_string()))?;

        if kind != CONTENT_BLOCK_DELTA {
            return Ok(Self::Other {
                kind: kind.to_string(),
            });
        }

        let text = record
            .pointer("/delta/text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BedrockError::Schema(format!("`{CONTENT_BLOCK_DELTA}` event without `delta.text`"))
            })?;

        Ok(Self::ContentDelta {
            text: text.to_string(),
        })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::ContentDelta { text } => Some(text),
            Self::Other { .. } => None,
        }
    }
}

/// Turns one raw chunk into the text fragment it contributes, if any.
pub trait ChunkDecoder {
    fn decode(&self, chunk: &[u8]) -> Result<Option<String>, BedrockError>;
}

/// Decoder for model response streams: keeps `content_block_delta` text,
/// skips every other event kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentDeltaDecoder;

impl ChunkDecoder for ContentDeltaDecoder {
    fn decode(&self, chunk: &[u8]) -> Result<Option<String>, BedrockError> {
        match StreamEvent::decode(chunk)? {
            StreamEvent::ContentDelta { text } => Ok(Some(text)),
            StreamEvent::Other { kind } => {
                log::debug!("Skipping stream event of kind `{kind}`");
                Ok(None)
            }
        }
    }
}

/// Decoder for agent completions, whose chunks are plain UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Decoder;

impl ChunkDecoder for Utf8Decoder {
    fn decode(&self, chunk: &[u8]) -> Result<Option<String>, BedrockError> {
        std::str::from_utf8(chunk)
            .map(|text| Some(text.to_string()))
            .map_err(|e| BedrockError::Decode(format!("chunk is not valid UTF-8: {e}")))
    }
}

/// Maps an SDK event stream to the payload bytes it carries.
///
/// Events for which `payload` yields nothing are skipped. The first receive
/// error ends the stream as a [`BedrockError::Transport`].
pub(crate) fn event_chunks<T, E, St>(
    events: St,
    payload: fn(T) -> Option<Vec<u8>>,
) -> impl Stream<Item = Result<Vec<u8>, BedrockError>>
where
    St: Stream<Item = Result<T, E>>,
    E: Display,
{
    try_stream! {
        let mut events = pin!(events);
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| BedrockError::Transport(e.to_string()))?;
            if let Some(bytes) = payload(event) {
                yield bytes;
            }
        }
    }
}
