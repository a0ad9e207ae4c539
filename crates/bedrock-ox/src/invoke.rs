use async_stream::try_stream;
use std::pin::pin;

use aws_sdk_bedrockruntime::{primitives::Blob, types::ResponseStream};
use futures_util::{
    StreamExt,
    stream::{self, BoxStream},
};

use crate::{
    Bedrock,
    accumulator::StreamingTextAccumulator,
    error::BedrockError,
    event::event_chunks,
    request::{INVOKE_MAX_TOKENS, InvokeRequest, STREAM_MAX_TOKENS},
    response::InvokeResponse,
    sink::TextSink,
};

const JSON_CONTENT_TYPE: &str = "application/json";

impl Bedrock {
    /// Invoke `model_id` once with `prompt` and return the first text block.
    pub async fn invoke_model(&self, model_id: &str, prompt: &str) -> Result<String, BedrockError> {
        let request = InvokeRequest::prompt(prompt, INVOKE_MAX_TOKENS);
        let response = self.send(model_id, &request).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(BedrockError::NoResponse)
    }

    pub async fn send(
        &self,
        model_id: &str,
        request: &InvokeRequest,
    ) -> Result<InvokeResponse, BedrockError> {
        log::debug!("Invoking model `{model_id}`");

        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type(JSON_CONTENT_TYPE)
            .accept(JSON_CONTENT_TYPE)
            .body(Blob::new(request.to_body()?))
            .send()
            .await
            .map_err(|sdk_error| BedrockError::InvokeModel(sdk_error.to_string()))?;

        Ok(serde_json::from_slice(output.body().as_ref())?)
    }

    /// Stream a completion for `prompt`, printing fragments to `sink` as they
    /// arrive, and return the full text once the stream ends.
    pub async fn invoke_model_with_stream(
        &self,
        model_id: &str,
        prompt: &str,
        sink: impl TextSink,
    ) -> Result<String, BedrockError> {
        let request = InvokeRequest::prompt(prompt, STREAM_MAX_TOKENS);
        StreamingTextAccumulator::new(sink)
            .consume(self.stream(model_id, &request))
            .await
    }

    /// Raw payload parts of an `InvokeModelWithResponseStream` call.
    ///
    /// Each item is the byte content of one `chunk` event; errors raised by
    /// the event stream itself surface as [`BedrockError::Transport`].
    pub fn stream(
        &self,
        model_id: &str,
        request: &InvokeRequest,
    ) -> BoxStream<'static, Result<Vec<u8>, BedrockError>> {
        let client = self.client.clone();
        let model_id = model_id.to_string();
        let body = request.to_body();

        Box::pin(try_stream! {
            log::debug!("Invoking model `{model_id}` with response stream");

            let output = client
                .invoke_model_with_response_stream()
                .model_id(&model_id)
                .content_type(JSON_CONTENT_TYPE)
                .accept(JSON_CONTENT_TYPE)
                .body(Blob::new(body?))
                .send()
                .await
                .map_err(|sdk_error| BedrockError::InvokeModel(sdk_error.to_string()))?;

            let events = stream::unfold(output.body, |mut body| async move {
                body.recv().await.transpose().map(|event| (event, body))
            });

            let mut chunks = pin!(event_chunks(events, response_bytes));
            while let Some(chunk) = chunks.next().await {
                yield chunk?;
            }
        })
    }
}

fn response_bytes(event: ResponseStream) -> Option<Vec<u8>> {
    match event {
        ResponseStream::Chunk(part) => part.bytes.map(Blob::into_inner),
        other => {
            log::debug!("Ignoring response stream event: {other:?}");
            None
        }
    }
}
