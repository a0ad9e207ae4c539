use std::pin::pin;

use async_stream::try_stream;
use aws_sdk_bedrockagentruntime::{
    Client as AgentRuntimeClient,
    primitives::Blob,
    types::{
        KnowledgeBaseRetrieveAndGenerateConfiguration, ResponseStream,
        RetrieveAndGenerateConfiguration, RetrieveAndGenerateInput, RetrieveAndGenerateType,
    },
};
use bon::Builder;
use futures_util::{
    StreamExt,
    stream::{self, BoxStream},
};

use crate::{
    accumulator::StreamingTextAccumulator, config::BedrockConfig, error::BedrockError,
    event::{Utf8Decoder, event_chunks},
    sink::TextSink,
};

/// Client for Bedrock agents and knowledge bases.
#[derive(Debug, Clone)]
pub struct BedrockAgent {
    client: AgentRuntimeClient,
}

/// Identifies one turn of an agent session.
#[derive(Debug, Clone, Builder)]
pub struct AgentInvocation {
    #[builder(into)]
    pub agent_id: String,
    #[builder(into)]
    pub agent_alias_id: String,
    /// Reusing a session id continues the conversation.
    #[builder(into)]
    pub session_id: String,
    #[builder(into)]
    pub input_text: String,
}

impl BedrockAgent {
    pub fn new(client: AgentRuntimeClient) -> Self {
        Self { client }
    }

    pub async fn load_from_env() -> Self {
        Self::from_config(&BedrockConfig::from_env()).await
    }

    pub async fn from_config(config: &BedrockConfig) -> Self {
        let sdk_config = config.load_sdk_config().await;
        Self::new(AgentRuntimeClient::new(&sdk_config))
    }

    /// Send one turn to an agent and return its full completion.
    ///
    /// Completion chunks are plain text; each is passed to `sink` as it
    /// arrives.
    pub async fn invoke_agent(
        &self,
        invocation: &AgentInvocation,
        sink: impl TextSink,
    ) -> Result<String, BedrockError> {
        StreamingTextAccumulator::with_decoder(Utf8Decoder, sink)
            .consume(self.completion(invocation))
            .await
    }

    /// Raw completion chunks of an `InvokeAgent` call.
    pub fn completion(
        &self,
        invocation: &AgentInvocation,
    ) -> BoxStream<'static, Result<Vec<u8>, BedrockError>> {
        let client = self.client.clone();
        let invocation = invocation.clone();

        Box::pin(try_stream! {
            log::debug!(
                "Invoking agent `{}` (alias `{}`, session `{}`)",
                invocation.agent_id,
                invocation.agent_alias_id,
                invocation.session_id
            );

            let output = client
                .invoke_agent()
                .agent_id(invocation.agent_id)
                .agent_alias_id(invocation.agent_alias_id)
                .session_id(invocation.session_id)
                .input_text(invocation.input_text)
                .send()
                .await
                .map_err(|sdk_error| BedrockError::Agent(sdk_error.to_string()))?;

            let events = stream::unfold(output.completion, |mut completion| async move {
                completion.recv().await.transpose().map(|event| (event, completion))
            });

            let mut chunks = pin!(event_chunks(events, completion_bytes));
            while let Some(chunk) = chunks.next().await {
                yield chunk?;
            }
        })
    }

    /// Retrieve from a knowledge base and generate an answer with `model_arn`.
    pub async fn query_knowledge_base(
        &self,
        knowledge_base_id: &str,
        text: &str,
        model_arn: &str,
    ) -> Result<String, BedrockError> {
        let input = RetrieveAndGenerateInput::builder()
            .text(text)
            .build()
            .map_err(|e| BedrockError::request_builder("retrieve input", e))?;

        let knowledge_base = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(knowledge_base_id)
            .model_arn(model_arn)
            .build()
            .map_err(|e| BedrockError::request_builder("knowledge base configuration", e))?;

        let configuration = RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(knowledge_base)
            .build()
            .map_err(|e| BedrockError::request_builder("retrieve and generate configuration", e))?;

        log::debug!("Querying knowledge base `{knowledge_base_id}`");

        let response = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(configuration)
            .send()
            .await
            .map_err(|sdk_error| BedrockError::KnowledgeBase(sdk_error.to_string()))?;

        response
            .output()
            .map(|output| output.text().to_string())
            .ok_or(BedrockError::NoResponse)
    }
}

fn completion_bytes(event: ResponseStream) -> Option<Vec<u8>> {
    match event {
        ResponseStream::Chunk(part) => part.bytes.map(Blob::into_inner),
        _ => {
            log::debug!("Ignoring non-chunk agent event");
            None
        }
    }
}
