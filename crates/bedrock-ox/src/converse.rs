use std::path::Path;

use aws_sdk_bedrockruntime::{
    primitives::Blob,
    types::{
        ContentBlock, ConversationRole, ConverseOutput, DocumentBlock, DocumentFormat,
        DocumentSource, ImageBlock, ImageFormat, ImageSource, InferenceConfiguration, Message,
        ToolConfiguration,
    },
};

use crate::{Bedrock, error::BedrockError};

/// Instruction sent alongside an image by [`Bedrock::converse_image`].
pub const DESCRIBE_IMAGE_PROMPT: &str = "Describe the content of the image.";

/// Name under which documents are attached to a Converse message.
const DOCUMENT_NAME: &str = "document";

impl Bedrock {
    /// Ask `model_id` to describe an image.
    pub async fn converse_image(
        &self,
        model_id: &str,
        image: Vec<u8>,
        format: ImageFormat,
    ) -> Result<String, BedrockError> {
        let image_block = ImageBlock::builder()
            .format(format)
            .source(ImageSource::Bytes(Blob::new(image)))
            .build()
            .map_err(|e| BedrockError::request_builder("image block", e))?;

        let message = user_message(vec![
            ContentBlock::Image(image_block),
            ContentBlock::Text(DESCRIBE_IMAGE_PROMPT.to_string()),
        ])?;

        let reply = self
            .converse(model_id, vec![message], Some(self.inference.to_sdk()), None)
            .await?;
        first_text(&reply)
    }

    /// Reads the image at `path`; the format follows the file extension.
    pub async fn converse_image_file(
        &self,
        model_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<String, BedrockError> {
        let path = path.as_ref();
        let image = tokio::fs::read(path).await?;
        self.converse_image(model_id, image, image_format_for(path))
            .await
    }

    /// Run `command` (e.g. "Summarize the document") against a PDF.
    pub async fn document_insight(
        &self,
        model_id: &str,
        pdf: Vec<u8>,
        command: &str,
    ) -> Result<String, BedrockError> {
        let document = DocumentBlock::builder()
            .name(DOCUMENT_NAME)
            .format(DocumentFormat::Pdf)
            .source(DocumentSource::Bytes(Blob::new(pdf)))
            .build()
            .map_err(|e| BedrockError::request_builder("document block", e))?;

        let message = user_message(vec![
            ContentBlock::Text(command.to_string()),
            ContentBlock::Document(document),
        ])?;

        let reply = self.converse(model_id, vec![message], None, None).await?;
        first_text(&reply)
    }

    pub async fn document_insight_file(
        &self,
        model_id: &str,
        path: impl AsRef<Path>,
        command: &str,
    ) -> Result<String, BedrockError> {
        let pdf = tokio::fs::read(path).await?;
        self.document_insight(model_id, pdf, command).await
    }

    /// One Converse round trip returning the assistant message.
    pub(crate) async fn converse(
        &self,
        model_id: &str,
        messages: Vec<Message>,
        inference: Option<InferenceConfiguration>,
        tool_config: Option<ToolConfiguration>,
    ) -> Result<Message, BedrockError> {
        log::debug!(
            "Conversing with model `{model_id}` ({} messages)",
            messages.len()
        );

        let response = self
            .client
            .converse()
            .model_id(model_id)
            .set_messages(Some(messages))
            .set_inference_config(inference)
            .set_tool_config(tool_config)
            .send()
            .await
            .map_err(|sdk_error| BedrockError::Converse(sdk_error.to_string()))?;

        match response.output {
            Some(ConverseOutput::Message(message)) => Ok(message),
            _ => Err(BedrockError::NoResponse),
        }
    }
}

pub(crate) fn user_message(content: Vec<ContentBlock>) -> Result<Message, BedrockError> {
    Message::builder()
        .role(ConversationRole::User)
        .set_content(Some(content))
        .build()
        .map_err(|e| BedrockError::request_builder("message", e))
}

/// First text block of an assistant message.
pub(crate) fn first_text(message: &Message) -> Result<String, BedrockError> {
    message
        .content()
        .iter()
        .find_map(|block| block.as_text().ok())
        .cloned()
        .ok_or(BedrockError::NoResponse)
}

/// Image format implied by a file extension; JPEG when unknown.
pub fn image_format_for(path: &Path) -> ImageFormat {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => ImageFormat::Png,
        Some("gif") => ImageFormat::Gif,
        Some("webp") => ImageFormat::Webp,
        _ => ImageFormat::Jpeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format_for() {
        assert_eq!(image_format_for(Path::new("cat.PNG")), ImageFormat::Png);
        assert_eq!(image_format_for(Path::new("/tmp/anim.gif")), ImageFormat::Gif);
        assert_eq!(image_format_for(Path::new("photo.webp")), ImageFormat::Webp);
        assert_eq!(image_format_for(Path::new("photo.jpeg")), ImageFormat::Jpeg);
        assert_eq!(image_format_for(Path::new("no_extension")), ImageFormat::Jpeg);
    }

    #[test]
    fn test_first_text_skips_other_blocks() {
        let tool_use = aws_sdk_bedrockruntime::types::ToolUseBlock::builder()
            .tool_use_id("tooluse_1")
            .name("topSongsTool")
            .input(aws_smithy_types::Document::Null)
            .build()
            .unwrap();

        let message = Message::builder()
            .role(ConversationRole::Assistant)
            .content(ContentBlock::ToolUse(tool_use))
            .content(ContentBlock::Text("The song is Elemental Hotel.".to_string()))
            .build()
            .unwrap();

        assert_eq!(first_text(&message).unwrap(), "The song is Elemental Hotel.");
    }

    #[test]
    fn test_first_text_without_text_is_no_response() {
        let message = user_message(Vec::new()).unwrap();
        assert!(matches!(first_text(&message), Err(BedrockError::NoResponse)));
    }
}
