use std::path::Path;

use aws_sdk_textract::{
    Client as TextractClient,
    primitives::Blob,
    types::{Document, IdentityDocumentField},
};
use serde::Serialize;

use crate::{config::BedrockConfig, error::BedrockError};

/// Textract client for identity-document analysis.
#[derive(Debug, Clone)]
pub struct Textract {
    client: TextractClient,
}

/// One field found on an identity document, e.g. `FIRST_NAME` = `JOHN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityField {
    /// Normalized field name.
    pub kind: String,
    pub value: String,
    pub confidence: Option<f32>,
}

impl Textract {
    pub fn new(client: TextractClient) -> Self {
        Self { client }
    }

    pub async fn load_from_env() -> Self {
        Self::from_config(&BedrockConfig::from_env()).await
    }

    pub async fn from_config(config: &BedrockConfig) -> Self {
        let sdk_config = config.load_sdk_config().await;
        Self::new(TextractClient::new(&sdk_config))
    }

    /// Analyze a single-page identity document (passport, driver license).
    pub async fn analyze_id(&self, document: Vec<u8>) -> Result<Vec<IdentityField>, BedrockError> {
        let page = Document::builder().bytes(Blob::new(document)).build();

        log::debug!("Analyzing identity document");

        let response = self
            .client
            .analyze_id()
            .document_pages(page)
            .send()
            .await
            .map_err(|sdk_error| BedrockError::Textract(sdk_error.to_string()))?;

        Ok(response
            .identity_documents()
            .iter()
            .flat_map(|document| document.identity_document_fields())
            .filter_map(identity_field)
            .collect())
    }

    pub async fn analyze_id_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<IdentityField>, BedrockError> {
        let document = tokio::fs::read(path).await?;
        self.analyze_id(document).await
    }
}

/// Fields without a type or a detected value carry nothing to report.
fn identity_field(field: &IdentityDocumentField) -> Option<IdentityField> {
    let kind = field.r#type()?;
    let value = field.value_detection()?;

    Some(IdentityField {
        kind: kind.text().to_string(),
        value: value.text().to_string(),
        confidence: value.confidence(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_textract::types::AnalyzeIdDetections;

    fn detection(text: &str, confidence: f32) -> AnalyzeIdDetections {
        AnalyzeIdDetections::builder()
            .text(text)
            .confidence(confidence)
            .build()
            .unwrap()
    }

    #[test]
    fn test_identity_field() {
        let field = IdentityDocumentField::builder()
            .r#type(detection("FIRST_NAME", 99.0))
            .value_detection(detection("JANE", 98.5))
            .build();

        assert_eq!(
            identity_field(&field),
            Some(IdentityField {
                kind: "FIRST_NAME".to_string(),
                value: "JANE".to_string(),
                confidence: Some(98.5),
            })
        );
    }

    #[test]
    fn test_identity_field_without_value_is_skipped() {
        let field = IdentityDocumentField::builder()
            .r#type(detection("MIDDLE_NAME", 99.0))
            .build();

        assert_eq!(identity_field(&field), None);
    }
}
