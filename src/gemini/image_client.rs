use crate::{
    config::{ApiKeySource, GeminiConfig},
    error::{EditError, Result},
    gemini::{ImageEditService, GEMINI_IMAGE_MODEL},
    models::{
        first_image_part, ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse,
        GenerationRequest, GenerationResult,
    },
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    api_key: ApiKeySource,
    base_url: String,
}

impl ImageClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: GeminiConfig) -> Self {
        let base_url = config.base_url().to_string();
        Self {
            client,
            api_key: config.api_key,
            base_url,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, GEMINI_IMAGE_MODEL)
    }

    fn build_headers(&self, api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| EditError::ConfigError(format!("API key is not a valid header: {}", e)))?;
        headers.insert("x-goog-api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<Option<GenerationResult>> {
        // Resolved per call; a missing key fails this call only.
        let api_key = self.api_key.resolve()?;
        let payload = GenerateContentRequest::image_edit(request);

        log::info!(
            "Requesting image edit from {} ({} input, {} base64 chars)",
            GEMINI_IMAGE_MODEL,
            request.image.mime_type,
            request.image.data.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers(&api_key)?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EditError::RequestError(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EditError::ResponseError(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(service_error(status.as_u16(), &body));
        }

        parse_edit_response(&body)
    }
}

#[async_trait]
impl ImageEditService for ImageClient {
    async fn edit(&self, request: &GenerationRequest) -> Result<Option<GenerationResult>> {
        self.generate(request).await
    }
}

fn service_error(status: u16, body: &str) -> EditError {
    let message = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => {
            log::error!(
                "Gemini service error: code={:?} status={:?}",
                envelope.error.code,
                envelope.error.status
            );
            envelope
                .error
                .message
                .unwrap_or_else(|| "no message".to_string())
        }
        Err(_) => body.chars().take(512).collect(),
    };

    EditError::ServiceError { status, message }
}

/// Pulls the edited image out of a `generateContent` body.
///
/// A missing candidate, candidate content or `parts` field is a malformed
/// response. A `parts` list with no image in it is a valid, empty answer.
pub fn parse_edit_response(body: &str) -> Result<Option<GenerationResult>> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| EditError::SerializationError(format!("Unexpected response body: {}", e)))?;

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| EditError::ResponseError("Response carried no candidates".into()))?;

    let content = candidate
        .content
        .as_ref()
        .ok_or_else(|| EditError::ResponseError("First candidate has no content".into()))?;

    if let Some(reason) = &candidate.finish_reason {
        log::debug!("Finish reason: {}", reason);
    }

    let parts = content.parts.as_deref().ok_or_else(|| {
        EditError::ResponseError(format!(
            "First candidate has no parts (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        ))
    })?;

    let result = first_image_part(parts);
    if result.is_none() {
        log::warn!(
            "Response had {} part(s) and none carried image data",
            parts.len()
        );
    }

    Ok(result)
}
