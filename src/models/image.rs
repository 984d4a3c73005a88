use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EditError, Result};

/// Content type used when the service omits one on an image part.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

static DATA_URL_MIME: Lazy<Regex> = Lazy::new(|| Regex::new(r":(.*?);").unwrap());

/// The image currently held by the controller, as picked by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub data: String, // Base64 encoded
    pub mime_type: String,
}

impl UploadedImage {
    /// Splits a `data:<type>;base64,<payload>` URL.
    ///
    /// Returns `None` when either the declared type or the payload is
    /// missing or empty. Nothing beyond that is validated: the payload is
    /// kept opaque and non-image types pass through.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let (header, payload) = url.split_once(',')?;
        // Only the first two comma-separated pieces count.
        let payload = payload.split(',').next().unwrap_or_default();

        let mime_type = DATA_URL_MIME
            .captures(header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())?;

        if mime_type.is_empty() || payload.is_empty() {
            return None;
        }

        Some(UploadedImage {
            data: payload.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One outbound edit: the held image plus the instruction as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub image: UploadedImage,
    pub instruction: String,
}

/// The edited image taken from the first image-bearing response part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub data: String, // Base64 encoded
    pub mime_type: String,
}

impl GenerationResult {
    pub fn new(data: impl Into<String>, mime_type: Option<&str>) -> Self {
        let mime_type = mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);

        GenerationResult {
            data: data.into(),
            mime_type: mime_type.to_string(),
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data.trim())
            .map_err(|e| EditError::DecodeError(format!("result payload is not base64: {}", e)))
    }
}
