pub mod image_client;

use crate::{
    error::Result,
    models::{GenerationRequest, GenerationResult},
};
use async_trait::async_trait;

pub use image_client::ImageClient;

/// Model used for every edit. Fixed at build time.
pub const GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// The remote side of an edit cycle.
///
/// `Ok(None)` means the service answered but no part carried image data.
#[async_trait]
pub trait ImageEditService: Send + Sync {
    async fn edit(&self, request: &GenerationRequest) -> Result<Option<GenerationResult>>;

    fn model(&self) -> &str {
        GEMINI_IMAGE_MODEL
    }
}
