use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::Result;

pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Declared type of a picked file, sniffed from its magic bytes.
///
/// There is no allow-list; anything unrecognised is labelled
/// `application/octet-stream` and left for the service to reject.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_MIME)
}

/// Renders file bytes the way a browser file reader would.
pub fn to_data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

/// Reads a local file without blocking the runtime and returns its data URL.
pub async fn read_as_data_url(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    log::debug!("Read {} byte(s) from {}", bytes.len(), path.display());
    Ok(to_data_url(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadedImage;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_png_bytes_become_png_data_url() {
        let url = to_data_url(&PNG_MAGIC);
        assert!(url.starts_with("data:image/png;base64,"));

        let image = UploadedImage::from_data_url(&url).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(STANDARD.decode(image.data).unwrap(), PNG_MAGIC);
    }

    #[test]
    fn test_unknown_bytes_fall_back() {
        assert_eq!(sniff_mime(b"just some text"), FALLBACK_MIME);
    }

    #[test]
    fn test_empty_file_does_not_parse() {
        let url = to_data_url(&[]);
        assert_eq!(url, "data:application/octet-stream;base64,");
        assert!(UploadedImage::from_data_url(&url).is_none());
    }

    #[tokio::test]
    async fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let url = read_as_data_url(&path).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_as_data_url(dir.path().join("nope.png")).await.unwrap_err();
        assert!(matches!(err, crate::error::EditError::IoError(_)));
    }
}
