use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncWriteExt;

use crate::{
    error::{EditError, Result},
    models::GenerationResult,
};

pub const FALLBACK_EXTENSION: &str = "png";

const MAX_NAME_ATTEMPTS: u32 = 1000;

static IMAGE_SUBTYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^image/(\w+)$").unwrap());

/// File extension for a result's content type.
pub fn extension_for(mime_type: &str) -> String {
    match IMAGE_SUBTYPE
        .captures(mime_type.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
    {
        Some(subtype) if subtype == "jpeg" => "jpg".to_string(),
        Some(subtype) => subtype,
        None => FALLBACK_EXTENSION.to_string(),
    }
}

/// `edited-image-<unix millis>.<ext>`
pub fn download_filename(mime_type: &str, timestamp_millis: i64) -> String {
    format!("edited-image-{}.{}", timestamp_millis, extension_for(mime_type))
}

/// `edited-image-<unix millis>-<n>.<ext>` for the n-th clash within one millisecond.
fn numbered_filename(mime_type: &str, timestamp_millis: i64, attempt: u32) -> String {
    if attempt == 0 {
        return download_filename(mime_type, timestamp_millis);
    }
    format!(
        "edited-image-{}-{}.{}",
        timestamp_millis,
        attempt,
        extension_for(mime_type)
    )
}

/// Decodes the result and writes it into `dir`, creating the directory if needed.
pub async fn save_to_dir(result: &GenerationResult, dir: impl AsRef<Path>) -> Result<PathBuf> {
    save_at(result, dir.as_ref(), chrono::Utc::now().timestamp_millis()).await
}

/// Never overwrites: an existing name gets a numeric suffix.
async fn save_at(result: &GenerationResult, dir: &Path, timestamp_millis: i64) -> Result<PathBuf> {
    let bytes = result.decode()?;
    tokio::fs::create_dir_all(dir).await?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let path = dir.join(numbered_filename(&result.mime_type, timestamp_millis, attempt));
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        };

        file.write_all(&bytes).await?;
        file.flush().await?;

        log::info!("💾 Saved {} byte(s) to {}", bytes.len(), path.display());
        return Ok(path);
    }

    Err(EditError::IoError(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free download name in {}", dir.display()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("image/svg+xml"), FALLBACK_EXTENSION);
        assert_eq!(extension_for("application/pdf"), FALLBACK_EXTENSION);
        assert_eq!(extension_for(""), FALLBACK_EXTENSION);
        assert_eq!(extension_for("garbage"), FALLBACK_EXTENSION);
    }

    #[test]
    fn test_filename_pattern() {
        assert_eq!(
            download_filename("image/jpeg", 1_700_000_000_123),
            "edited-image-1700000000123.jpg"
        );
        assert_eq!(download_filename("???", 7), "edited-image-7.png");
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_writes_bytes() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("out");
        let result = GenerationResult::new("aGVsbG8=", Some("image/jpeg"));

        let path = save_to_dir(&result, &dir).await.unwrap();

        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("edited-image-"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_saves_in_same_millisecond_keep_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = GenerationResult::new("Zmlyc3Q=", Some("image/png"));
        let second = GenerationResult::new("c2Vjb25k", Some("image/png"));

        let first_path = save_at(&first, dir.path(), 42).await.unwrap();
        let second_path = save_at(&second, dir.path(), 42).await.unwrap();

        assert_eq!(first_path.file_name().unwrap(), "edited-image-42.png");
        assert_eq!(second_path.file_name().unwrap(), "edited-image-42-1.png");
        assert_eq!(std::fs::read(&first_path).unwrap(), b"first");
        assert_eq!(std::fs::read(&second_path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_save_rejects_bad_payload_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let result = GenerationResult::new("not base64!", None);

        assert!(save_to_dir(&result, dir.path()).await.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
