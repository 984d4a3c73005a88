use std::env;
use std::path::PathBuf;

use crate::error::{EditError, Result};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked, in order, when no explicit key is set.
pub const DEFAULT_API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Where the API credential comes from.
///
/// `Env` is resolved on every call, so a key exported after startup is
/// picked up and a missing key only fails the call that needed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    Static(String),
    Env(Vec<String>),
}

impl Default for ApiKeySource {
    fn default() -> Self {
        ApiKeySource::Env(DEFAULT_API_KEY_VARS.iter().map(|s| s.to_string()).collect())
    }
}

impl ApiKeySource {
    pub fn resolve(&self) -> Result<String> {
        match self {
            ApiKeySource::Static(key) if !key.trim().is_empty() => Ok(key.clone()),
            ApiKeySource::Static(_) => {
                Err(EditError::ConfigError("API key is empty".into()))
            }
            ApiKeySource::Env(vars) => vars
                .iter()
                .filter_map(|var| env::var(var).ok())
                .find(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    EditError::ConfigError(format!(
                        "No API key found in environment (checked {})",
                        vars.join(", ")
                    ))
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: ApiKeySource,
    pub base_url: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: ApiKeySource::default(),
            base_url: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let base_url = env::var("GEMINI_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        GeminiConfig {
            api_key: ApiKeySource::default(),
            base_url,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = ApiKeySource::Static(api_key.into());
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key = ApiKeySource::Env(vec![var.into()]);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
            .trim_end_matches('/')
    }
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub gemini: GeminiConfig,
    pub download_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            gemini: GeminiConfig::default(),
            download_dir: PathBuf::from("."),
        }
    }
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let download_dir = env::var("RGEDIT_DOWNLOAD_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        EditorConfig {
            gemini: GeminiConfig::from_env(),
            download_dir,
        }
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_key_resolves() {
        let source = ApiKeySource::Static("secret".into());
        assert_eq!(source.resolve().unwrap(), "secret");
    }

    #[test]
    fn test_blank_static_key_is_rejected() {
        let source = ApiKeySource::Static("   ".into());
        assert!(matches!(source.resolve(), Err(EditError::ConfigError(_))));
    }

    #[test]
    fn test_env_key_resolved_at_call_time() {
        let var = "RGEDIT_TEST_KEY_RESOLVE";
        let source = ApiKeySource::Env(vec![var.to_string()]);

        env::remove_var(var);
        assert!(source.resolve().is_err());

        env::set_var(var, "late-key");
        assert_eq!(source.resolve().unwrap(), "late-key");
        env::remove_var(var);
    }

    #[test]
    fn test_env_key_falls_through_to_next_var() {
        let first = "RGEDIT_TEST_KEY_FIRST";
        let second = "RGEDIT_TEST_KEY_SECOND";
        env::set_var(first, "");
        env::set_var(second, "second-key");

        let source = ApiKeySource::Env(vec![first.to_string(), second.to_string()]);
        assert_eq!(source.resolve().unwrap(), "second-key");

        env::remove_var(first);
        env::remove_var(second);
    }

    #[test]
    fn test_base_url_default_and_trailing_slash() {
        assert_eq!(GeminiConfig::new().base_url(), DEFAULT_GEMINI_BASE_URL);

        let config = GeminiConfig::new().with_base_url("http://localhost:9000/v1beta/");
        assert_eq!(config.base_url(), "http://localhost:9000/v1beta");
    }

    #[test]
    fn test_editor_config_builder() {
        let config = EditorConfig::new()
            .with_download_dir("/tmp/out")
            .with_gemini(GeminiConfig::new().with_api_key("k"));

        assert_eq!(config.download_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.gemini.api_key, ApiKeySource::Static("k".into()));
    }
}
