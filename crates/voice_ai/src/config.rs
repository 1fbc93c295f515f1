//! Configuration for the Voice AI node

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::credentials::VoiceAiCredential;

/// Base URL of the Voice AI text-to-speech API
pub const DEFAULT_BASE_URL: &str = "https://dev.voice.ai/api/v1/tts";

/// Configuration for talking to the Voice AI API
#[derive(Clone, Serialize, Deserialize)]
pub struct VoiceAiConfig {
    /// API key (sensitive - uses SecretString)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// API base URL (for custom endpoints)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

impl Default for VoiceAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl fmt::Debug for VoiceAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceAiConfig")
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl VoiceAiConfig {
    /// Create a config with the given API key and defaults for everything else
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(api_key.into())),
            ..Default::default()
        }
    }

    /// Load configuration from environment and optional file
    ///
    /// Sources, lowest precedence first: built-in defaults, `voiceai.toml`
    /// (or any format `config` understands) in the working directory, then
    /// `VOICEAI_*` environment variables (e.g. `VOICEAI_API_KEY`).
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .add_source(config::File::with_name("voiceai").required(false))
            .add_source(config::Environment::with_prefix("VOICEAI").try_parsing(true));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        match &self.api_key {
            Some(key) if !key.expose_secret().trim().is_empty() => {},
            _ => return Err("Voice AI API key is required".to_string()),
        }

        if self.base_url.trim().is_empty() {
            return Err("Base URL must not be empty".to_string());
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Credential built from the configured API key
    #[must_use]
    pub fn credential(&self) -> Option<VoiceAiCredential> {
        self.api_key
            .as_ref()
            .map(|key| VoiceAiCredential::new(key.expose_secret()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = VoiceAiConfig::default();

        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, "https://dev.voice.ai/api/v1/tts");
        assert_eq!(config.timeout_ms, 30000);
    }

    #[test]
    fn validate_fails_without_api_key() {
        let config = VoiceAiConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_blank_api_key() {
        let config = VoiceAiConfig::with_api_key("   ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_succeeds_with_api_key() {
        let config = VoiceAiConfig::with_api_key("test-key");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_fails_with_zero_timeout() {
        let mut config = VoiceAiConfig::with_api_key("test-key");
        config.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_empty_base_url() {
        let mut config = VoiceAiConfig::with_api_key("test-key");
        config.base_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = VoiceAiConfig::with_api_key("super-secret");
        let debug = format!("{config:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml = r#"
            api_key = "va-test"
            base_url = "http://localhost:8080"
            timeout_ms = 5000
        "#;

        let config: VoiceAiConfig = toml::from_str(toml).unwrap();

        assert_eq!(
            config.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("va-test".to_string())
        );
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_ms, 5000);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: VoiceAiConfig = toml::from_str("").unwrap();

        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_ms, 30000);
    }

    #[test]
    fn credential_is_built_from_key() {
        let config = VoiceAiConfig::with_api_key("abc");
        let credential = config.credential().unwrap();
        let request = credential
            .authenticate(reqwest::Client::new().get("http://localhost/voices"))
            .build()
            .unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer abc");
    }
}
