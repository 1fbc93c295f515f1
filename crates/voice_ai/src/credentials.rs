//! Voice AI API credential
//!
//! One secret (the API key) sent as a bearer token on every request. The
//! credential test issues `GET /voices`; any 2xx means the key is valid.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::DEFAULT_BASE_URL;
use crate::description::FieldDescriptor;
use crate::request::{HttpMethod, PreparedRequest};

/// Credential type name referenced by the node
pub const CREDENTIAL_NAME: &str = "voiceAiApi";

/// Path requested by the credential test
pub const CREDENTIAL_TEST_PATH: &str = "/voices";

/// API key credential
#[derive(Clone)]
pub struct VoiceAiCredential {
    api_key: SecretString,
}

impl VoiceAiCredential {
    /// Wrap an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
        }
    }

    /// Attach the credential to a `reqwest` request
    #[must_use]
    pub fn authenticate(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(self.api_key.expose_secret())
    }
}

impl fmt::Debug for VoiceAiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceAiCredential")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Header injected by the credential, with its value as a host expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationRule {
    /// Header name
    pub header: String,
    /// Header value template
    pub value: String,
}

/// Request used to verify a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTest {
    /// Base URL
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Path
    pub url: String,
    /// Method
    pub method: HttpMethod,
}

/// Credential type description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescription {
    /// Type name
    pub name: String,
    /// Label
    pub display_name: String,
    /// Icon reference
    pub icon: String,
    /// Documentation link
    pub documentation_url: String,
    /// Fields
    pub properties: Vec<FieldDescriptor>,
    /// Header injection rule
    pub authenticate: AuthenticationRule,
    /// Test request
    pub test: CredentialTest,
}

/// Build the credential type description
#[must_use]
pub fn credential_description() -> CredentialDescription {
    CredentialDescription {
        name: CREDENTIAL_NAME.to_string(),
        display_name: "Voice AI API".to_string(),
        icon: "file:voiceai.svg".to_string(),
        documentation_url: "https://voice.ai/docs/api-reference".to_string(),
        properties: vec![
            FieldDescriptor::password("API Key", "apiKey")
                .describe("Your Voice.ai API key (Bearer token)")
                .required(),
        ],
        authenticate: AuthenticationRule {
            header: "Authorization".to_string(),
            value: "=Bearer {{$credentials.apiKey}}".to_string(),
        },
        test: CredentialTest {
            base_url: DEFAULT_BASE_URL.to_string(),
            url: CREDENTIAL_TEST_PATH.to_string(),
            method: HttpMethod::Get,
        },
    }
}

/// The credential test as a dispatchable request
#[must_use]
pub fn credential_test_request() -> PreparedRequest {
    PreparedRequest::new(HttpMethod::Get, CREDENTIAL_TEST_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_key() {
        let credential = VoiceAiCredential::new("va-123");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("va-123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn authenticate_sets_authorization_header() {
        let credential = VoiceAiCredential::new("va-123");
        let request = credential
            .authenticate(reqwest::Client::new().get("http://localhost/voices"))
            .build()
            .unwrap();

        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer va-123"
        );
    }

    #[test]
    fn description_declares_password_field_and_test() {
        let description = credential_description();

        assert_eq!(description.name, "voiceAiApi");
        assert_eq!(description.properties.len(), 1);
        assert_eq!(description.properties[0].name, "apiKey");
        assert!(description.properties[0].required);
        assert_eq!(description.test.url, "/voices");
        assert_eq!(description.test.method, HttpMethod::Get);
        assert_eq!(description.test.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_request_is_get_voices() {
        let request = credential_test_request();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.path, "/voices");
    }
}
