//! HTTP transport
//!
//! [`HttpTransport`] is the one I/O capability the node needs. The host (or a
//! test) supplies it; [`ReqwestTransport`] is the implementation used outside
//! a host, applying the credential to every request it sends.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument, warn};

use crate::config::VoiceAiConfig;
use crate::credentials::VoiceAiCredential;
use crate::error::VoiceAiError;
use crate::request::{FullResponse, PreparedRequest, RequestBody};

/// Sends prepared requests to the Voice AI API
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one authenticated request and return the complete response
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::Unauthorized` for 401/403, `VoiceAiError::Api`
    /// for any other non-2xx status and a transport error variant when no
    /// response arrived.
    async fn send(&self, request: PreparedRequest) -> Result<FullResponse, VoiceAiError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
    credential: VoiceAiCredential,
}

impl ReqwestTransport {
    /// Create a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::Configuration` if the configuration is invalid
    /// or the HTTP client cannot be built.
    pub fn new(config: &VoiceAiConfig) -> Result<Self, VoiceAiError> {
        config.validate().map_err(VoiceAiError::Configuration)?;

        let credential = config
            .credential()
            .ok_or_else(|| VoiceAiError::Configuration("Voice AI API key is required".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                VoiceAiError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Pull a human-readable message out of an error body
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            json.get("message"),
            json.get("detail"),
            json.get("error").and_then(|e| e.get("message")),
            json.get("error"),
        ];
        if let Some(message) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: PreparedRequest) -> Result<FullResponse, VoiceAiError> {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), self.url(&request.path));

        let multipart = matches!(request.body, RequestBody::Multipart(_));
        for (name, value) in &request.headers {
            // reqwest writes its own multipart content type with the boundary
            if multipart && name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = self.credential.authenticate(builder);

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(form) => builder.multipart(form.into_reqwest()?),
        };

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body, status);
            warn!(status = status.as_u16(), message = %message, "Voice AI request failed");

            return Err(match status.as_u16() {
                401 | 403 => VoiceAiError::Unauthorized(message),
                code => VoiceAiError::Api {
                    status: code,
                    message,
                },
            });
        }

        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body = response.bytes().await?;
        request.encoding.check_body(&body)?;

        debug!(
            status = status.as_u16(),
            body_size = body.len(),
            encoding = ?request.encoding,
            "Voice AI request complete"
        );

        Ok(FullResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn new_rejects_missing_key() {
        let err = ReqwestTransport::new(&VoiceAiConfig::default()).unwrap_err();
        assert!(matches!(err, VoiceAiError::Configuration(_)));
    }

    #[test]
    fn new_trims_trailing_slash() {
        let mut config = VoiceAiConfig::with_api_key("k");
        config.base_url = "http://localhost:9000/api/".to_string();

        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.url("/voices"), "http://localhost:9000/api/voices");
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(
            error_message(r#"{"message":"Voice not found"}"#, StatusCode::NOT_FOUND),
            "Voice not found"
        );
        assert_eq!(
            error_message(r#"{"detail":"Invalid token"}"#, StatusCode::UNAUTHORIZED),
            "Invalid token"
        );
        assert_eq!(
            error_message(
                r#"{"error":{"message":"Too long"}}"#,
                StatusCode::BAD_REQUEST
            ),
            "Too long"
        );
        assert_eq!(
            error_message(r#"{"error":"bad_request"}"#, StatusCode::BAD_REQUEST),
            "bad_request"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_or_reason() {
        assert_eq!(
            error_message("upstream exploded", StatusCode::BAD_GATEWAY),
            "upstream exploded"
        );
        assert_eq!(
            error_message("", StatusCode::SERVICE_UNAVAILABLE),
            "Service Unavailable"
        );
    }
}
