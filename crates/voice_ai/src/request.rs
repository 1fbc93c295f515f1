//! Outgoing requests and raw responses
//!
//! These are the values exchanged between the routing layer, the hooks and an
//! [`HttpTransport`](crate::transport::HttpTransport). They carry no client
//! state so hooks can inspect and rewrite them before dispatch.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::VoiceAiError;

/// HTTP verbs used by the Voice AI API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Equivalent `reqwest` method
    #[must_use]
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// How the response body should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseEncoding {
    /// JSON document
    #[default]
    Json,
    /// Raw bytes (audio)
    ArrayBuffer,
}

impl ResponseEncoding {
    /// Check a successful response body against the expected encoding
    ///
    /// JSON bodies must be empty or a well-formed document. Raw bodies are
    /// accepted as they are.
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::InvalidResponse` for a non-empty body that is
    /// not JSON.
    pub fn check_body(self, body: &[u8]) -> Result<(), VoiceAiError> {
        match self {
            Self::ArrayBuffer => Ok(()),
            Self::Json if body.iter().all(u8::is_ascii_whitespace) => Ok(()),
            Self::Json => serde_json::from_slice::<serde::de::IgnoredAny>(body)
                .map(|_| ())
                .map_err(|e| VoiceAiError::InvalidResponse(format!("Expected a JSON body: {e}"))),
        }
    }
}

/// A single field of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartPart {
    /// Plain text field
    Text {
        /// Field name
        name: String,
        /// Field value
        value: String,
    },
    /// File upload
    File {
        /// Field name
        name: String,
        /// File name reported to the server
        file_name: String,
        /// MIME type of the file
        mime_type: String,
        /// File content
        data: Bytes,
    },
}

impl MultipartPart {
    /// Field name of this part
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Multipart form body, kept inspectable until it is handed to `reqwest`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

impl MultipartForm {
    /// Create an empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a file field
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        self.parts.push(MultipartPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        });
        self
    }

    /// All parts in insertion order
    #[must_use]
    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    /// Find a part by field name
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&MultipartPart> {
        self.parts.iter().find(|p| p.name() == name)
    }

    /// Value of a text field
    #[must_use]
    pub fn text_value(&self, name: &str) -> Option<&str> {
        match self.part(name)? {
            MultipartPart::Text { value, .. } => Some(value),
            MultipartPart::File { .. } => None,
        }
    }

    /// Convert into a `reqwest` form
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::InvalidParameter` if a file part carries an
    /// unparsable MIME type.
    pub fn into_reqwest(self) -> Result<Form, VoiceAiError> {
        let mut form = Form::new();

        for part in self.parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name, value),
                MultipartPart::File {
                    name,
                    file_name,
                    mime_type,
                    data,
                } => {
                    let mut file_part = Part::bytes(data.to_vec()).file_name(file_name);
                    if !mime_type.is_empty() {
                        file_part = file_part.mime_str(&mime_type).map_err(|e| {
                            VoiceAiError::invalid_parameter(
                                name.clone(),
                                format!("Invalid MIME type '{mime_type}': {e}"),
                            )
                        })?;
                    }
                    form.part(name, file_part)
                },
            };
        }

        Ok(form)
    }
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON object
    Json(Map<String, Value>),
    /// Multipart form
    Multipart(MultipartForm),
}

/// A fully resolved request, relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL, starting with `/`
    pub path: String,
    /// Headers in send order
    pub headers: Vec<(String, String)>,
    /// Body
    pub body: RequestBody,
    /// How to read the response body
    pub encoding: ResponseEncoding,
}

impl PreparedRequest {
    /// Create a request with no headers and no body
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
            encoding: ResponseEncoding::Json,
        }
    }

    /// Set a header, replacing any existing header with the same name
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Get a header value (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// JSON body, if any
    #[must_use]
    pub fn json_body(&self) -> Option<&Map<String, Value>> {
        match &self.body {
            RequestBody::Json(map) => Some(map),
            _ => None,
        }
    }
}

/// A complete HTTP response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullResponse {
    /// Status code
    pub status: u16,
    /// Headers, lower-cased names; repeated headers are joined with `, `
    pub headers: BTreeMap<String, String>,
    /// Raw body
    pub body: Bytes,
}

impl FullResponse {
    /// Decode the body as JSON
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::InvalidResponse` if the body is not valid JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, VoiceAiError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            VoiceAiError::InvalidResponse(format!("Failed to parse response: {e}"))
        })
    }

    /// Headers as a JSON object
    #[must_use]
    pub fn headers_json(&self) -> Map<String, Value> {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }
}
