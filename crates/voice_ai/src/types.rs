//! Types for the Voice AI node
//!
//! Contains the resource/operation identifiers, remote voice records, audio
//! formats and the item/binary containers exchanged with the host.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logical grouping of operations exposed by the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Text-to-speech conversion
    #[default]
    Speech,
    /// Management of cloned voices
    Voice,
}

impl Resource {
    /// All resources, in the order the node lists them
    pub const ALL: [Self; 2] = [Self::Speech, Self::Voice];

    /// Parameter value used by the host
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Speech => "speech",
            Self::Voice => "voice",
        }
    }

    /// Label shown in the resource picker
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Speech => "Speech",
            Self::Voice => "Voice",
        }
    }

    /// Operation selected when the user has not picked one
    #[must_use]
    pub const fn default_operation(&self) -> Operation {
        match self {
            Self::Speech => Operation::TextToSpeech,
            Self::Voice => Operation::GetAll,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speech" => Ok(Self::Speech),
            "voice" => Ok(Self::Voice),
            _ => Err(format!("Unknown resource: {s}")),
        }
    }
}

/// Action within a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Convert text into audio (speech)
    TextToSpeech,
    /// Clone a new voice from an audio file (voice)
    Create,
    /// Delete a voice (voice)
    Delete,
    /// Fetch a single voice (voice)
    Get,
    /// List all voices (voice)
    GetAll,
    /// Update voice metadata (voice)
    Update,
}

impl Operation {
    /// Parameter value used by the host
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TextToSpeech => "textToSpeech",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Get => "get",
            Self::GetAll => "getAll",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "textToSpeech" => Ok(Self::TextToSpeech),
            "create" => Ok(Self::Create),
            "delete" => Ok(Self::Delete),
            "get" => Ok(Self::Get),
            "getAll" => Ok(Self::GetAll),
            "update" => Ok(Self::Update),
            _ => Err(format!("Unknown operation: {s}")),
        }
    }
}

/// Output format of synthesized speech
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MP3 format
    #[default]
    Mp3,
    /// WAV format (uncompressed)
    Wav,
}

impl AudioFormat {
    /// Get the MIME type for this audio format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension for this audio format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// Resolve the option value sent by the host.
    ///
    /// Anything other than `wav` is treated as MP3.
    #[must_use]
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some("wav") => Self::Wav,
            _ => Self::Mp3,
        }
    }

    /// Guess the format from a file extension (case-insensitive)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" | "mpeg" => Some(Self::Mp3),
            "wav" | "wave" => Some(Self::Wav),
            _ => None,
        }
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            _ => Err(format!("Invalid audio format: {s}. Use 'mp3' or 'wav'")),
        }
    }
}

/// Who may use a cloned voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoiceVisibility {
    /// Only the owner can use this voice
    #[default]
    Private,
    /// Anyone can use this voice
    Public,
}

impl VoiceVisibility {
    /// Wire value
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Public => "PUBLIC",
        }
    }
}

impl FromStr for VoiceVisibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PRIVATE" => Ok(Self::Private),
            "PUBLIC" => Ok(Self::Public),
            _ => Err(format!(
                "Invalid voice visibility: {s}. Use 'PRIVATE' or 'PUBLIC'"
            )),
        }
    }
}

/// A voice as returned by the Voice AI API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Voice identifier
    pub voice_id: String,
    /// Display name
    pub name: String,
    /// Processing status (e.g. `ready`)
    pub status: String,
    /// `PRIVATE` or `PUBLIC`; kept as text so unknown values survive
    #[serde(default)]
    pub voice_visibility: String,
}

/// A binary attachment on an execution item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryData {
    /// Raw bytes
    pub data: Bytes,
    /// MIME type
    pub mime_type: String,
    /// Original file name, if known
    pub file_name: Option<String>,
    /// File extension without the dot, if known
    pub file_extension: Option<String>,
}

impl BinaryData {
    /// Create a new attachment without file metadata
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            file_name: None,
            file_extension: None,
        }
    }

    /// Set the file name, deriving the extension from it
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        self.file_extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .filter(|ext| !ext.is_empty());
        self.file_name = Some(file_name);
        self
    }

    /// Size of the attachment in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// One unit of data flowing through a workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionItem {
    /// Structured payload
    pub json: Map<String, Value>,
    /// Binary attachments keyed by property name
    pub binary: BTreeMap<String, BinaryData>,
}

impl ExecutionItem {
    /// Create an item carrying only JSON
    #[must_use]
    pub fn from_json(json: Map<String, Value>) -> Self {
        Self {
            json,
            binary: BTreeMap::new(),
        }
    }

    /// Attach binary data under `property`
    #[must_use]
    pub fn with_binary(mut self, property: impl Into<String>, data: BinaryData) -> Self {
        self.binary.insert(property.into(), data);
        self
    }

    /// Look up binary data, failing when the property is absent
    pub fn binary_data(&self, property: &str) -> Result<&BinaryData, crate::VoiceAiError> {
        self.binary
            .get(property)
            .ok_or_else(|| crate::VoiceAiError::MissingBinaryData(property.to_string()))
    }
}

/// One selectable entry of a list search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSearchEntry {
    /// Label shown to the user
    pub name: String,
    /// Value stored in the parameter
    pub value: String,
}

/// Result of a list-search method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSearchResult {
    /// Matching entries in API order
    pub results: Vec<ListSearchEntry>,
}
