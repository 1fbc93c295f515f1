//! Voice AI - workflow node for the Voice AI text-to-speech API
//!
//! Exposes two resources to a workflow host:
//! - `speech` - convert text to audio returned as a binary attachment
//! - `voice` - clone, list, fetch, update and delete voices
//!
//! # Architecture
//!
//! Operations are data. The [`routing`] table maps each resource/operation
//! pair to an HTTP method, a URL template and the body fields built from node
//! parameters. [`VoiceAiNode`] interprets that table for every input item and
//! runs the two hooks that cannot be expressed declaratively:
//! - the clone-voice multipart builder ([`hooks::pre_send_clone_voice`])
//! - the speech binary converter ([`hooks::return_binary_data`])
//!
//! All network I/O goes through the [`HttpTransport`] port. The host or a test
//! supplies it; [`ReqwestTransport`] is the default adapter.
//!
//! # Example
//!
//! ```ignore
//! use voice_ai::{ExecutionItem, NodeParameters, VoiceAiConfig, VoiceAiNode};
//!
//! let node = VoiceAiNode::from_config(&VoiceAiConfig::load()?)?;
//!
//! let params = NodeParameters::from_value(serde_json::json!({
//!     "resource": "speech",
//!     "operation": "textToSpeech",
//!     "voice": "v1",
//!     "text": "Hello, world!"
//! }))?;
//! let output = node.execute(&[ExecutionItem::default()], &params).await?;
//! ```

pub mod config;
pub mod credentials;
pub mod description;
pub mod error;
pub mod hooks;
pub mod node;
pub mod parameters;
pub mod request;
pub mod routing;
pub mod search;
pub mod transport;
pub mod types;

pub use config::VoiceAiConfig;
pub use credentials::{CredentialDescription, VoiceAiCredential};
pub use description::{NodeDescription, node_description};
pub use error::VoiceAiError;
pub use node::VoiceAiNode;
pub use parameters::NodeParameters;
pub use request::{FullResponse, HttpMethod, MultipartForm, PreparedRequest, RequestBody};
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{
    AudioFormat, BinaryData, ExecutionItem, ListSearchEntry, ListSearchResult, Operation, Resource,
    Voice, VoiceVisibility,
};
