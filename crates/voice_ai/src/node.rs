//! Voice AI node
//!
//! Generic dispatcher over the routing table. For each input item it resolves
//! the route, builds the request, runs the route's pre-send hook, sends it
//! through the [`HttpTransport`] and maps the response into output items.
//! Items are processed one after another; nothing is shared between them.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::config::VoiceAiConfig;
use crate::credentials::{CredentialDescription, credential_description, credential_test_request};
use crate::description::{LIST_VOICES_METHOD, NodeDescription, node_description};
use crate::error::VoiceAiError;
use crate::hooks::{pre_send_clone_voice, return_binary_data};
use crate::parameters::NodeParameters;
use crate::request::FullResponse;
use crate::routing::{PostReceiveHook, PreSendHook, build_request, find_route};
use crate::search::list_voices;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{ExecutionItem, ListSearchResult};

/// The Voice AI node bound to a transport
#[derive(Clone)]
pub struct VoiceAiNode {
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for VoiceAiNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceAiNode").finish_non_exhaustive()
    }
}

impl VoiceAiNode {
    /// Create a node using the given transport
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Create a node talking to the API with `reqwest`
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::Configuration` if the configuration is invalid.
    pub fn from_config(config: &VoiceAiConfig) -> Result<Self, VoiceAiError> {
        Ok(Self::new(Arc::new(ReqwestTransport::new(config)?)))
    }

    /// Node description rendered by the host
    #[must_use]
    pub fn description() -> NodeDescription {
        node_description()
    }

    /// Credential type description rendered by the host
    #[must_use]
    pub fn credential_description() -> CredentialDescription {
        credential_description()
    }

    /// Run the credential test request
    ///
    /// # Errors
    ///
    /// Returns the transport error; a rejected key surfaces as
    /// `VoiceAiError::Unauthorized`.
    #[instrument(skip(self))]
    pub async fn test_credential(&self) -> Result<(), VoiceAiError> {
        let response = self.transport.send(credential_test_request()).await?;
        info!(status = response.status, "Credential test passed");
        Ok(())
    }

    /// Dispatch a list-search method by name
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::UnknownSearchMethod` for names other than
    /// `listVoices`.
    pub async fn list_search(
        &self,
        method: &str,
        filter: Option<&str>,
    ) -> Result<ListSearchResult, VoiceAiError> {
        match method {
            LIST_VOICES_METHOD => list_voices(self.transport.as_ref(), filter).await,
            other => Err(VoiceAiError::UnknownSearchMethod(other.to_string())),
        }
    }

    /// Execute the node over all input items
    ///
    /// # Errors
    ///
    /// The first failing item aborts the run and its error is returned.
    pub async fn execute(
        &self,
        items: &[ExecutionItem],
        params: &NodeParameters,
    ) -> Result<Vec<ExecutionItem>, VoiceAiError> {
        let mut output = Vec::with_capacity(items.len());

        for item in items {
            output.extend(self.execute_item(item, params).await?);
        }

        Ok(output)
    }

    /// Execute the node for a single item
    ///
    /// # Errors
    ///
    /// Returns parameter validation errors before anything is sent, otherwise
    /// the transport or response decoding error.
    #[instrument(skip(self, item, params))]
    pub async fn execute_item(
        &self,
        item: &ExecutionItem,
        params: &NodeParameters,
    ) -> Result<Vec<ExecutionItem>, VoiceAiError> {
        let resource = params.resource()?;
        let operation = params.operation(resource)?;
        let route = find_route(resource, operation)?;

        debug!(%resource, %operation, method = %route.method, url = route.url, "Dispatching");

        let mut request = build_request(route, params)?;

        if let Some(hook) = route.pre_send {
            request = match hook {
                PreSendHook::CloneVoiceForm => pre_send_clone_voice(request, params, item)?,
            };
        }

        let response = self.transport.send(request).await?;

        match route.post_receive {
            Some(PostReceiveHook::BinarySpeech) => {
                return_binary_data(std::slice::from_ref(item), &response, params)
            },
            None => json_items(&response),
        }
    }
}

/// Map a JSON response to output items
///
/// Arrays yield one item per element, objects one item. Non-object values
/// are wrapped as `{ "data": value }`. An empty body yields `{ "success": true }`.
fn json_items(response: &FullResponse) -> Result<Vec<ExecutionItem>, VoiceAiError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        let mut json = Map::new();
        json.insert("success".to_string(), Value::Bool(true));
        return Ok(vec![ExecutionItem::from_json(json)]);
    }

    let value: Value = response.json()?;
    let values = match value {
        Value::Array(values) => values,
        other => vec![other],
    };

    Ok(values
        .into_iter()
        .map(|value| match value {
            Value::Object(json) => ExecutionItem::from_json(json),
            other => {
                let mut json = Map::new();
                json.insert("data".to_string(), other);
                ExecutionItem::from_json(json)
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bytes::Bytes;
    use mockall::predicate::function;
    use serde_json::json;

    use super::*;
    use crate::request::{HttpMethod, PreparedRequest, RequestBody};
    use crate::transport::MockHttpTransport;
    use crate::types::BinaryData;

    fn params(value: Value) -> NodeParameters {
        NodeParameters::from_value(value).unwrap()
    }

    fn json_response(value: &Value) -> FullResponse {
        FullResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: Bytes::from(serde_json::to_vec(value).unwrap()),
        }
    }

    fn node(transport: MockHttpTransport) -> VoiceAiNode {
        VoiceAiNode::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn get_many_splits_array_into_items() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(function(|r: &PreparedRequest| {
                r.method == HttpMethod::Get && r.path == "/voices"
            }))
            .times(1)
            .returning(|_| {
                Ok(json_response(&json!([
                    { "voice_id": "v1", "name": "Anna" },
                    { "voice_id": "v2", "name": "Bob" }
                ])))
            });

        let out = node(transport)
            .execute(
                &[ExecutionItem::default()],
                &params(json!({ "resource": "voice", "operation": "getAll" })),
            )
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[1].json["voice_id"], "v2");
    }

    #[tokio::test]
    async fn get_uses_voice_id_in_path() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(function(|r: &PreparedRequest| r.path == "/voice/v7"))
            .times(1)
            .returning(|_| Ok(json_response(&json!({ "voice_id": "v7", "name": "Zed" }))));

        let out = node(transport)
            .execute_item(
                &ExecutionItem::default(),
                &params(json!({
                    "resource": "voice",
                    "operation": "get",
                    "voiceId": { "mode": "id", "value": "v7" }
                })),
            )
            .await
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].json["name"], "Zed");
    }

    #[tokio::test]
    async fn delete_with_empty_body_reports_success() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(function(|r: &PreparedRequest| r.method == HttpMethod::Delete))
            .returning(|_| {
                Ok(FullResponse {
                    status: 204,
                    ..Default::default()
                })
            });

        let out = node(transport)
            .execute_item(
                &ExecutionItem::default(),
                &params(json!({ "resource": "voice", "operation": "delete", "voiceId": "v1" })),
            )
            .await
            .unwrap();

        assert_eq!(out[0].json["success"], true);
    }

    #[tokio::test]
    async fn update_sends_partial_body() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(function(|r: &PreparedRequest| {
                r.method == HttpMethod::Put
                    && r.json_body().is_some_and(|b| {
                        b.len() == 1 && b.get("voice_visibility") == Some(&json!("PUBLIC"))
                    })
            }))
            .times(1)
            .returning(|_| Ok(json_response(&json!({ "voice_id": "v1" }))));

        let result = node(transport)
            .execute_item(
                &ExecutionItem::default(),
                &params(json!({
                    "resource": "voice",
                    "operation": "update",
                    "voiceId": "v1",
                    "updateFields": { "voiceVisibility": "PUBLIC" }
                })),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn text_to_speech_returns_binary_per_item() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(function(|r: &PreparedRequest| r.path == "/speech"))
            .times(2)
            .returning(|_| {
                let mut headers = BTreeMap::new();
                headers.insert("content-type".to_string(), "audio/wav".to_string());
                Ok(FullResponse {
                    status: 200,
                    headers,
                    body: Bytes::from_static(b"RIFF"),
                })
            });

        let out = node(transport)
            .execute(
                &[ExecutionItem::default(), ExecutionItem::default()],
                &params(json!({
                    "voice": "v1",
                    "text": "Hello",
                    "additionalOptions": { "audioFormat": "wav" }
                })),
            )
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].json["content-type"], "audio/wav");
        assert_eq!(out[0].binary["data"].mime_type, "audio/wav");
        assert_eq!(out[1].binary["data"].file_name.as_deref(), Some("speech.wav"));
    }

    #[tokio::test]
    async fn create_runs_multipart_hook() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(function(|r: &PreparedRequest| {
                matches!(
                    &r.body,
                    RequestBody::Multipart(form) if form.text_value("name") == Some("Clone")
                )
            }))
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    &json!({ "voice_id": "new", "status": "processing" }),
                ))
            });

        let item =
            ExecutionItem::default().with_binary("data", BinaryData::new(vec![1], "audio/mpeg"));
        let out = node(transport)
            .execute_item(
                &item,
                &params(json!({
                    "resource": "voice",
                    "operation": "create",
                    "voiceName": "Clone"
                })),
            )
            .await
            .unwrap();

        assert_eq!(out[0].json["voice_id"], "new");
    }

    #[tokio::test]
    async fn create_without_binary_never_sends() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(0);

        let err = node(transport)
            .execute_item(
                &ExecutionItem::default(),
                &params(json!({
                    "resource": "voice",
                    "operation": "create",
                    "voiceName": "Clone"
                })),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, VoiceAiError::MissingBinaryData(_)));
    }

    #[tokio::test]
    async fn failing_item_aborts_execution() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Err(VoiceAiError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        });

        let err = node(transport)
            .execute(
                &[ExecutionItem::default(), ExecutionItem::default()],
                &params(json!({ "resource": "voice" })),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, VoiceAiError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn unknown_operation_is_rejected() {
        let transport = MockHttpTransport::new();
        let err = node(transport)
            .execute_item(
                &ExecutionItem::default(),
                &params(json!({ "resource": "speech", "operation": "delete" })),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, VoiceAiError::UnknownOperation { .. }));
    }

    #[tokio::test]
    async fn list_search_dispatches_list_voices() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(|_| {
            Ok(json_response(&json!([
                {
                    "voice_id": "v1",
                    "name": "Anna",
                    "status": "ready",
                    "voice_visibility": "PRIVATE"
                }
            ])))
        });
        let node = node(transport);

        let result = node.list_search("listVoices", None).await.unwrap();
        assert_eq!(result.results[0].name, "Anna (ready)");

        let err = node.list_search("listModels", None).await.unwrap_err();
        assert!(matches!(err, VoiceAiError::UnknownSearchMethod(_)));
    }

    #[tokio::test]
    async fn credential_test_requests_voices() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .with(function(|r: &PreparedRequest| r.path == "/voices"))
            .times(1)
            .returning(|_| Ok(json_response(&json!([]))));

        assert!(node(transport).test_credential().await.is_ok());
    }

    #[test]
    fn json_items_wraps_scalars() {
        let out = json_items(&json_response(&json!("ok"))).unwrap();
        assert_eq!(out[0].json["data"], "ok");
    }
}
