//! Routing table
//!
//! Maps every resource × operation pair to the HTTP request it performs.
//! The table is plain data; [`build_request`] is the only code that reads it
//! and the dispatcher in [`crate::node`] is the only code that runs the hooks
//! it names.

use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::VoiceAiError;
use crate::parameters::NodeParameters;
use crate::request::{HttpMethod, PreparedRequest, RequestBody, ResponseEncoding};
use crate::types::{AudioFormat, Operation, Resource, VoiceVisibility};

/// Headers sent with every routed request unless a route overrides them
pub const REQUEST_DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Accept", "application/json"),
    ("Content-Type", "application/json"),
];

/// How a parameter value is read and checked before it is sent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindingKind {
    /// Any string
    Text,
    /// Resource locator (`voice`, `voiceId`)
    Locator,
    /// `mp3` or `wav`, sent lower-case
    AudioFormat,
    /// `PRIVATE` or `PUBLIC`, sent upper-case
    Visibility,
    /// Number within an inclusive range
    Number {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
}

/// Copies one node parameter into the JSON body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyBinding {
    /// Dotted parameter path
    pub parameter: &'static str,
    /// JSON property in the body
    pub property: &'static str,
    /// Value type
    pub kind: BindingKind,
    /// Fail when the parameter is absent instead of omitting the property
    pub required: bool,
}

impl BodyBinding {
    const fn required(parameter: &'static str, property: &'static str, kind: BindingKind) -> Self {
        Self {
            parameter,
            property,
            kind,
            required: true,
        }
    }

    const fn optional(parameter: &'static str, property: &'static str, kind: BindingKind) -> Self {
        Self {
            parameter,
            property,
            kind,
            required: false,
        }
    }

    /// Parse the parameter through `T`'s wire names
    fn parse<T: FromStr<Err = String>>(
        &self,
        params: &NodeParameters,
    ) -> Result<Option<T>, VoiceAiError> {
        params
            .string(self.parameter)?
            .map(|value| {
                value.parse().map_err(|reason: String| {
                    VoiceAiError::invalid_parameter(self.parameter, reason)
                })
            })
            .transpose()
    }

    /// Resolve the value to send, `None` when the parameter is absent
    fn resolve(&self, params: &NodeParameters) -> Result<Option<Value>, VoiceAiError> {
        let value = match self.kind {
            BindingKind::Text => params.string(self.parameter)?.map(Value::String),
            BindingKind::Locator => params.resource_locator(self.parameter)?.map(Value::String),
            BindingKind::AudioFormat => self
                .parse::<AudioFormat>(params)?
                .map(|format| Value::from(format.extension())),
            BindingKind::Visibility => self
                .parse::<VoiceVisibility>(params)?
                .map(|visibility| Value::from(visibility.as_str())),
            BindingKind::Number { min, max } => match params.number(self.parameter)? {
                Some(n) if (min..=max).contains(&n) => params.get(self.parameter).cloned(),
                Some(n) => {
                    return Err(VoiceAiError::invalid_parameter(
                        self.parameter,
                        format!("{n} is outside the range {min}-{max}"),
                    ));
                },
                None => None,
            },
        };

        match value {
            Some(Value::String(s)) if self.required && s.trim().is_empty() => {
                Err(VoiceAiError::MissingParameter(self.parameter.to_string()))
            },
            None if self.required => {
                Err(VoiceAiError::MissingParameter(self.parameter.to_string()))
            },
            other => Ok(other),
        }
    }
}

/// Hook run on the request before it is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreSendHook {
    /// Replace the body with the clone-voice multipart form
    CloneVoiceForm,
}

/// Hook run on the response instead of the default JSON mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostReceiveHook {
    /// Turn the audio body into a binary attachment
    BinarySpeech,
}

/// Routing directive of one operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    /// Resource
    pub resource: Resource,
    /// Operation
    pub operation: Operation,
    /// Label in the operation picker
    pub display_name: &'static str,
    /// Help text in the operation picker
    pub description: &'static str,
    /// Action label
    pub action: &'static str,
    /// HTTP method
    pub method: HttpMethod,
    /// Path template; `{param}` segments are filled from resource locators
    pub url: &'static str,
    /// Extra headers, overriding the request defaults
    pub headers: &'static [(&'static str, &'static str)],
    /// Body bindings
    pub body: &'static [BodyBinding],
    /// Response body encoding
    pub encoding: ResponseEncoding,
    /// Pre-send hook
    pub pre_send: Option<PreSendHook>,
    /// Post-receive hook
    pub post_receive: Option<PostReceiveHook>,
}

const TEXT_TO_SPEECH_BODY: &[BodyBinding] = &[
    BodyBinding::required("voice", "voice_id", BindingKind::Locator),
    BodyBinding::required("text", "text", BindingKind::Text),
    BodyBinding::optional(
        "additionalOptions.audioFormat",
        "audio_format",
        BindingKind::AudioFormat,
    ),
    BodyBinding::optional("additionalOptions.language", "language", BindingKind::Text),
    BodyBinding::optional("additionalOptions.model", "model", BindingKind::Text),
    BodyBinding::optional(
        "additionalOptions.temperature",
        "temperature",
        BindingKind::Number { min: 0.0, max: 2.0 },
    ),
    BodyBinding::optional(
        "additionalOptions.topP",
        "top_p",
        BindingKind::Number { min: 0.0, max: 1.0 },
    ),
];

const UPDATE_VOICE_BODY: &[BodyBinding] = &[
    BodyBinding::optional("updateFields.name", "name", BindingKind::Text),
    BodyBinding::optional(
        "updateFields.voiceVisibility",
        "voice_visibility",
        BindingKind::Visibility,
    ),
];

/// Every operation the node supports
pub static ROUTES: &[Route] = &[
    Route {
        resource: Resource::Speech,
        operation: Operation::TextToSpeech,
        display_name: "Text to Speech",
        description: "Converts text into speech and returns audio",
        action: "Convert text to speech",
        method: HttpMethod::Post,
        url: "/speech",
        headers: &[],
        body: TEXT_TO_SPEECH_BODY,
        encoding: ResponseEncoding::ArrayBuffer,
        pre_send: None,
        post_receive: Some(PostReceiveHook::BinarySpeech),
    },
    Route {
        resource: Resource::Voice,
        operation: Operation::Create,
        display_name: "Create (Clone)",
        description: "Create a new voice by cloning from an audio file",
        action: "Create a voice",
        method: HttpMethod::Post,
        url: "/clone-voice",
        headers: &[("Content-Type", "multipart/form-data")],
        body: &[],
        encoding: ResponseEncoding::Json,
        pre_send: Some(PreSendHook::CloneVoiceForm),
        post_receive: None,
    },
    Route {
        resource: Resource::Voice,
        operation: Operation::Delete,
        display_name: "Delete",
        description: "Delete a voice",
        action: "Delete a voice",
        method: HttpMethod::Delete,
        url: "/voice/{voiceId}",
        headers: &[],
        body: &[],
        encoding: ResponseEncoding::Json,
        pre_send: None,
        post_receive: None,
    },
    Route {
        resource: Resource::Voice,
        operation: Operation::Get,
        display_name: "Get",
        description: "Get a voice by ID",
        action: "Get a voice",
        method: HttpMethod::Get,
        url: "/voice/{voiceId}",
        headers: &[],
        body: &[],
        encoding: ResponseEncoding::Json,
        pre_send: None,
        post_receive: None,
    },
    Route {
        resource: Resource::Voice,
        operation: Operation::GetAll,
        display_name: "Get Many",
        description: "Get many voices",
        action: "Get many voices",
        method: HttpMethod::Get,
        url: "/voices",
        headers: &[],
        body: &[],
        encoding: ResponseEncoding::Json,
        pre_send: None,
        post_receive: None,
    },
    Route {
        resource: Resource::Voice,
        operation: Operation::Update,
        display_name: "Update",
        description: "Update a voice metadata",
        action: "Update a voice",
        method: HttpMethod::Put,
        url: "/voice/{voiceId}",
        headers: &[],
        body: UPDATE_VOICE_BODY,
        encoding: ResponseEncoding::Json,
        pre_send: None,
        post_receive: None,
    },
];

/// Look up the route for a resource/operation pair
pub fn find_route(
    resource: Resource,
    operation: Operation,
) -> Result<&'static Route, VoiceAiError> {
    ROUTES
        .iter()
        .find(|r| r.resource == resource && r.operation == operation)
        .ok_or_else(|| VoiceAiError::UnknownOperation {
            resource: resource.to_string(),
            operation: operation.to_string(),
        })
}

/// Fill `{param}` segments of a path template from resource locators
///
/// Values are percent-encoded so an ID can never escape its path segment.
pub fn render_path(template: &str, params: &NodeParameters) -> Result<String, VoiceAiError> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = params
            .resource_locator(name)?
            .ok_or_else(|| VoiceAiError::MissingParameter(name.to_string()))?;

        path.push_str(&rest[..start]);
        path.push_str(&urlencoding::encode(&value));
        rest = &rest[start + len + 1..];
    }

    path.push_str(rest);
    Ok(path)
}

/// Build the JSON body of a route; only present parameters are sent
pub fn build_body(
    bindings: &[BodyBinding],
    params: &NodeParameters,
) -> Result<Map<String, Value>, VoiceAiError> {
    let mut body = Map::new();

    for binding in bindings {
        if let Some(value) = binding.resolve(params)? {
            body.insert(binding.property.to_string(), value);
        }
    }

    Ok(body)
}

/// Turn a route and the node parameters into a request
///
/// Hooks are not applied here.
pub fn build_request(
    route: &Route,
    params: &NodeParameters,
) -> Result<PreparedRequest, VoiceAiError> {
    let path = render_path(route.url, params)?;
    let mut request = PreparedRequest::new(route.method, path);
    request.encoding = route.encoding;

    for (name, value) in REQUEST_DEFAULT_HEADERS.iter().chain(route.headers) {
        request.set_header(name, value);
    }

    if !route.body.is_empty() {
        let body = build_body(route.body, params)?;
        debug!(
            resource = %route.resource,
            operation = %route.operation,
            fields = ?body.keys().collect::<Vec<_>>(),
            "Built request body"
        );
        request.body = RequestBody::Json(body);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> NodeParameters {
        NodeParameters::from_value(value).unwrap()
    }

    #[test]
    fn table_covers_six_operations() {
        assert_eq!(ROUTES.len(), 6);
        let voice_ops: Vec<Operation> = ROUTES
            .iter()
            .filter(|r| r.resource == Resource::Voice)
            .map(|r| r.operation)
            .collect();
        assert_eq!(
            voice_ops,
            [
                Operation::Create,
                Operation::Delete,
                Operation::Get,
                Operation::GetAll,
                Operation::Update
            ]
        );
    }

    #[test]
    fn speech_routes_only_text_to_speech() {
        assert!(find_route(Resource::Speech, Operation::TextToSpeech).is_ok());
        assert!(matches!(
            find_route(Resource::Speech, Operation::Delete),
            Err(VoiceAiError::UnknownOperation { .. })
        ));
        assert!(find_route(Resource::Voice, Operation::TextToSpeech).is_err());
    }

    #[test]
    fn render_path_fills_and_encodes_ids() {
        let p = params(json!({ "voiceId": { "mode": "id", "value": "voice abc/1" } }));
        assert_eq!(
            render_path("/voice/{voiceId}", &p).unwrap(),
            "/voice/voice%20abc%2F1"
        );
    }

    #[test]
    fn render_path_requires_id() {
        let p = NodeParameters::default();
        let err = render_path("/voice/{voiceId}", &p).unwrap_err();
        assert!(matches!(err, VoiceAiError::MissingParameter(name) if name == "voiceId"));
    }

    #[test]
    fn static_path_is_unchanged() {
        let p = NodeParameters::default();
        assert_eq!(render_path("/voices", &p).unwrap(), "/voices");
    }

    #[test]
    fn text_to_speech_request_maps_fields() {
        let route = find_route(Resource::Speech, Operation::TextToSpeech).unwrap();
        let p = params(json!({
            "voice": { "mode": "list", "value": "v1" },
            "text": "Hello",
            "additionalOptions": {
                "audioFormat": "wav",
                "language": "de",
                "model": "voiceai-tts-v1-latest",
                "temperature": 1.2,
                "topP": 0.8
            }
        }));

        let request = build_request(route, &p).unwrap();

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.path, "/speech");
        assert_eq!(request.encoding, ResponseEncoding::ArrayBuffer);
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(
            Value::Object(request.json_body().unwrap().clone()),
            json!({
                "voice_id": "v1",
                "text": "Hello",
                "audio_format": "wav",
                "language": "de",
                "model": "voiceai-tts-v1-latest",
                "temperature": 1.2,
                "top_p": 0.8
            })
        );
    }

    #[test]
    fn text_to_speech_omits_absent_options() {
        let route = find_route(Resource::Speech, Operation::TextToSpeech).unwrap();
        let p = params(json!({ "voice": "v1", "text": "Hi" }));

        let body = build_request(route, &p).unwrap().json_body().unwrap().clone();
        assert_eq!(Value::Object(body), json!({ "voice_id": "v1", "text": "Hi" }));
    }

    #[test]
    fn text_to_speech_requires_text_and_voice() {
        let route = find_route(Resource::Speech, Operation::TextToSpeech).unwrap();

        let err = build_request(route, &params(json!({ "voice": "v1" }))).unwrap_err();
        assert!(matches!(err, VoiceAiError::MissingParameter(name) if name == "text"));

        let err = build_request(route, &params(json!({ "text": "Hi" }))).unwrap_err();
        assert!(matches!(err, VoiceAiError::MissingParameter(name) if name == "voice"));
    }

    #[test]
    fn sampling_parameters_are_range_checked() {
        let route = find_route(Resource::Speech, Operation::TextToSpeech).unwrap();

        let too_hot = params(json!({
            "voice": "v1", "text": "Hi", "additionalOptions": { "temperature": 2.5 }
        }));
        assert!(matches!(
            build_request(route, &too_hot),
            Err(VoiceAiError::InvalidParameter { name, .. })
                if name == "additionalOptions.temperature"
        ));

        let bad_top_p = params(json!({
            "voice": "v1", "text": "Hi", "additionalOptions": { "topP": -0.1 }
        }));
        assert!(matches!(
            build_request(route, &bad_top_p),
            Err(VoiceAiError::InvalidParameter { name, .. }) if name == "additionalOptions.topP"
        ));

        let bounds = params(json!({
            "voice": "v1", "text": "Hi", "additionalOptions": { "temperature": 0, "topP": 1 }
        }));
        assert!(build_request(route, &bounds).is_ok());
    }

    #[test]
    fn unknown_audio_format_is_rejected() {
        let route = find_route(Resource::Speech, Operation::TextToSpeech).unwrap();
        let p = params(json!({
            "voice": "v1", "text": "Hi", "additionalOptions": { "audioFormat": "ogg" }
        }));
        assert!(matches!(
            build_request(route, &p),
            Err(VoiceAiError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn choice_values_are_sent_in_wire_case() {
        let speech = find_route(Resource::Speech, Operation::TextToSpeech).unwrap();
        let p = params(json!({
            "voice": "v1", "text": "Hi", "additionalOptions": { "audioFormat": "WAV" }
        }));
        let body = build_request(speech, &p).unwrap().json_body().unwrap().clone();
        assert_eq!(body["audio_format"], "wav");

        let update = find_route(Resource::Voice, Operation::Update).unwrap();
        let p = params(json!({
            "voiceId": "v1", "updateFields": { "voiceVisibility": "public" }
        }));
        let body = build_request(update, &p).unwrap().json_body().unwrap().clone();
        assert_eq!(body["voice_visibility"], "PUBLIC");
    }

    #[test]
    fn unknown_visibility_is_rejected() {
        let route = find_route(Resource::Voice, Operation::Update).unwrap();
        let p = params(json!({
            "voiceId": "v1", "updateFields": { "voiceVisibility": "SHARED" }
        }));
        assert!(matches!(
            build_request(route, &p),
            Err(VoiceAiError::InvalidParameter { name, .. })
                if name == "updateFields.voiceVisibility"
        ));
    }

    #[test]
    fn update_sends_only_present_fields() {
        let route = find_route(Resource::Voice, Operation::Update).unwrap();

        let only_name = params(json!({
            "voiceId": "v1",
            "updateFields": { "name": "Renamed" }
        }));
        let request = build_request(route, &only_name).unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.path, "/voice/v1");
        assert_eq!(
            Value::Object(request.json_body().unwrap().clone()),
            json!({ "name": "Renamed" })
        );

        let only_visibility = params(json!({
            "voiceId": "v1",
            "updateFields": { "voiceVisibility": "PUBLIC" }
        }));
        let body = build_request(route, &only_visibility)
            .unwrap()
            .json_body()
            .unwrap()
            .clone();
        assert_eq!(Value::Object(body), json!({ "voice_visibility": "PUBLIC" }));

        let nothing = params(json!({ "voiceId": "v1" }));
        let body = build_request(route, &nothing).unwrap().json_body().unwrap().clone();
        assert!(body.is_empty());
    }

    #[test]
    fn clone_route_declares_multipart_and_hook() {
        let route = find_route(Resource::Voice, Operation::Create).unwrap();
        let request = build_request(route, &NodeParameters::default()).unwrap();

        assert_eq!(request.path, "/clone-voice");
        assert_eq!(request.header("Content-Type"), Some("multipart/form-data"));
        assert_eq!(request.body, RequestBody::Empty);
        assert_eq!(route.pre_send, Some(PreSendHook::CloneVoiceForm));
    }

    #[test]
    fn delete_and_get_have_no_body() {
        for op in [Operation::Delete, Operation::Get] {
            let route = find_route(Resource::Voice, op).unwrap();
            let request = build_request(route, &params(json!({ "voiceId": "v9" }))).unwrap();
            assert_eq!(request.path, "/voice/v9");
            assert_eq!(request.body, RequestBody::Empty);
        }
    }
}
