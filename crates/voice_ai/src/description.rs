//! Node and field descriptors
//!
//! Static metadata the host renders as the node's UI. Fields carry a
//! [`DisplayOptions`] predicate deciding for which resource/operation they
//! are shown; evaluating it is the UI layer's job, the request path never
//! consults it.

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::config::DEFAULT_BASE_URL;
use crate::credentials::CREDENTIAL_NAME;
use crate::routing::{REQUEST_DEFAULT_HEADERS, ROUTES, Route, find_route};
use crate::types::{AudioFormat, Operation, Resource, VoiceVisibility};

/// Name of the list-search method backing the voice pickers
pub const LIST_VOICES_METHOD: &str = "listVoices";

/// Model used when the user does not pick one
pub const DEFAULT_MODEL: &str = "voiceai-tts-v1-latest";

/// Visibility rule of a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayOptions {
    /// Resources for which the field is shown (empty = all)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<Resource>,
    /// Operations for which the field is shown (empty = all)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operation: Vec<Operation>,
}

impl DisplayOptions {
    /// Show for every operation of `resource`
    #[must_use]
    pub fn resource(resource: Resource) -> Self {
        Self {
            resource: vec![resource],
            operation: Vec::new(),
        }
    }

    /// Show for the listed operations of `resource`
    #[must_use]
    pub fn operations(resource: Resource, operations: &[Operation]) -> Self {
        Self {
            resource: vec![resource],
            operation: operations.to_vec(),
        }
    }

    /// Whether the field is visible for the given selection
    #[must_use]
    pub fn is_visible(&self, resource: Resource, operation: Operation) -> bool {
        (self.resource.is_empty() || self.resource.contains(&resource))
            && (self.operation.is_empty() || self.operation.contains(&operation))
    }

    fn is_always(&self) -> bool {
        self.resource.is_empty() && self.operation.is_empty()
    }
}

/// Serialize as `{ "show": { ... } }`
fn serialize_show<S: Serializer>(
    options: &DisplayOptions,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct Show<'a> {
        show: &'a DisplayOptions,
    }

    Show { show: options }.serialize(serializer)
}

/// One entry of an options field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionValue {
    /// Label
    pub name: String,
    /// Stored value
    pub value: String,
    /// Help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Action label (operation options only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl OptionValue {
    fn new(name: &str, value: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            description: Some(description.to_string()),
            action: None,
        }
    }
}

/// Type options of a `list` locator mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModeOptions {
    /// List-search method
    pub search_list_method: String,
    /// Whether the list takes a filter
    pub searchable: bool,
}

/// Way of entering a resource locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorMode {
    /// Label
    pub display_name: String,
    /// `list` or `id`
    pub name: String,
    /// Input type of the mode
    #[serde(rename = "type")]
    pub input: String,
    /// List-search options for `list` mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_options: Option<ListModeOptions>,
    /// Placeholder for `id` mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Type options of a text field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextOptions {
    /// Render as a multi-line box with this many rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u8>,
    /// Mask the input
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub password: bool,
}

impl TextOptions {
    fn is_plain(&self) -> bool {
        self.rows.is_none() && !self.password
    }
}

/// Type options of a number field, UI range hints only
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberOptions {
    /// Lower bound
    pub min_value: f64,
    /// Upper bound
    pub max_value: f64,
    /// Step of the spinner
    pub number_step_size: f64,
}

/// Where a field value goes in the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendRule {
    /// Request part, always `body`
    #[serde(rename = "type")]
    pub target: String,
    /// JSON property
    pub property: String,
}

/// Field-level routing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRouting {
    /// Body binding of the field
    pub send: SendRule,
}

impl FieldRouting {
    /// Routing of `parameter` in `route`, if the route binds it
    fn for_parameter(route: &Route, parameter: &str) -> Option<Self> {
        route
            .body
            .iter()
            .find(|binding| binding.parameter == parameter)
            .map(|binding| Self {
                send: SendRule {
                    target: "body".to_string(),
                    property: binding.property.to_string(),
                },
            })
    }
}

/// Type-specific part of a field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    /// Free text
    String {
        /// Rows and masking
        #[serde(rename = "typeOptions", skip_serializing_if = "TextOptions::is_plain")]
        type_options: TextOptions,
    },
    /// Number with UI range hints
    Number {
        /// Range hints
        #[serde(rename = "typeOptions")]
        type_options: NumberOptions,
    },
    /// Fixed choice
    Options {
        /// Allowed values
        options: Vec<OptionValue>,
    },
    /// Pick from a searched list or enter an ID
    ResourceLocator {
        /// Available entry modes
        modes: Vec<LocatorMode>,
    },
    /// Group of optional sub-fields
    Collection {
        /// Sub-fields the user may add
        options: Vec<FieldDescriptor>,
    },
}

/// A field shown in the node UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Label
    pub display_name: String,
    /// Parameter name
    pub name: String,
    /// Type and type options
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Default value
    pub default: Value,
    /// Whether the user must fill it in
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Whether expressions are disallowed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_data_expression: bool,
    /// Help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Placeholder
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Visibility rule
    #[serde(
        skip_serializing_if = "DisplayOptions::is_always",
        serialize_with = "serialize_show"
    )]
    pub display_options: DisplayOptions,
    /// Body binding, for fields the request is built from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<FieldRouting>,
}

impl FieldDescriptor {
    fn new(display_name: &str, name: &str, kind: FieldKind, default: Value) -> Self {
        Self {
            display_name: display_name.to_string(),
            name: name.to_string(),
            kind,
            default,
            required: false,
            no_data_expression: false,
            description: None,
            placeholder: None,
            display_options: DisplayOptions::default(),
            routing: None,
        }
    }

    /// Single-line text field
    #[must_use]
    pub fn string(display_name: &str, name: &str, default: &str) -> Self {
        Self::new(
            display_name,
            name,
            FieldKind::String {
                type_options: TextOptions::default(),
            },
            Value::String(default.to_string()),
        )
    }

    /// Masked text field
    #[must_use]
    pub fn password(display_name: &str, name: &str) -> Self {
        Self::new(
            display_name,
            name,
            FieldKind::String {
                type_options: TextOptions {
                    rows: None,
                    password: true,
                },
            },
            Value::String(String::new()),
        )
    }

    /// Number field with range hints
    #[must_use]
    pub fn number(display_name: &str, name: &str, default: f64, min: f64, max: f64) -> Self {
        Self::new(
            display_name,
            name,
            FieldKind::Number {
                type_options: NumberOptions {
                    min_value: min,
                    max_value: max,
                    number_step_size: 0.1,
                },
            },
            json!(default),
        )
    }

    /// Options field
    #[must_use]
    pub fn options(
        display_name: &str,
        name: &str,
        options: Vec<OptionValue>,
        default: &str,
    ) -> Self {
        Self::new(
            display_name,
            name,
            FieldKind::Options { options },
            Value::String(default.to_string()),
        )
    }

    /// Voice picker backed by [`LIST_VOICES_METHOD`]
    #[must_use]
    pub fn voice_locator(display_name: &str, name: &str) -> Self {
        Self::new(
            display_name,
            name,
            FieldKind::ResourceLocator {
                modes: vec![
                    LocatorMode {
                        display_name: "From List".to_string(),
                        name: "list".to_string(),
                        input: "list".to_string(),
                        type_options: Some(ListModeOptions {
                            search_list_method: LIST_VOICES_METHOD.to_string(),
                            searchable: true,
                        }),
                        placeholder: None,
                    },
                    LocatorMode {
                        display_name: "ID".to_string(),
                        name: "id".to_string(),
                        input: "string".to_string(),
                        type_options: None,
                        placeholder: Some("e.g. voice_abc123".to_string()),
                    },
                ],
            },
            json!({ "mode": "list", "value": "" }),
        )
    }

    /// Collection of optional sub-fields
    #[must_use]
    pub fn collection(display_name: &str, name: &str, options: Vec<Self>) -> Self {
        Self::new(
            display_name,
            name,
            FieldKind::Collection { options },
            json!({}),
        )
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the help text
    #[must_use]
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set the placeholder
    #[must_use]
    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// Restrict visibility
    #[must_use]
    pub fn show(mut self, display_options: DisplayOptions) -> Self {
        self.display_options = display_options;
        self
    }

    fn rows(mut self, count: u8) -> Self {
        if let FieldKind::String { type_options } = &mut self.kind {
            type_options.rows = Some(count);
        }
        self
    }

    /// Attach the body bindings `route` declares for this field and, for a
    /// collection, for each of its options
    fn bind(mut self, route: Option<&Route>) -> Self {
        let Some(route) = route else {
            return self;
        };

        self.routing = FieldRouting::for_parameter(route, &self.name);
        if let FieldKind::Collection { options } = &mut self.kind {
            for option in options.iter_mut() {
                let parameter = format!("{}.{}", self.name, option.name);
                option.routing = FieldRouting::for_parameter(route, &parameter);
            }
        }
        self
    }

    fn no_data_expression(mut self) -> Self {
        self.no_data_expression = true;
        self
    }
}

/// Credential a node requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialRequirement {
    /// Credential type name
    pub name: String,
    /// Whether the node refuses to run without it
    pub required: bool,
}

/// Defaults applied to every routed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDefaults {
    /// API base URL
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Default headers
    pub headers: Vec<(String, String)>,
}

/// Complete node description
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Label
    pub display_name: String,
    /// Type name
    pub name: String,
    /// Icon reference
    pub icon: String,
    /// Node groups
    pub group: Vec<String>,
    /// Type version
    pub version: u32,
    /// Subtitle expression
    pub subtitle: String,
    /// Help text
    pub description: String,
    /// Default node name
    pub defaults: Value,
    /// Whether agents may call the node as a tool
    pub usable_as_tool: bool,
    /// Input connections
    pub inputs: Vec<String>,
    /// Output connections
    pub outputs: Vec<String>,
    /// Required credentials
    pub credentials: Vec<CredentialRequirement>,
    /// Request defaults
    pub request_defaults: RequestDefaults,
    /// Fields
    pub properties: Vec<FieldDescriptor>,
}

impl NodeDescription {
    /// Find a top-level field by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&FieldDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Fields shown for a resource/operation selection
    ///
    /// The resource picker has no rule and is always included.
    #[must_use]
    pub fn visible_properties(
        &self,
        resource: Resource,
        operation: Operation,
    ) -> Vec<&FieldDescriptor> {
        self.properties
            .iter()
            .filter(|p| p.display_options.is_visible(resource, operation))
            .collect()
    }
}

/// Operation picker for `resource`, generated from the routing table
fn operation_field(resource: Resource) -> FieldDescriptor {
    let options = ROUTES
        .iter()
        .filter(|route| route.resource == resource)
        .map(|route| OptionValue {
            name: route.display_name.to_string(),
            value: route.operation.as_str().to_string(),
            description: Some(route.description.to_string()),
            action: Some(route.action.to_string()),
        })
        .collect();

    FieldDescriptor::options(
        "Operation",
        "operation",
        options,
        resource.default_operation().as_str(),
    )
    .no_data_expression()
    .show(DisplayOptions::resource(resource))
}

fn visibility_options() -> Vec<OptionValue> {
    vec![
        OptionValue::new(
            "Private",
            VoiceVisibility::Private.as_str(),
            "Only you can use this voice",
        ),
        OptionValue::new(
            "Public",
            VoiceVisibility::Public.as_str(),
            "Anyone can use this voice",
        ),
    ]
}

fn speech_properties() -> Vec<FieldDescriptor> {
    let tts = DisplayOptions::operations(Resource::Speech, &[Operation::TextToSpeech]);
    let route = find_route(Resource::Speech, Operation::TextToSpeech).ok();

    vec![
        operation_field(Resource::Speech),
        FieldDescriptor::voice_locator("Voice", "voice")
            .describe("Select the voice to use for the conversion")
            .required()
            .show(tts.clone())
            .bind(route),
        FieldDescriptor::string("Text", "text", "")
            .rows(4)
            .describe("The text that will be converted into speech")
            .placeholder("e.g. Hello, welcome to Voice AI!")
            .required()
            .show(tts.clone())
            .bind(route),
        FieldDescriptor::collection(
            "Additional Options",
            "additionalOptions",
            vec![
                FieldDescriptor::options(
                    "Audio Format",
                    "audioFormat",
                    vec![
                        OptionValue::new("MP3", AudioFormat::Mp3.extension(), "MP3 audio format"),
                        OptionValue::new("WAV", AudioFormat::Wav.extension(), "WAV audio format"),
                    ],
                    AudioFormat::default().extension(),
                )
                .describe("Output format of the generated audio"),
                FieldDescriptor::string("Language", "language", "en")
                    .describe("Language code for the speech (e.g., en, es, fr)"),
                FieldDescriptor::string("Model", "model", DEFAULT_MODEL)
                    .describe("The model to use for text-to-speech conversion"),
                FieldDescriptor::number("Temperature", "temperature", 1.0, 0.0, 2.0)
                    .describe("Controls randomness in speech generation (0-2)"),
                FieldDescriptor::number("Top P", "topP", 0.8, 0.0, 1.0)
                    .describe("Controls diversity via nucleus sampling (0-1)"),
            ],
        )
        .placeholder("Add Option")
        .show(tts)
        .bind(route),
    ]
}

fn voice_properties() -> Vec<FieldDescriptor> {
    let by_id = DisplayOptions::operations(
        Resource::Voice,
        &[Operation::Get, Operation::Delete, Operation::Update],
    );
    let create = DisplayOptions::operations(Resource::Voice, &[Operation::Create]);
    let update = DisplayOptions::operations(Resource::Voice, &[Operation::Update]);
    let update_route = find_route(Resource::Voice, Operation::Update).ok();

    vec![
        operation_field(Resource::Voice),
        FieldDescriptor::voice_locator("Voice", "voiceId")
            .describe("The voice to operate on")
            .required()
            .show(by_id),
        FieldDescriptor::string("Voice Name", "voiceName", "")
            .describe("Name for the new voice")
            .required()
            .show(create.clone()),
        FieldDescriptor::string("Audio File", "audioFile", "data")
            .describe("The binary property containing the audio file for voice cloning")
            .required()
            .show(create.clone()),
        FieldDescriptor::collection(
            "Additional Options",
            "additionalOptions",
            vec![
                FieldDescriptor::string("Language", "language", "en")
                    .describe("Language code for the voice (e.g., en, es, fr)"),
                FieldDescriptor::options(
                    "Voice Visibility",
                    "voiceVisibility",
                    visibility_options(),
                    VoiceVisibility::default().as_str(),
                )
                .describe("Whether the voice is public or private"),
            ],
        )
        .placeholder("Add Option")
        .show(create),
        FieldDescriptor::collection(
            "Update Fields",
            "updateFields",
            vec![
                FieldDescriptor::string("Name", "name", "").describe("New name for the voice"),
                FieldDescriptor::options(
                    "Voice Visibility",
                    "voiceVisibility",
                    visibility_options(),
                    VoiceVisibility::default().as_str(),
                )
                .describe("Whether the voice is public or private"),
            ],
        )
        .placeholder("Add Field")
        .show(update)
        .bind(update_route),
    ]
}

/// Build the Voice AI node description
#[must_use]
pub fn node_description() -> NodeDescription {
    let resource = FieldDescriptor::options(
        "Resource",
        "resource",
        Resource::ALL
            .iter()
            .map(|r| OptionValue {
                name: r.display_name().to_string(),
                value: r.as_str().to_string(),
                description: None,
                action: None,
            })
            .collect(),
        Resource::default().as_str(),
    )
    .no_data_expression();

    let mut properties = vec![resource];
    properties.extend(speech_properties());
    properties.extend(voice_properties());

    NodeDescription {
        display_name: "Voice AI".to_string(),
        name: "voiceAi".to_string(),
        icon: "file:voiceai.svg".to_string(),
        group: vec!["transform".to_string()],
        version: 1,
        subtitle: r#"={{$parameter["operation"] + ": " + $parameter["resource"]}}"#.to_string(),
        description: "Interact with Voice.ai text-to-speech and voice management API".to_string(),
        defaults: json!({ "name": "Voice AI" }),
        usable_as_tool: true,
        inputs: vec!["main".to_string()],
        outputs: vec!["main".to_string()],
        credentials: vec![CredentialRequirement {
            name: CREDENTIAL_NAME.to_string(),
            required: true,
        }],
        request_defaults: RequestDefaults {
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: REQUEST_DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        },
        properties,
    }
}
