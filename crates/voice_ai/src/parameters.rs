//! Node parameter access
//!
//! The host resolves the user's input into a JSON object keyed by parameter
//! name. Collection parameters (`additionalOptions`, `updateFields`) are
//! nested objects and are addressed with dotted paths such as
//! `additionalOptions.audioFormat`.

use serde_json::{Map, Value};

use crate::error::VoiceAiError;
use crate::types::{Operation, Resource};

/// Resolved parameters for one node execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeParameters {
    values: Map<String, Value>,
}

impl NodeParameters {
    /// Create parameters from a JSON object
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Create parameters from any JSON value
    ///
    /// # Errors
    ///
    /// Returns `VoiceAiError::InvalidParameter` if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self, VoiceAiError> {
        match value {
            Value::Object(values) => Ok(Self::new(values)),
            other => Err(VoiceAiError::invalid_parameter(
                "parameters",
                format!("expected an object, got {other}"),
            )),
        }
    }

    /// Set a top-level parameter
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Selected resource, `speech` when unset
    pub fn resource(&self) -> Result<Resource, VoiceAiError> {
        match self.string("resource")? {
            Some(value) => value
                .parse()
                .map_err(|reason| VoiceAiError::invalid_parameter("resource", reason)),
            None => Ok(Resource::default()),
        }
    }

    /// Selected operation, falling back to the resource's default
    pub fn operation(&self, resource: Resource) -> Result<Operation, VoiceAiError> {
        match self.string("operation")? {
            Some(value) => value.parse().map_err(|_| VoiceAiError::UnknownOperation {
                resource: resource.to_string(),
                operation: value,
            }),
            None => Ok(resource.default_operation()),
        }
    }

    /// Look up a value by dotted path. `null` counts as absent.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.values.get(first)?;

        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }

        (!current.is_null()).then_some(current)
    }

    /// Whether a value is present at `path`
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// String value at `path`
    pub fn string(&self, path: &str) -> Result<Option<String>, VoiceAiError> {
        match self.get(path) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(VoiceAiError::invalid_parameter(
                path,
                format!("expected a string, got {other}"),
            )),
        }
    }

    /// Non-empty string value at `path`
    pub fn required_string(&self, path: &str) -> Result<String, VoiceAiError> {
        match self.string(path)? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(VoiceAiError::MissingParameter(path.to_string())),
        }
    }

    /// String value at `path`, or `default` when absent
    pub fn string_or(&self, path: &str, default: &str) -> Result<String, VoiceAiError> {
        Ok(self.string(path)?.unwrap_or_else(|| default.to_string()))
    }

    /// Numeric value at `path`
    pub fn number(&self, path: &str) -> Result<Option<f64>, VoiceAiError> {
        match self.get(path) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| {
                VoiceAiError::invalid_parameter(path, "number is not representable")
            }),
            Some(other) => Err(VoiceAiError::invalid_parameter(
                path,
                format!("expected a number, got {other}"),
            )),
        }
    }

    /// Value of a resource locator at `path`
    ///
    /// Accepts either a plain string or `{ "mode": "list" | "id", "value": "…" }`.
    /// An empty value counts as absent.
    pub fn resource_locator(&self, path: &str) -> Result<Option<String>, VoiceAiError> {
        let value = match self.get(path) {
            None => return Ok(None),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(locator)) => match locator.get("value") {
                None | Some(Value::Null) => return Ok(None),
                Some(Value::String(s)) => s.clone(),
                Some(other) => {
                    return Err(VoiceAiError::invalid_parameter(
                        path,
                        format!("locator value must be a string, got {other}"),
                    ));
                },
            },
            Some(other) => {
                return Err(VoiceAiError::invalid_parameter(
                    path,
                    format!("expected a resource locator, got {other}"),
                ));
            },
        };

        let value = value.trim().to_string();
        Ok((!value.is_empty()).then_some(value))
    }

    /// Collection parameter at `name`; an absent collection is empty
    pub fn collection(&self, name: &str) -> Result<Map<String, Value>, VoiceAiError> {
        match self.get(name) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(VoiceAiError::invalid_parameter(
                name,
                format!("expected a collection, got {other}"),
            )),
        }
    }
}

impl From<Map<String, Value>> for NodeParameters {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}
