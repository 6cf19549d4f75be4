//! JSON schema served under a collection's `profile` relation, and the
//! editable field list derived from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HalError, HalResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl JsonSchema {
    pub fn from_entity(entity: &Value) -> HalResult<Self> {
        if !entity.is_object() {
            return Err(HalError::Schema("schema document is not an object".into()));
        }
        if let Some(properties) = entity.get("properties") {
            if !properties.is_object() {
                return Err(HalError::Schema("`properties` is not an object".into()));
            }
        }
        Ok(serde_json::from_value(entity.clone())?)
    }

    /// Drops URI-formatted and `$ref` properties, leaving fields that can be
    /// edited directly.
    pub fn retain_editable(&mut self) {
        self.properties.retain(|_, property| is_editable(property));
    }

    /// Field descriptors in schema order.
    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.properties
            .iter()
            .map(|(name, property)| FieldDescriptor::from_property(name, property))
            .collect()
    }
}

pub fn is_editable(property: &Value) -> bool {
    let uri_format = property.get("format").and_then(Value::as_str) == Some("uri");
    let reference = property.get("$ref").is_some();
    !uri_format && !reference
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Number,
    Boolean,
}

impl FieldKind {
    pub fn from_type(kind: Option<&str>) -> Self {
        match kind {
            Some("integer") => FieldKind::Integer,
            Some("number") => FieldKind::Number,
            Some("boolean") => FieldKind::Boolean,
            _ => FieldKind::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::Integer => "integer",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub title: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn from_property(name: &str, property: &Value) -> Self {
        let title = property
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string();
        let kind = FieldKind::from_type(property.get("type").and_then(Value::as_str));
        Self {
            name: name.to_string(),
            title,
            kind,
        }
    }

    /// Converts raw user input into the JSON type the field declares.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match self.kind {
            FieldKind::Text => Some(Value::String(raw.to_string())),
            FieldKind::Integer => raw.parse::<i64>().ok().map(Value::from),
            FieldKind::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}
