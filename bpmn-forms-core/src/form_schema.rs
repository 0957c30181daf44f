//! Dynamic-form schema documents.
//!
//! A schema is `{type, components, schemaVersion}` plus any attributes the
//! form editor adds. Known fields are typed; everything else is kept in
//! `extra` so documents survive a round trip through the store.
//! Deserialization always normalizes, so a stored schema with a missing or
//! malformed field comes back with the defaults filled in.

use crate::error::{DocumentFormat, Result, StudioError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_SCHEMA_TYPE: &str = "default";
pub const DEFAULT_SCHEMA_VERSION: u32 = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub components: Vec<SchemaComponent>,
    pub schema_version: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One field or content block of a form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaComponent {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaComponent {
    pub fn is_field(&self) -> bool {
        self.key.is_some()
    }
}

impl Default for FormSchema {
    /// Intro text plus a text field and a checkbox.
    fn default() -> Self {
        Self {
            schema_type: DEFAULT_SCHEMA_TYPE.to_string(),
            components: default_components(),
            schema_version: DEFAULT_SCHEMA_VERSION,
            extra: Map::new(),
        }
    }
}

fn default_components() -> Vec<SchemaComponent> {
    let canned = json!([
        { "type": "text", "text": "# My New Form\n\nThis is a new dynamic form." },
        { "key": "textfield", "label": "Text Field", "type": "textfield" },
        { "key": "checkbox", "label": "Checkbox", "type": "checkbox" }
    ]);
    parse_components(canned).unwrap_or_default()
}

/// `None` only when the value is not an array. Entries that are not objects
/// are dropped; object entries are always kept.
fn parse_components(value: Value) -> Option<Vec<SchemaComponent>> {
    let Value::Array(items) = value else {
        return None;
    };
    Some(items.into_iter().filter_map(component_from_value).collect())
}

/// Typed view of one component object. A known attribute with an
/// unexpected JSON type stays in `extra` untouched.
fn component_from_value(value: Value) -> Option<SchemaComponent> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            tracing::debug!(entry = %other, "dropping non-object form component");
            return None;
        }
    };
    let mut take_string = |field: &str| match map.remove(field) {
        Some(Value::String(text)) => Some(text),
        Some(other) => {
            map.insert(field.to_string(), other);
            None
        }
        None => None,
    };
    let component_type = take_string("type").unwrap_or_default();
    let key = take_string("key");
    let label = take_string("label");
    let text = take_string("text");
    Some(SchemaComponent {
        component_type,
        key,
        label,
        text,
        extra: map,
    })
}

impl FormSchema {
    /// Build a schema from an arbitrary JSON value, filling defaults:
    /// type → `"default"`, components → canned set when absent or not an array,
    /// schemaVersion → 5 when absent or zero.
    pub fn normalize(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };

        let schema_type = match map.remove("type") {
            Some(Value::String(t)) if !t.is_empty() => t,
            _ => DEFAULT_SCHEMA_TYPE.to_string(),
        };

        let components = map
            .remove("components")
            .and_then(parse_components)
            .unwrap_or_else(default_components);

        let schema_version = map
            .remove("schemaVersion")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_SCHEMA_VERSION);

        Self {
            schema_type,
            components,
            schema_version,
            extra: map,
        }
    }

    /// Parse schema JSON text. Invalid JSON is an import failure; valid JSON
    /// with missing parts is normalized.
    pub fn parse_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StudioError::import(DocumentFormat::FormSchema, e.to_string()))?;
        Ok(Self::normalize(value))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Keys of the components that carry one, in order.
    pub fn field_keys(&self) -> Vec<&str> {
        self.components
            .iter()
            .filter_map(|c| c.key.as_deref())
            .collect()
    }
}

impl From<Value> for FormSchema {
    fn from(value: Value) -> Self {
        Self::normalize(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_two_fields() {
        let schema = FormSchema::default();
        assert_eq!(schema.schema_type, "default");
        assert_eq!(schema.schema_version, 5);
        assert_eq!(schema.components.len(), 3);
        assert_eq!(schema.field_keys(), vec!["textfield", "checkbox"]);
    }

    #[test]
    fn test_normalize_fills_missing_parts() {
        let schema = FormSchema::normalize(json!({ "id": "Form_1" }));
        assert_eq!(schema.schema_type, "default");
        assert_eq!(schema.schema_version, 5);
        assert_eq!(schema.components, FormSchema::default().components);
        assert_eq!(schema.extra.get("id"), Some(&json!("Form_1")));
    }

    #[test]
    fn test_normalize_replaces_non_array_components() {
        let not_array = FormSchema::normalize(json!({ "components": "oops" }));
        assert_eq!(not_array.field_keys(), vec!["textfield", "checkbox"]);
    }

    #[test]
    fn test_normalize_keeps_user_components_with_odd_entries() {
        let schema = FormSchema::normalize(json!({
            "components": [
                { "type": "textfield", "key": "customer", "label": "Customer" },
                { "type": "number", "key": "amount" },
                { "key": "note" },
                { "type": "textfield", "key": 7 },
                "stray"
            ]
        }));
        assert_eq!(schema.components.len(), 4);
        assert_eq!(schema.field_keys(), vec!["customer", "amount", "note"]);
        assert_eq!(schema.components[2].component_type, "");
        assert_eq!(schema.components[3].extra["key"], json!(7));

        let back: Value = serde_json::from_str(&schema.to_json_pretty().unwrap()).unwrap();
        assert!(back["components"][2].get("type").is_none());
        assert_eq!(back["components"][3]["key"], 7);
    }

    #[test]
    fn test_normalize_keeps_empty_component_list() {
        let schema = FormSchema::normalize(json!({ "type": "custom", "components": [] }));
        assert_eq!(schema.schema_type, "custom");
        assert!(schema.components.is_empty());
    }

    #[test]
    fn test_zero_version_becomes_default() {
        let schema = FormSchema::normalize(json!({ "schemaVersion": 0 }));
        assert_eq!(schema.schema_version, 5);
        let schema = FormSchema::normalize(json!({ "schemaVersion": 16 }));
        assert_eq!(schema.schema_version, 16);
    }

    #[test]
    fn test_extra_attributes_round_trip() {
        let text = r#"{
            "type": "default",
            "schemaVersion": 5,
            "exporter": { "name": "form-js", "version": "1.0" },
            "components": [
                { "type": "textfield", "key": "email", "label": "Email", "validate": { "required": true } }
            ]
        }"#;
        let schema = FormSchema::parse_json(text).unwrap();
        assert_eq!(schema.components[0].extra["validate"]["required"], json!(true));

        let back: Value = serde_json::from_str(&schema.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back["exporter"]["name"], "form-js");
        assert_eq!(back["components"][0]["validate"]["required"], true);
        assert_eq!(back["schemaVersion"], 5);
        assert!(back["components"][0].get("text").is_none());
    }

    #[test]
    fn test_deserialize_normalizes() {
        let schema: FormSchema = serde_json::from_value(json!({ "components": null })).unwrap();
        assert_eq!(schema, FormSchema::default());
    }

    #[test]
    fn test_invalid_json_is_import_failure() {
        let err = FormSchema::parse_json("{ components: ").unwrap_err();
        assert!(matches!(
            err,
            StudioError::Import {
                format: DocumentFormat::FormSchema,
                ..
            }
        ));
    }
}
