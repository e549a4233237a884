use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Primitive type a schema field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Any JSON number
    Number,
    /// true / false
    Boolean,
}

impl FieldType {
    /// Whether a JSON value is of this primitive type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }

    /// Lowercase name for error messages, matching the wire spelling.
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }
}

/// One field in a secrets or config schema.
///
/// Schemas are declarative: the host validates buckets against them and the
/// presentation layer renders forms from them, but widgets remain free to
/// read whatever their bucket actually contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Expected primitive type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field must be present and non-empty
    #[serde(default)]
    pub required: bool,
    /// Default value shown by the presentation layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Closed set of accepted values (string fields only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl FieldSpec {
    /// A required field of the given type.
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            default: None,
            options: None,
        }
    }

    /// An optional field with a default value.
    pub fn optional(field_type: FieldType, default: Value) -> Self {
        Self {
            field_type,
            required: false,
            default: Some(default),
            options: None,
        }
    }

    /// Restrict a string field to a closed set of values.
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Field name → spec. Ordered so rendered forms and error lists are stable.
pub type FieldSchema = BTreeMap<String, FieldSpec>;

/// Static description of a widget type, declared by its plugin at
/// registration time and immutable afterwards.
///
/// The `component` hint names the frontend module that renders this widget;
/// the host treats it as opaque and only hands it to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetTypeDescriptor {
    /// Globally unique type id (builtin convention: `<module>-widget`)
    pub id: String,
    /// Human-readable display name
    pub name: String,
    /// Short description shown in the add-widget dialog
    pub description: String,
    /// Frontend component reference (presentation-layer only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Schema for the type-scoped secrets bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_schema: Option<FieldSchema>,
    /// Schema for per-instance configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<FieldSchema>,
    /// Shape of the data this widget exports on demand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_schema: Option<FieldSchema>,
}

impl WidgetTypeDescriptor {
    /// Create a descriptor with the mandatory display metadata.
    pub fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            component: None,
            secrets_schema: None,
            config_schema: None,
            export_schema: None,
        }
    }

    pub fn with_component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    pub fn with_secrets_schema(mut self, schema: FieldSchema) -> Self {
        self.secrets_schema = Some(schema);
        self
    }

    pub fn with_config_schema(mut self, schema: FieldSchema) -> Self {
        self.config_schema = Some(schema);
        self
    }

    pub fn with_export_schema(mut self, schema: FieldSchema) -> Self {
        self.export_schema = Some(schema);
        self
    }
}
