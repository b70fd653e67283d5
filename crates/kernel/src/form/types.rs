//! Contact form field model.

use serde::{Deserialize, Serialize};

/// Input control type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Textarea,
    Select,
    Checkbox,
    Radio,
}

impl FieldType {
    /// Fields whose value is a boolean rather than a string.
    pub fn is_boolean(self) -> bool {
        matches!(self, FieldType::Checkbox)
    }

    /// Fields whose value must be one of the declared options.
    pub fn has_options(self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

/// One selectable option of a select or radio field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// A field as configured by the editor on a contact form block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Identifier used as the key of the submitted payload.
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "crate::content::null_as_default")]
    pub required: bool,
    #[serde(default, deserialize_with = "crate::content::null_as_default")]
    pub options: Vec<FieldOption>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            field_type,
            required: false,
            options: Vec::new(),
        }
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Add a selectable option.
    pub fn option(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(FieldOption {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Value a field holds before the visitor touches it.
    pub fn empty_value(&self) -> FieldValue {
        if self.field_type.is_boolean() {
            FieldValue::Bool(false)
        } else {
            FieldValue::Text(String::new())
        }
    }
}

/// Current value of a field: text-like, select and radio fields hold a
/// string, checkboxes a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }
}

/// A validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field name (if field-specific).
    pub field: Option<String>,
    /// Error message.
    pub message: String,
}

impl ValidationError {
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        Self {
            field: Some(name.to_string()),
            message: message.into(),
        }
    }
}
