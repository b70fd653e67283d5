//! Contact form state and submission flow.
//!
//! Each form instance moves through `Idle -> Submitting -> {Submitted, Idle}`.
//! Validation runs before any network call; a submit while one is already in
//! flight (or after success) is ignored.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::submit::{SubmissionClient, SubmissionError};
use super::types::{FieldDefinition, FieldType, FieldValue, ValidationError};
use crate::content::blocks::ContactFormBlock;

/// Message shown above the fields when validation fails.
pub const INVALID_FORM_MESSAGE: &str = "Please correct the highlighted fields.";

/// Submission state of one form instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionState {
    /// Editable; `error` holds the last failure, if any.
    Idle { error: Option<String> },
    Submitting,
    Submitted,
}

impl Default for SubmissionState {
    fn default() -> Self {
        SubmissionState::Idle { error: None }
    }
}

/// Result of trying to start a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum BeginSubmit {
    /// Now `Submitting`; send this payload.
    Ready(Map<String, Value>),
    /// A submission is in flight or already succeeded.
    Ignored,
    /// Validation failed; the form stays `Idle`.
    Invalid(Vec<ValidationError>),
}

/// Final result of a submit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    Failed(String),
    Invalid(Vec<ValidationError>),
    Ignored,
}

/// A contact form instance: field definitions, current values and state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactForm {
    fields: Vec<FieldDefinition>,
    values: HashMap<String, FieldValue>,
    state: SubmissionState,
    errors: Vec<ValidationError>,
}

impl ContactForm {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// A fresh instance for the fields of a contact form block.
    pub fn from_block(block: &ContactFormBlock) -> Self {
        Self::new(block.fields.clone())
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Field-level errors from the last validation.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Current value of a field, or its empty value when untouched.
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        let field = self.field(name)?;
        Some(
            self.values
                .get(name)
                .cloned()
                .unwrap_or_else(|| field.empty_value()),
        )
    }

    fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Set a field's value. The value kind must match the field type.
    pub fn set_value(&mut self, name: &str, value: FieldValue) -> Result<(), ValidationError> {
        let field = self
            .field(name)
            .ok_or_else(|| ValidationError::field(name, "Unknown field"))?;

        let matches = match value {
            FieldValue::Bool(_) => field.field_type.is_boolean(),
            FieldValue::Text(_) => !field.field_type.is_boolean(),
        };
        if !matches {
            return Err(ValidationError::field(
                name,
                format!("{} expects a different kind of value", field.label),
            ));
        }

        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Apply an urlencoded form body. A checkbox is checked when its key is
    /// present; keys that are not declared fields are ignored.
    pub fn apply_form_body(&mut self, body: &HashMap<String, String>) {
        for field in &self.fields {
            let value = if field.field_type.is_boolean() {
                FieldValue::Bool(body.contains_key(&field.name))
            } else {
                match body.get(&field.name) {
                    Some(v) => FieldValue::Text(v.clone()),
                    None => continue,
                }
            };
            self.values.insert(field.name.clone(), value);
        }
    }

    /// Check required fields and declared constraints.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for field in &self.fields {
            let value = self
                .values
                .get(&field.name)
                .cloned()
                .unwrap_or_else(|| field.empty_value());

            match (field.field_type, &value) {
                (FieldType::Checkbox, v) => {
                    if field.required && v.as_bool() != Some(true) {
                        errors.push(ValidationError::field(
                            &field.name,
                            format!("{} must be checked", field.label),
                        ));
                    }
                }
                (_, v) => {
                    let text = v.as_text().unwrap_or_default().trim();
                    if text.is_empty() {
                        if field.required {
                            errors.push(ValidationError::field(
                                &field.name,
                                format!("{} is required", field.label),
                            ));
                        }
                        continue;
                    }
                    if field.field_type == FieldType::Email && !looks_like_email(text) {
                        errors.push(ValidationError::field(
                            &field.name,
                            format!("{} must be a valid email address", field.label),
                        ));
                    }
                    if field.field_type.has_options()
                        && !field.options.iter().any(|o| o.value == text)
                    {
                        errors.push(ValidationError::field(
                            &field.name,
                            format!("{} must be one of the listed options", field.label),
                        ));
                    }
                }
            }
        }

        errors
    }

    /// JSON payload: every declared field, untouched ones at their empty value.
    pub fn payload(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|field| {
                let value = match self.values.get(&field.name) {
                    Some(FieldValue::Text(s)) => Value::String(s.clone()),
                    Some(FieldValue::Bool(b)) => Value::Bool(*b),
                    None => match field.empty_value() {
                        FieldValue::Text(s) => Value::String(s),
                        FieldValue::Bool(b) => Value::Bool(b),
                    },
                };
                (field.name.clone(), value)
            })
            .collect()
    }

    /// Start a submission: `Idle -> Submitting` when the values validate.
    pub fn begin_submit(&mut self) -> BeginSubmit {
        match self.state {
            SubmissionState::Submitting | SubmissionState::Submitted => {
                debug!(state = ?self.state, "ignoring repeated submit");
                return BeginSubmit::Ignored;
            }
            SubmissionState::Idle { .. } => {}
        }

        let errors = self.validate();
        if !errors.is_empty() {
            self.state = SubmissionState::Idle {
                error: Some(INVALID_FORM_MESSAGE.to_string()),
            };
            self.errors = errors.clone();
            return BeginSubmit::Invalid(errors);
        }

        self.errors.clear();
        self.state = SubmissionState::Submitting;
        BeginSubmit::Ready(self.payload())
    }

    /// Complete a submission started with `begin_submit`.
    pub fn finish_submit(&mut self, result: Result<(), SubmissionError>) -> SubmitOutcome {
        if self.state != SubmissionState::Submitting {
            return SubmitOutcome::Ignored;
        }

        match result {
            Ok(()) => {
                info!(fields = self.fields.len(), "contact form submitted");
                self.values.clear();
                self.state = SubmissionState::Submitted;
                SubmitOutcome::Submitted
            }
            Err(e) => {
                let message = e.to_string();
                self.state = SubmissionState::Idle {
                    error: Some(message.clone()),
                };
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Validate and submit through `client`.
    pub async fn submit(&mut self, client: &dyn SubmissionClient) -> SubmitOutcome {
        let payload = match self.begin_submit() {
            BeginSubmit::Ready(payload) => payload,
            BeginSubmit::Ignored => return SubmitOutcome::Ignored,
            BeginSubmit::Invalid(errors) => return SubmitOutcome::Invalid(errors),
        };
        let result = client.submit(&payload).await;
        self.finish_submit(result)
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// A form instance shared between concurrent callers.
///
/// The state gate is checked under the lock, and the lock is released before
/// the network call, so overlapping submits collapse into one request.
#[derive(Debug, Clone, Default)]
pub struct SharedContactForm {
    inner: Arc<Mutex<ContactForm>>,
}

impl SharedContactForm {
    pub fn new(form: ContactForm) -> Self {
        Self {
            inner: Arc::new(Mutex::new(form)),
        }
    }

    /// Clone of the current form.
    pub fn snapshot(&self) -> ContactForm {
        self.inner.lock().clone()
    }

    /// Run `f` with exclusive access to the form.
    pub fn update<R>(&self, f: impl FnOnce(&mut ContactForm) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub async fn submit(&self, client: &dyn SubmissionClient) -> SubmitOutcome {
        let started = self.inner.lock().begin_submit();
        let payload = match started {
            BeginSubmit::Ready(payload) => payload,
            BeginSubmit::Ignored => return SubmitOutcome::Ignored,
            BeginSubmit::Invalid(errors) => return SubmitOutcome::Invalid(errors),
        };
        let result = client.submit(&payload).await;
        self.inner.lock().finish_submit(result)
    }
}
