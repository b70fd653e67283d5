//! Contact form handling.
//!
//! The form system supports:
//! - Field definitions configured per contact form block
//! - Per-instance submission state (`Idle -> Submitting -> Submitted | Idle+error`)
//! - Server-side validation before any network call
//! - Pluggable delivery through `SubmissionClient`

mod service;
mod submit;
mod types;

pub use service::{
    BeginSubmit, ContactForm, INVALID_FORM_MESSAGE, SharedContactForm, SubmissionState,
    SubmitOutcome,
};
pub use submit::{
    GENERIC_REJECTION, HttpSubmissionClient, SubmissionClient, SubmissionError,
    UNEXPECTED_FAILURE, UNREADABLE_REJECTION,
};
pub use types::{FieldDefinition, FieldOption, FieldType, FieldValue, ValidationError};
