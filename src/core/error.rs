//! Validation errors, derived error state and configuration errors

use miette::Diagnostic;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::field::FieldName;
use crate::core::values::FormValues;

/// Where a field error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Reported by the schema validator
    Schema,
    /// Reported by the field's own component (e.g. an unparseable date)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Schema => "schema",
            ErrorKind::Internal => "internal",
        }
    }
}

/// A single field failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error, Diagnostic)]
#[error("{field}: {}", .message.as_deref().unwrap_or("invalid value"))]
pub struct ValidationError {
    pub field: FieldName,
    pub kind: ErrorKind,
    pub message: Option<String>,
}

impl ValidationError {
    pub fn schema(field: FieldName, message: impl Into<String>) -> Self {
        Self {
            field,
            kind: ErrorKind::Schema,
            message: Some(message.into()),
        }
    }

    /// Component-native failure; these carry no message of their own
    pub fn internal(field: FieldName) -> Self {
        Self {
            field,
            kind: ErrorKind::Internal,
            message: None,
        }
    }
}

/// Per-field failures reported by one validation pass
pub type FieldErrors = BTreeMap<FieldName, ValidationError>;

/// Result of a validation pass: the (possibly coerced) values or every field failure
pub type Validation = Result<FormValues, FieldErrors>;

/// Current error indicator per field
///
/// Only the controller builds this, from the merged validator output of
/// the latest completed submit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorState(FieldErrors);

impl ErrorState {
    pub(crate) fn from_errors(errors: FieldErrors) -> Self {
        Self(errors)
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }

    pub fn has_error(&self, field: &FieldName) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &FieldName) -> Option<&ValidationError> {
        self.0.get(field)
    }

    /// Message for a field, if its error carries one
    pub fn message(&self, field: &FieldName) -> Option<&str> {
        self.0.get(field).and_then(|e| e.message.as_deref())
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Programming errors in how a form is declared or driven
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConfigError {
    #[error("no default value supplied for declared field '{0}'")]
    #[diagnostic(
        code(formgate::config::missing_default),
        help("every declared field needs a default value")
    )]
    MissingDefault(FieldName),

    #[error("default supplied for undeclared field '{0}'")]
    #[diagnostic(code(formgate::config::undeclared_default))]
    UndeclaredDefault(FieldName),

    #[error("field '{0}' is declared more than once")]
    #[diagnostic(code(formgate::config::duplicate_field))]
    DuplicateField(FieldName),

    #[error("unknown field '{0}'")]
    #[diagnostic(code(formgate::config::unknown_field))]
    UnknownField(FieldName),
}

/// A rejected submission, rendered with one related entry per field
#[derive(Debug, Error, Diagnostic)]
#[error("Submission rejected: {summary}")]
#[diagnostic(
    code(formgate::submit::rejected),
    help("fix the listed fields and submit again")
)]
pub struct Rejection {
    summary: String,

    #[related]
    errors: Vec<ValidationError>,
}

impl Rejection {
    pub fn new(errors: &ErrorState, internal_message: &str) -> Self {
        let errors: Vec<ValidationError> = errors
            .iter()
            .map(|e| {
                let mut e = e.clone();
                if e.message.is_none() {
                    e.message = Some(internal_message.to_string());
                }
                e
            })
            .collect();
        let summary = match errors.len() {
            0 => "form-level error".to_string(),
            1 => "1 field".to_string(),
            n => format!("{} fields", n),
        };
        Self { summary, errors }
    }

    pub fn field_count(&self) -> usize {
        self.errors.len()
    }
}
