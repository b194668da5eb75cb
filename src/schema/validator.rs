//! JSON Schema validation of form values
//!
//! Every schema violation is attributed to the top-level field it sits
//! under, and each field keeps the most fundamental of its violations
//! (an empty required value beats a malformed one). Messages come from the
//! property's `x-messages` object, keyed by schema keyword, falling back to
//! a generated description.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::Diagnostic;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::core::error::{FieldErrors, Validation, ValidationError};
use crate::core::field::{FieldName, FieldValue};
use crate::core::validator::Validator;
use crate::core::values::FormValues;

/// Schema extension holding per-keyword messages
pub const MESSAGES_KEYWORD: &str = "x-messages";

/// Problems compiling a schema
#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("schema is not valid JSON: {0}")]
    #[diagnostic(code(formgate::schema::json))]
    Json(#[from] serde_json::Error),

    #[error("invalid JSON Schema: {0}")]
    #[diagnostic(
        code(formgate::schema::compile),
        help("check the schema against the JSON Schema 2020-12 specification")
    )]
    Compile(String),
}

/// Validator over a compiled JSON Schema
pub struct SchemaValidator {
    compiled: JsonValidator,
    /// (field, keyword) -> message
    messages: HashMap<(String, String), String>,
    trim_strings: bool,
}

impl SchemaValidator {
    /// Compile a schema with format assertions enabled
    pub fn new(schema: &JsonValue) -> Result<Self, SchemaError> {
        let compiled = jsonschema::options()
            .should_validate_formats(true)
            .build(schema)
            .map_err(|e| SchemaError::Compile(e.to_string()))?;

        Ok(Self {
            compiled,
            messages: collect_messages(schema),
            trim_strings: false,
        })
    }

    pub fn from_json_str(schema: &str) -> Result<Self, SchemaError> {
        let value: JsonValue = serde_json::from_str(schema)?;
        Self::new(&value)
    }

    /// Trim text values (and list items) before validating; the trimmed
    /// values are what a successful validation returns
    pub fn with_trimming(mut self, trim: bool) -> Self {
        self.trim_strings = trim;
        self
    }

    fn coerce(&self, values: &FormValues) -> FormValues {
        if !self.trim_strings {
            return values.clone();
        }
        values
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    FieldValue::Text(s) => FieldValue::Text(s.trim().to_string()),
                    FieldValue::List(items) => {
                        FieldValue::List(items.iter().map(|s| s.trim().to_string()).collect())
                    }
                    FieldValue::Flag(b) => FieldValue::Flag(*b),
                };
                (name.clone(), value)
            })
            .collect()
    }

    fn message_for(&self, field: &str, keyword: &str, error: &JsonSchemaError) -> String {
        self.messages
            .get(&(field.to_string(), keyword.to_string()))
            .cloned()
            .unwrap_or_else(|| format_schema_error(field, error))
    }
}

impl Validator for SchemaValidator {
    fn validate(&self, values: &FormValues) -> Validation {
        let coerced = self.coerce(values);
        let instance = coerced.to_json();

        // field -> (rank, error); lower rank wins
        let mut found: BTreeMap<FieldName, (u8, ValidationError)> = BTreeMap::new();
        let mut unattributed = 0usize;

        for error in self.compiled.iter_errors(&instance) {
            let keyword = schema_keyword(&error);
            let Some(field) = error_field(&error) else {
                tracing::warn!(error = %error, "schema violation not tied to a field");
                unattributed += 1;
                continue;
            };
            let Ok(name) = field.parse::<FieldName>() else {
                unattributed += 1;
                continue;
            };
            let rank = keyword_rank(&keyword);
            if found.get(&name).is_some_and(|(existing, _)| *existing <= rank) {
                continue;
            }
            let message = self.message_for(&field, &keyword, &error);
            found.insert(name.clone(), (rank, ValidationError::schema(name, message)));
        }

        if found.is_empty() && unattributed == 0 {
            return Ok(coerced);
        }
        let errors: FieldErrors = found
            .into_iter()
            .map(|(name, (_, error))| (name, error))
            .collect();
        Err(errors)
    }
}

/// Gather `properties.<field>.x-messages.<keyword>` strings
fn collect_messages(schema: &JsonValue) -> HashMap<(String, String), String> {
    let mut messages = HashMap::new();
    let Some(props) = schema.get("properties").and_then(|p| p.as_object()) else {
        return messages;
    };
    for (field, prop) in props {
        let Some(table) = prop.get(MESSAGES_KEYWORD).and_then(|m| m.as_object()) else {
            continue;
        };
        for (keyword, message) in table {
            if let Some(text) = message.as_str() {
                messages.insert((field.clone(), keyword.clone()), text.to_string());
            }
        }
    }
    messages
}

/// Top-level field an error belongs to
fn error_field(error: &JsonSchemaError) -> Option<String> {
    let path = error.instance_path.to_string();
    if let Some(first) = path.split('/').find(|s| !s.is_empty()) {
        return Some(first.to_string());
    }
    // Root-level errors only name a field when a property is missing
    match &error.kind {
        ValidationErrorKind::Required { property } => Some(
            property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string()),
        ),
        _ => None,
    }
}

/// Keyword that failed, taken from the end of the schema path
fn schema_keyword(error: &JsonSchemaError) -> String {
    let path = error.schema_path.to_string();
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Precedence of keywords when one field fails several
fn keyword_rank(keyword: &str) -> u8 {
    match keyword {
        "required" => 0,
        "type" => 1,
        "minLength" | "minItems" => 2,
        "const" | "enum" => 3,
        "maxLength" | "maxItems" => 4,
        "format" | "pattern" => 5,
        _ => 6,
    }
}

/// Format a JSON Schema error into a user-friendly message
fn format_schema_error(field: &str, error: &JsonSchemaError) -> String {
    match &error.kind {
        ValidationErrorKind::Required { .. } => format!("{} is required", field),
        ValidationErrorKind::Type { kind } => format!("Wrong type: expected {:?}", kind),
        ValidationErrorKind::Enum { options } => {
            format!("Must be one of: {}", format_enum_options(options))
        }
        ValidationErrorKind::Constant { expected_value } => {
            format!("Must be {}", expected_value)
        }
        ValidationErrorKind::Pattern { pattern } => {
            format!("Doesn't match pattern: {}", pattern)
        }
        ValidationErrorKind::Format { format } => format!("Must be a valid {}", format),
        ValidationErrorKind::MinLength { limit } => {
            format!("Too short: minimum {} characters", limit)
        }
        ValidationErrorKind::MaxLength { limit } => {
            format!("Too long: maximum {} characters", limit)
        }
        ValidationErrorKind::MinItems { limit } => format!("Select at least {}", limit),
        _ => error.to_string(),
    }
}

/// Format enum options as a string
fn format_enum_options(options: &JsonValue) -> String {
    if let Some(arr) = options.as_array() {
        arr.iter()
            .map(|v| v.as_str().map(|s| s.to_string()).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        options.to_string()
    }
}
