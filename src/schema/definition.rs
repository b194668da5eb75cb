//! Form definitions: which fields a form declares and how each is entered

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::core::field::{FieldName, FieldValue};
use crate::core::values::FormValues;
use crate::schema::widget::Widget;

/// A form as declared in a `*.form.yaml` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Short name used on the command line
    pub name: String,

    /// Heading shown above the form
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema file, relative to the definition
    pub schema: String,

    /// Trim text values before validation
    #[serde(default)]
    pub trim_strings: bool,

    pub fields: Vec<FieldSpec>,
}

/// One declared field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: FieldName,

    pub label: String,

    /// Shown with a required marker; enforcement is the schema's job
    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,

    #[serde(flatten)]
    pub widget: Widget,
}

impl FieldSpec {
    /// Declared default, or the widget's natural empty value
    pub fn default_value(&self) -> FieldValue {
        self.default
            .clone()
            .unwrap_or_else(|| self.widget.default_value())
    }
}

/// Problems with a form definition
#[derive(Debug, Error, Diagnostic)]
pub enum DefinitionError {
    #[error("cannot parse form definition: {0}")]
    #[diagnostic(code(formgate::definition::parse))]
    Parse(#[from] serde_yml::Error),

    #[error("form '{form}' declares no fields")]
    #[diagnostic(code(formgate::definition::empty))]
    NoFields { form: String },

    #[error("form '{form}' declares field '{field}' more than once")]
    #[diagnostic(code(formgate::definition::duplicate_field))]
    DuplicateField { form: String, field: FieldName },

    #[error("field '{field}' has a {found} default but its {widget} widget holds {expected} values")]
    #[diagnostic(code(formgate::definition::default_kind))]
    DefaultKind {
        field: FieldName,
        widget: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{field}' defaults to '{value}', which is not one of its options")]
    #[diagnostic(
        code(formgate::definition::default_option),
        help("pick the default from the field's options list")
    )]
    DefaultNotAnOption { field: FieldName, value: String },

    #[error("field '{field}' has a {widget} widget with no options")]
    #[diagnostic(code(formgate::definition::no_options))]
    NoOptions { field: FieldName, widget: &'static str },
}

impl FormDefinition {
    /// Parse and check a definition
    pub fn from_yaml(content: &str) -> Result<Self, DefinitionError> {
        let def: FormDefinition = serde_yml::from_str(content)?;
        def.check()?;
        Ok(def)
    }

    /// Check the declared fields are consistent with their widgets
    pub fn check(&self) -> Result<(), DefinitionError> {
        if self.fields.is_empty() {
            return Err(DefinitionError::NoFields {
                form: self.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(&field.name) {
                return Err(DefinitionError::DuplicateField {
                    form: self.name.clone(),
                    field: field.name.clone(),
                });
            }

            if let Some(options) = field.widget.options() {
                if options.is_empty() {
                    return Err(DefinitionError::NoOptions {
                        field: field.name.clone(),
                        widget: field.widget.as_str(),
                    });
                }
            }

            let Some(default) = &field.default else {
                continue;
            };
            let expected = field.widget.kind();
            if default.kind() != expected {
                return Err(DefinitionError::DefaultKind {
                    field: field.name.clone(),
                    widget: field.widget.as_str(),
                    expected: expected.as_str(),
                    found: default.kind().as_str(),
                });
            }
            if let Some(options) = field.widget.options() {
                let values: Vec<&str> = match default {
                    FieldValue::Text(s) => vec![s.as_str()],
                    FieldValue::List(items) => items.iter().map(String::as_str).collect(),
                    FieldValue::Flag(_) => vec![],
                };
                if let Some(bad) = values.into_iter().find(|v| !options.iter().any(|o| o == v)) {
                    return Err(DefinitionError::DefaultNotAnOption {
                        field: field.name.clone(),
                        value: bad.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &FieldName) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| &f.name == name)
    }

    /// Declared field names in form order
    pub fn field_names(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.iter().map(|f| &f.name)
    }

    /// Default value for every declared field
    pub fn defaults(&self) -> FormValues {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default_value()))
            .collect()
    }
}
