//! Registry of available forms
//!
//! Built-in forms are embedded from `forms/`. A configured forms directory
//! is scanned for `*.form.yaml` files, whose schemas are resolved relative
//! to the definition; a user form replaces a built-in one of the same name.

use miette::Diagnostic;
use rust_embed::Embed;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::config::Config;
use crate::core::controller::FormController;
use crate::core::error::ConfigError;
use crate::schema::definition::{DefinitionError, FormDefinition};
use crate::schema::validator::{SchemaError, SchemaValidator};

#[derive(Embed)]
#[folder = "forms/"]
struct BuiltinForms;

/// File suffix of form definitions
pub const FORM_SUFFIX: &str = ".form.yaml";

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("unknown form '{name}'")]
    #[diagnostic(code(formgate::registry::unknown_form), help("available forms: {available}"))]
    UnknownForm { name: String, available: String },

    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(formgate::registry::io))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("missing embedded file '{0}'")]
    #[diagnostic(code(formgate::registry::embedded))]
    MissingEmbedded(String),

    #[error("in {origin}")]
    #[diagnostic(code(formgate::registry::definition))]
    Definition {
        origin: String,
        #[source]
        #[diagnostic_source]
        source: DefinitionError,
    },

    #[error("schema for form '{form}'")]
    #[diagnostic(code(formgate::registry::schema))]
    Schema {
        form: String,
        #[source]
        #[diagnostic_source]
        source: SchemaError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Where a form came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormSource {
    Builtin,
    File(PathBuf),
}

impl std::fmt::Display for FormSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormSource::Builtin => f.write_str("built-in"),
            FormSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A loaded form with its raw schema
#[derive(Debug, Clone)]
pub struct RegisteredForm {
    pub definition: FormDefinition,
    pub schema: JsonValue,
    pub source: FormSource,
}

impl RegisteredForm {
    /// Compile the form's schema; `trim` overrides the definition's setting
    pub fn validator(&self, trim: Option<bool>) -> Result<SchemaValidator, RegistryError> {
        let validator = SchemaValidator::new(&self.schema).map_err(|source| RegistryError::Schema {
            form: self.definition.name.clone(),
            source,
        })?;
        Ok(validator.with_trimming(trim.unwrap_or(self.definition.trim_strings)))
    }

    /// Build a controller seeded with the form's defaults
    pub fn controller(&self, config: &Config) -> Result<FormController, RegistryError> {
        let validator = self.validator(config.trim_strings)?;
        let controller = FormController::initialize(
            self.definition.field_names().cloned(),
            self.definition.defaults(),
            validator,
        )?;
        Ok(controller)
    }

    /// Declared fields the schema never mentions
    pub fn unchecked_fields(&self) -> Vec<String> {
        let props = self.schema.get("properties").and_then(|p| p.as_object());
        self.definition
            .field_names()
            .filter(|name| !props.is_some_and(|p| p.contains_key(name.as_str())))
            .map(|name| name.to_string())
            .collect()
    }
}

/// All forms available to the CLI
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: BTreeMap<String, RegisteredForm>,
}

impl FormRegistry {
    /// Registry holding only the embedded forms
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for file in BuiltinForms::iter() {
            if !file.ends_with(FORM_SUFFIX) {
                continue;
            }
            let content = embedded_str(&file)?;
            let definition =
                FormDefinition::from_yaml(&content).map_err(|source| RegistryError::Definition {
                    origin: format!("built-in {}", file),
                    source,
                })?;
            let schema_text = embedded_str(&definition.schema)?;
            let schema = parse_schema(&definition.name, &schema_text)?;
            registry.insert(RegisteredForm {
                definition,
                schema,
                source: FormSource::Builtin,
            });
        }
        Ok(registry)
    }

    /// Built-in forms plus those in the configured forms directory
    pub fn load(config: &Config) -> Result<Self, RegistryError> {
        let mut registry = Self::builtin()?;
        if let Some(dir) = &config.forms_dir {
            let count = registry.load_dir(dir)?;
            tracing::debug!(dir = %dir.display(), count, "loaded user forms");
        }
        Ok(registry)
    }

    /// Load every `*.form.yaml` under `dir`; returns how many were loaded
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, RegistryError> {
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "forms directory does not exist");
            return Ok(0);
        }
        let mut count = 0;
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !path.to_string_lossy().ends_with(FORM_SUFFIX) {
                continue;
            }
            let form = load_form_file(path)?;
            if self.forms.contains_key(&form.definition.name) {
                tracing::info!(form = %form.definition.name, path = %path.display(), "user form overrides existing form");
            }
            self.insert(form);
            count += 1;
        }
        Ok(count)
    }

    fn insert(&mut self, form: RegisteredForm) {
        let unchecked = form.unchecked_fields();
        if !unchecked.is_empty() {
            tracing::debug!(
                form = %form.definition.name,
                fields = %unchecked.join(", "),
                "fields without schema rules"
            );
        }
        self.forms.insert(form.definition.name.clone(), form);
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredForm> {
        self.forms.get(name)
    }

    /// Look up a form, listing the alternatives when it does not exist
    pub fn require(&self, name: &str) -> Result<&RegisteredForm, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::UnknownForm {
            name: name.to_string(),
            available: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredForm> {
        self.forms.values()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

fn embedded_str(file: &str) -> Result<String, RegistryError> {
    let content =
        BuiltinForms::get(file).ok_or_else(|| RegistryError::MissingEmbedded(file.to_string()))?;
    Ok(String::from_utf8_lossy(&content.data).into_owned())
}

fn parse_schema(form: &str, text: &str) -> Result<JsonValue, RegistryError> {
    serde_json::from_str(text).map_err(|e| RegistryError::Schema {
        form: form.to_string(),
        source: SchemaError::Json(e),
    })
}

fn read(path: &Path) -> Result<String, RegistryError> {
    std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one definition file and the schema it references
pub fn load_form_file(path: &Path) -> Result<RegisteredForm, RegistryError> {
    let definition =
        FormDefinition::from_yaml(&read(path)?).map_err(|source| RegistryError::Definition {
            origin: path.display().to_string(),
            source,
        })?;
    let schema_path = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&definition.schema);
    let schema = parse_schema(&definition.name, &read(&schema_path)?)?;
    // Compile once now so a broken schema is reported at load time
    SchemaValidator::new(&schema).map_err(|source| RegistryError::Schema {
        form: definition.name.clone(),
        source,
    })?;
    Ok(RegisteredForm {
        definition,
        schema,
        source: FormSource::File(path.to_path_buf()),
    })
}
