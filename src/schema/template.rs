//! Receipts for accepted submissions

use chrono::{DateTime, Utc};
use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;
use ulid::Ulid;

use crate::core::values::FormValues;
use crate::schema::definition::FormDefinition;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const RECEIPT_TEMPLATE: &str = "receipt.txt.tera";

/// Record of one accepted submission
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub id: String,
    pub form: String,
    pub title: String,
    pub submitted_at: DateTime<Utc>,
    pub values: FormValues,
    /// Fields whose values are not echoed back
    #[serde(skip)]
    secret: Vec<String>,
}

impl Receipt {
    pub fn new(definition: &FormDefinition, values: FormValues) -> Self {
        Self {
            id: Ulid::new().to_string(),
            form: definition.name.clone(),
            title: definition.title.clone(),
            submitted_at: Utc::now(),
            values,
            secret: definition
                .fields
                .iter()
                .filter(|f| f.widget.is_secret())
                .map(|f| f.name.to_string())
                .collect(),
        }
    }

    /// Values with secret fields masked, for machine-readable output
    pub fn redacted(&self) -> serde_json::Value {
        let mut json = serde_json::to_value(self).unwrap_or_default();
        if let Some(values) = json.get_mut("values").and_then(|v| v.as_object_mut()) {
            for field in &self.secret {
                if let Some(v) = values.get_mut(field) {
                    *v = serde_json::Value::String("********".to_string());
                }
            }
        }
        json
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

#[derive(Serialize)]
struct ReceiptLine {
    label: String,
    value: String,
    secret: bool,
}

/// Renders receipts through embedded tera templates
pub struct ReceiptRenderer {
    tera: Tera,
}

impl ReceiptRenderer {
    /// Create a renderer with embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    /// Render a plain-text receipt in form field order
    pub fn render(&self, definition: &FormDefinition, receipt: &Receipt) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == RECEIPT_TEMPLATE) {
            return Err(TemplateError::NotFound(RECEIPT_TEMPLATE.to_string()));
        }

        let lines: Vec<ReceiptLine> = definition
            .fields
            .iter()
            .map(|f| ReceiptLine {
                label: f.label.clone(),
                value: receipt
                    .values
                    .get(&f.name)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                secret: f.widget.is_secret(),
            })
            .collect();

        let mut context = tera::Context::new();
        context.insert("id", &receipt.id);
        context.insert("title", &receipt.title);
        context.insert("submitted_at", &receipt.submitted_at.to_rfc3339());
        context.insert("fields", &lines);

        self.tera
            .render(RECEIPT_TEMPLATE, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}
