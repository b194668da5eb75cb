//! `formgate submit` command - non-interactive submission
//!
//! Values from `--values` and `--set` go through each field's widget, the
//! same way typed input does, then the form is submitted once. A rejected
//! submission lists every offending field and exits non-zero.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{load_forms, parse_assignment, print_rows, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::binding::RawInput;
use crate::core::config::Config;
use crate::core::controller::{FormController, SubmitOutcome};
use crate::core::error::Rejection;
use crate::core::field::FieldName;
use crate::core::values::FormValues;
use crate::schema::registry::RegisteredForm;
use crate::schema::template::{Receipt, ReceiptRenderer};
use crate::schema::wizard::apply_raw;

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Form name (see `formgate list`)
    pub form: String,

    /// YAML or JSON file mapping field names to values
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Set a field (repeatable): --set email=a@b.com
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,
}

pub fn run(args: SubmitArgs, global: &GlobalOpts) -> Result<()> {
    let (config, registry) = load_forms()?;
    let form = registry.require(&args.form)?;
    let mut controller = form.controller(&config)?;

    if let Some(path) = &args.values {
        for (field, raw) in read_values_file(path)? {
            apply_raw(&mut controller, &form.definition, &field, raw)?;
        }
    }
    apply_assignments(&mut controller, form, &args.set)?;

    submit_once(&mut controller, form, &config, global)
}

/// Apply `--set field=value` assignments in order
pub(crate) fn apply_assignments(
    controller: &mut FormController,
    form: &RegisteredForm,
    assignments: &[String],
) -> Result<Vec<FieldName>> {
    let mut applied = Vec::new();
    for assignment in assignments {
        let (field, value) = parse_assignment(assignment)?;
        apply_raw(controller, &form.definition, &field, RawInput::Text(value))?;
        applied.push(field);
    }
    Ok(applied)
}

/// Submit, printing the receipt or returning the rejection
pub(crate) fn submit_once(
    controller: &mut FormController,
    form: &RegisteredForm,
    config: &Config,
    global: &GlobalOpts,
) -> Result<()> {
    match controller.submit() {
        SubmitOutcome::Accepted(values) => print_receipt(form, values, config, global),
        SubmitOutcome::Rejected(errors) => {
            tracing::info!(form = %form.definition.name, fields = errors.len(), "submission rejected");
            Err(Rejection::new(&errors, config.internal_message()).into())
        }
        SubmitOutcome::Ignored | SubmitOutcome::Discarded => {
            Err(miette::miette!("submit of '{}' did not complete", form.definition.name))
        }
    }
}

/// Print the receipt for accepted values in the requested format
pub(crate) fn print_receipt(
    form: &RegisteredForm,
    values: FormValues,
    config: &Config,
    global: &GlobalOpts,
) -> Result<()> {
    let receipt = Receipt::new(&form.definition, values);
    tracing::debug!(form = %receipt.form, id = %receipt.id, "submission accepted");

    let format = global.format.resolve(config.default_format.as_deref());
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(format, &receipt.redacted()),
        OutputFormat::Tsv | OutputFormat::Csv => {
            let redacted = receipt.redacted();
            let rows: Vec<Vec<String>> = form
                .definition
                .fields
                .iter()
                .map(|f| {
                    let value = match redacted["values"].get(f.name.as_str()) {
                        Some(JsonValue::String(s)) => s.clone(),
                        Some(JsonValue::Array(items)) => items
                            .iter()
                            .filter_map(|i| i.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                        Some(other) => other.to_string(),
                        None => String::new(),
                    };
                    vec![f.name.to_string(), value]
                })
                .collect();
            print_rows(format, &["FIELD", "VALUE"], &rows)
        }
        OutputFormat::Auto => {
            if global.quiet {
                println!("{}", receipt.id);
                return Ok(());
            }
            let text = ReceiptRenderer::new()
                .and_then(|r| r.render(&form.definition, &receipt))
                .map_err(|e| miette::miette!("{}", e))?;
            println!("{} {}", style("✓").green(), text.trim_end());
            Ok(())
        }
    }
}

/// Read a YAML or JSON mapping of field values
///
/// Strings are entered as typed text, booleans as checkbox state and
/// sequences of strings as a multi-selection. Any other shape is an error.
pub(crate) fn read_values_file(path: &Path) -> Result<Vec<(FieldName, RawInput)>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("cannot read {}: {}", path.display(), e))?;
    // YAML is a superset of JSON, so one parser covers both
    let doc: JsonValue = serde_yml::from_str(&content).into_diagnostic()?;
    let values = FormValues::from_json(&doc)
        .map_err(|e| miette::miette!("{}: {}", path.display(), e))?;
    Ok(values
        .into_iter()
        .map(|(field, value)| (field, RawInput::from(value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_values_file_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("values.yaml");
        std::fs::write(
            &path,
            "email: a@b.com\nterms: true\npayment:\n  - PayPal\ndob: 1990-05-17\n",
        )
        .unwrap();

        let entries = read_values_file(&path).unwrap();
        let get = |name: &str| {
            entries
                .iter()
                .find(|(f, _)| f.as_str() == name)
                .map(|(_, raw)| raw.clone())
                .unwrap()
        };
        assert_eq!(get("email"), RawInput::Text("a@b.com".into()));
        assert_eq!(get("terms"), RawInput::Checked(true));
        assert_eq!(get("payment"), RawInput::Selected(vec!["PayPal".into()]));
        assert_eq!(get("dob"), RawInput::Text("1990-05-17".into()));
    }

    #[test]
    fn test_read_values_file_rejects_other_shapes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("values.yaml");
        for doc in ["zip: 12345\n", "dob: ~\n", "payment: [PayPal, 3]\n", "Email: a@b.com\n"] {
            std::fs::write(&path, doc).unwrap();
            assert!(read_values_file(&path).is_err(), "accepted {:?}", doc);
        }
    }

    #[test]
    fn test_read_values_file_rejects_non_mapping() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("values.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(read_values_file(&path).is_err());
    }
}
