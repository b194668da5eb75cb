//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::core::config::Config;
use crate::core::field::FieldName;
use crate::schema::registry::FormRegistry;

/// Load configuration and every form it makes available
pub fn load_forms() -> Result<(Config, FormRegistry)> {
    let config = Config::load();
    let registry = FormRegistry::load(&config)?;
    tracing::debug!(forms = registry.len(), "form registry loaded");
    Ok((config, registry))
}

/// Split a `field=value` assignment
pub fn parse_assignment(s: &str) -> Result<(FieldName, String)> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| miette::miette!("expected field=value, got '{}'", s))?;
    let field = name
        .trim()
        .parse::<FieldName>()
        .map_err(|e| miette::miette!("invalid field name '{}': {}", name.trim(), e))?;
    Ok((field, value.to_string()))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a serializable value as JSON or YAML
pub fn print_structured<T: Serialize>(format: OutputFormat, value: &T) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Print rows as a terminal table, TSV or CSV
pub fn print_rows(format: OutputFormat, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    match format {
        OutputFormat::Tsv | OutputFormat::Csv => {
            let delimiter = if format == OutputFormat::Tsv { b'\t' } else { b',' };
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(std::io::stdout());
            writer.write_record(headers).into_diagnostic()?;
            for row in rows {
                writer.write_record(row).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(headers.iter().copied());
            for row in rows {
                builder.push_record(row.iter().cloned());
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
    Ok(())
}
