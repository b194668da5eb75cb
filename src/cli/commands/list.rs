//! `formgate list` command - available forms

use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{load_forms, print_rows, print_structured, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Debug, Serialize)]
struct FormSummary<'a> {
    name: &'a str,
    title: &'a str,
    fields: usize,
    source: String,
}

pub fn run(global: &GlobalOpts) -> Result<()> {
    let (config, registry) = load_forms()?;
    let format = global.format.resolve(config.default_format.as_deref());

    let summaries: Vec<FormSummary> = registry
        .iter()
        .map(|form| FormSummary {
            name: &form.definition.name,
            title: &form.definition.title,
            fields: form.definition.fields.len(),
            source: form.source.to_string(),
        })
        .collect();

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(format, &summaries),
        _ => {
            if global.quiet {
                for summary in &summaries {
                    println!("{}", summary.name);
                }
                return Ok(());
            }
            let rows: Vec<Vec<String>> = summaries
                .iter()
                .map(|s| {
                    vec![
                        s.name.to_string(),
                        truncate_str(s.title, 40),
                        s.fields.to_string(),
                        s.source.clone(),
                    ]
                })
                .collect();
            print_rows(format, &["NAME", "TITLE", "FIELDS", "SOURCE"], &rows)
        }
    }
}
