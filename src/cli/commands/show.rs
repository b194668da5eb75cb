//! `formgate show` command - a form's fields

use console::style;
use miette::Result;

use crate::cli::helpers::{load_forms, print_rows, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Form name (see `formgate list`)
    pub form: String,
}

pub fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (config, registry) = load_forms()?;
    let form = registry.require(&args.form)?;
    let format = global.format.resolve(config.default_format.as_deref());

    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(format, &form.definition);
    }

    if format == OutputFormat::Auto && !global.quiet {
        println!("{}", style(&form.definition.title).bold());
        if let Some(desc) = &form.definition.description {
            println!("{}", style(desc).dim());
        }
        println!("{} {}", style("Source:").dim(), form.source);
    }

    let rows: Vec<Vec<String>> = form
        .definition
        .fields
        .iter()
        .map(|field| {
            vec![
                field.name.to_string(),
                field.label.clone(),
                field.widget.as_str().to_string(),
                if field.required { "yes" } else { "no" }.to_string(),
                field.default_value().to_string(),
                field
                    .widget
                    .options()
                    .map(|o| o.join(", "))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_rows(
        format,
        &["FIELD", "LABEL", "WIDGET", "REQUIRED", "DEFAULT", "OPTIONS"],
        &rows,
    )
}
