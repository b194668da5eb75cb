//! `formgate schema` command - print a form's JSON Schema

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::load_forms;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct SchemaArgs {
    /// Form name (see `formgate list`)
    pub form: String,
}

pub fn run(args: SchemaArgs, global: &GlobalOpts) -> Result<()> {
    let (_, registry) = load_forms()?;
    let form = registry.require(&args.form)?;

    // Schemas are JSON documents; only YAML is offered as an alternative
    if global.format == OutputFormat::Yaml {
        print!("{}", serde_yml::to_string(&form.schema).into_diagnostic()?);
    } else {
        println!("{}", serde_json::to_string_pretty(&form.schema).into_diagnostic()?);
    }
    Ok(())
}
