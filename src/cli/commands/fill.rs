//! `formgate fill` command - interactive form entry

use miette::Result;

use crate::cli::commands::submit::{apply_assignments, print_receipt, submit_once};
use crate::cli::helpers::load_forms;
use crate::cli::GlobalOpts;
use crate::schema::wizard::FormWizard;

#[derive(clap::Args, Debug)]
pub struct FillArgs {
    /// Form name (see `formgate list`)
    pub form: String,

    /// Prefill a field (repeatable); prefilled fields are not prompted for
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,

    /// Do not prompt; submit the defaults and prefilled values as they are
    #[arg(long)]
    pub no_input: bool,
}

pub fn run(args: FillArgs, global: &GlobalOpts) -> Result<()> {
    let (config, registry) = load_forms()?;
    let form = registry.require(&args.form)?;
    let mut controller = form.controller(&config)?;

    let prefilled = apply_assignments(&mut controller, form, &args.set)?;

    if args.no_input {
        return submit_once(&mut controller, form, &config, global);
    }

    let pending = form
        .definition
        .field_names()
        .filter(|name| !prefilled.contains(name))
        .cloned()
        .collect();

    let wizard = FormWizard::new(&form.definition, config.internal_message());
    let values = wizard.run(&mut controller, pending)?;
    print_receipt(form, values, &config, global)
}
