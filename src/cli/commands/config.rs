//! `formgate config` command - view the effective configuration

use clap::Subcommand;
use console::style;
use miette::Result;
use std::collections::BTreeMap;

use crate::cli::helpers::{print_rows, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{Config, CONFIG_KEYS};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();

    if let Some(key) = &args.key {
        if !CONFIG_KEYS.iter().any(|(k, _)| *k == key.as_str()) {
            return Err(miette::miette!(
                help = "run `formgate config keys` to list valid keys",
                "unknown configuration key '{}'",
                key
            ));
        }
        match config.get(key) {
            Some(value) => println!("{}", value),
            None => {
                if !global.quiet {
                    println!("{}", style("(not set)").dim());
                }
            }
        }
        return Ok(());
    }

    let format = global.format.resolve(config.default_format.as_deref());
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let set: BTreeMap<&str, String> = CONFIG_KEYS
                .iter()
                .filter_map(|(k, _)| config.get(k).map(|v| (*k, v)))
                .collect();
            print_structured(format, &set)
        }
        _ => {
            let rows: Vec<Vec<String>> = CONFIG_KEYS
                .iter()
                .map(|(k, _)| vec![k.to_string(), config.get(k).unwrap_or_default()])
                .collect();
            print_rows(format, &["KEY", "VALUE"], &rows)
        }
    }
}

fn run_path() -> Result<()> {
    let cwd = std::env::current_dir().map_err(|e| miette::miette!("{}", e))?;

    match Config::global_config_path() {
        Some(path) => print_path("Global", &path),
        None => println!("{}  {}", style("Global:").bold(), style("(unavailable)").dim()),
    }
    print_path("Project", &Config::project_config_path(&cwd));
    Ok(())
}

fn print_path(label: &str, path: &std::path::Path) {
    let state = if path.exists() {
        style("exists").green()
    } else {
        style("not found").dim()
    };
    println!(
        "{} {} ({})",
        style(format!("{}:", label)).bold(),
        path.display(),
        state
    );
}

fn run_keys() -> Result<()> {
    for (key, description) in CONFIG_KEYS {
        println!("{:<18} {}", style(key).cyan(), description);
    }
    Ok(())
}
