//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-directory settings folder
pub const PROJECT_DIR: &str = ".formgate";

/// Message shown for component-native failures, which carry none of their own
pub const DEFAULT_INTERNAL_MESSAGE: &str = "Invalid value";

/// formgate configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Extra directory scanned for `*.form.yaml` definitions
    pub forms_dir: Option<PathBuf>,

    /// Trim text values before validation, overriding the form definition
    pub trim_strings: Option<bool>,

    /// Message shown for internally invalid fields
    pub internal_message: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

/// Keys accepted in config files, with a short description
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("forms_dir", "Extra directory scanned for *.form.yaml definitions"),
    ("trim_strings", "Trim text values before validation (true/false)"),
    ("internal_message", "Message shown for fields a component marked invalid"),
    ("default_format", "Default output format (yaml, json, tsv, csv)"),
];

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(Self::global_config_path().as_deref(), &cwd)
    }

    /// Load with an explicit global config path and working directory
    pub fn load_from(global_path: Option<&Path>, cwd: &Path) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/formgate/config.yaml)
        if let Some(global) = global_path.and_then(Self::read_file) {
            config.merge(global);
        }

        // 3. Project config (.formgate/config.yaml)
        let project_path = Self::project_config_path(cwd);
        if let Some(project) = Self::read_file(&project_path) {
            config.merge(project);
        }

        // 4. Environment variables
        if let Ok(dir) = std::env::var("FORMGATE_FORMS_DIR") {
            config.forms_dir = Some(PathBuf::from(dir));
        }
        if let Ok(trim) = std::env::var("FORMGATE_TRIM") {
            match parse_bool(&trim) {
                Some(value) => config.trim_strings = Some(value),
                None => tracing::warn!(value = %trim, "ignoring FORMGATE_TRIM, expected true/false"),
            }
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(mut config) => {
                // Relative form directories are relative to the file that names them
                if let (Some(dir), Some(parent)) = (config.forms_dir.as_ref(), path.parent()) {
                    if dir.is_relative() {
                        let base = parent
                            .parent()
                            .filter(|_| parent.ends_with(PROJECT_DIR))
                            .unwrap_or(parent);
                        config.forms_dir = Some(base.join(dir));
                    }
                }
                tracing::debug!(path = %path.display(), "loaded config file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "formgate")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Get the path to the project config file under `cwd`
    pub fn project_config_path(cwd: &Path) -> PathBuf {
        cwd.join(PROJECT_DIR).join("config.yaml")
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.forms_dir.is_some() {
            self.forms_dir = other.forms_dir;
        }
        if other.trim_strings.is_some() {
            self.trim_strings = other.trim_strings;
        }
        if other.internal_message.is_some() {
            self.internal_message = other.internal_message;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Message shown for internally invalid fields
    pub fn internal_message(&self) -> &str {
        self.internal_message
            .as_deref()
            .unwrap_or(DEFAULT_INTERNAL_MESSAGE)
    }

    /// Look up a key by name, rendered as a string
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "forms_dir" => self.forms_dir.as_ref().map(|p| p.display().to_string()),
            "trim_strings" => self.trim_strings.map(|b| b.to_string()),
            "internal_message" => self.internal_message.clone(),
            "default_format" => self.default_format.clone(),
            _ => None,
        }
    }
}

/// Parse the boolean spellings accepted in config and on the command line
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}
