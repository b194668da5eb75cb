//! Command implementations

pub mod completions;
pub mod config;
pub mod fill;
pub mod list;
pub mod schema;
pub mod show;
pub mod submit;
