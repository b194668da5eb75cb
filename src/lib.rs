//! formgate: schema-gated form state
//!
//! A form controller that owns field values, per-field errors and
//! component-reported validity, and only hands values to its success
//! callback once a single validation pass finds nothing wrong.

pub mod cli;
pub mod core;
pub mod schema;
