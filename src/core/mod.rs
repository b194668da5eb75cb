//! Core module - form state, validation contracts and configuration

pub mod binding;
pub mod config;
pub mod controller;
pub mod error;
pub mod field;
pub mod validator;
pub mod validity;
pub mod values;

pub use binding::{FieldAdapter, FieldBinding, FieldEvent, FieldUpdate, RawInput};
pub use config::Config;
pub use controller::{submit_shared, FormController, SubmitOutcome, SubmitTicket};
pub use error::{
    ConfigError, ErrorKind, ErrorState, FieldErrors, Rejection, Validation, ValidationError,
};
pub use field::{FieldKind, FieldName, FieldNameError, FieldValue};
pub use validator::{AcceptAll, AsyncValidator, FnValidator, Merged, Validator};
pub use validity::InternalValidity;
pub use values::{FormValues, ValuesError};
