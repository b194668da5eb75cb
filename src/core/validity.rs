//! Out-of-band validity reported by field components

use std::collections::BTreeMap;

use crate::core::error::{FieldErrors, Validation, ValidationError};
use crate::core::field::FieldName;
use crate::core::validator::Validator;
use crate::core::values::FormValues;

/// Validity flags for fields whose component checks input the schema never sees
///
/// A field with no flag is considered valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternalValidity {
    flags: BTreeMap<FieldName, bool>,
}

impl InternalValidity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record validity for a field, replacing any earlier flag
    pub fn set(&mut self, field: FieldName, valid: bool) {
        self.flags.insert(field, valid);
    }

    /// Forget the flag for a field (on every change event)
    pub fn reset(&mut self, field: &FieldName) {
        self.flags.remove(field);
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }

    pub fn get(&self, field: &FieldName) -> Option<bool> {
        self.flags.get(field).copied()
    }

    /// Fields currently flagged invalid
    pub fn invalid_fields(&self) -> impl Iterator<Item = &FieldName> {
        self.flags
            .iter()
            .filter(|(_, valid)| !**valid)
            .map(|(field, _)| field)
    }

    pub fn all_valid(&self) -> bool {
        self.flags.values().all(|valid| *valid)
    }
}

impl Validator for InternalValidity {
    fn validate(&self, values: &FormValues) -> Validation {
        let errors: FieldErrors = self
            .invalid_fields()
            .map(|field| (field.clone(), ValidationError::internal(field.clone())))
            .collect();
        if errors.is_empty() {
            Ok(values.clone())
        } else {
            Err(errors)
        }
    }
}
