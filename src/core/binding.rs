//! Per-field bindings between the controller and UI components
//!
//! A component never writes to the controller directly. It asks its
//! [`FieldBinding`] to turn raw input into a [`FieldEvent`], and the owner
//! of the controller dispatches that event.

use crate::core::error::ValidationError;
use crate::core::field::{FieldName, FieldValue};

/// Raw input as a component emits it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// Typed or selected text
    Text(String),
    /// Checkbox state
    Checked(bool),
    /// Multi-selection
    Selected(Vec<String>),
}

impl From<&str> for RawInput {
    fn from(s: &str) -> Self {
        RawInput::Text(s.to_string())
    }
}

impl From<bool> for RawInput {
    fn from(b: bool) -> Self {
        RawInput::Checked(b)
    }
}

/// A stored value entered again as component input
impl From<FieldValue> for RawInput {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => RawInput::Text(s),
            FieldValue::Flag(b) => RawInput::Checked(b),
            FieldValue::List(items) => RawInput::Selected(items),
        }
    }
}

/// What a component wants written back after an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub value: FieldValue,
    /// Component-native validity, for components that check input themselves
    pub validity: Option<bool>,
}

impl FieldUpdate {
    pub fn value(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            validity: None,
        }
    }

    pub fn with_validity(value: impl Into<FieldValue>, valid: bool) -> Self {
        Self {
            value: value.into(),
            validity: Some(valid),
        }
    }
}

/// Converts raw component input into field updates
pub trait FieldAdapter {
    /// Handle an input event (every keystroke or selection)
    fn on_change(&self, raw: &RawInput) -> FieldUpdate;

    /// Handle a commit event (blur or confirm); defaults to a change
    fn on_commit(&self, raw: &RawInput) -> FieldUpdate {
        self.on_change(raw)
    }
}

/// Event to apply to a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    Changed { field: FieldName, update: FieldUpdate },
    Committed { field: FieldName, update: FieldUpdate },
}

impl FieldEvent {
    pub fn field(&self) -> &FieldName {
        match self {
            FieldEvent::Changed { field, .. } | FieldEvent::Committed { field, .. } => field,
        }
    }
}

/// Everything a component needs to render and report one field
pub struct FieldBinding<'a> {
    pub name: FieldName,
    pub current_value: FieldValue,
    pub error: Option<ValidationError>,
    pub touched: bool,
    adapter: &'a dyn FieldAdapter,
}

impl<'a> FieldBinding<'a> {
    pub(crate) fn new(
        name: FieldName,
        current_value: FieldValue,
        error: Option<ValidationError>,
        touched: bool,
        adapter: &'a dyn FieldAdapter,
    ) -> Self {
        Self {
            name,
            current_value,
            error,
            touched,
            adapter,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.error.as_ref().and_then(|e| e.message.as_deref())
    }

    pub fn on_change(&self, raw: impl Into<RawInput>) -> FieldEvent {
        FieldEvent::Changed {
            field: self.name.clone(),
            update: self.adapter.on_change(&raw.into()),
        }
    }

    pub fn on_commit(&self, raw: impl Into<RawInput>) -> FieldEvent {
        FieldEvent::Committed {
            field: self.name.clone(),
            update: self.adapter.on_commit(&raw.into()),
        }
    }
}

impl std::fmt::Debug for FieldBinding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("current_value", &self.current_value)
            .field("error", &self.error)
            .field("touched", &self.touched)
            .finish_non_exhaustive()
    }
}
