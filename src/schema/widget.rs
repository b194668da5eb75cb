//! Widgets: how raw component input becomes field values
//!
//! Plain inputs only ever produce values. Widgets that can tell on their own
//! that input is unusable (a date that does not parse, a choice that is not
//! offered) also report internal validity with each update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::binding::{FieldAdapter, FieldUpdate, RawInput};
use crate::core::config::parse_bool;
use crate::core::field::{FieldKind, FieldValue};

/// Canonical format dates are stored in
pub const ISO_DATE: &str = "%Y-%m-%d";

fn default_date_format() -> String {
    ISO_DATE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    Text,
    Email,
    Password,
    Select {
        options: Vec<String>,
    },
    Date {
        /// chrono format accepted from the user, besides ISO dates
        #[serde(default = "default_date_format")]
        format: String,
    },
    MultiSelect {
        options: Vec<String>,
    },
    Checkbox,
}

impl Widget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Widget::Text => "text",
            Widget::Email => "email",
            Widget::Password => "password",
            Widget::Select { .. } => "select",
            Widget::Date { .. } => "date",
            Widget::MultiSelect { .. } => "multi_select",
            Widget::Checkbox => "checkbox",
        }
    }

    /// Shape of the values this widget produces
    pub fn kind(&self) -> FieldKind {
        match self {
            Widget::MultiSelect { .. } => FieldKind::List,
            Widget::Checkbox => FieldKind::Flag,
            _ => FieldKind::Text,
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            Widget::Select { options } | Widget::MultiSelect { options } => Some(options),
            _ => None,
        }
    }

    /// Hide the value when echoing it back
    pub fn is_secret(&self) -> bool {
        matches!(self, Widget::Password)
    }

    /// Value used when a field declares no default
    pub fn default_value(&self) -> FieldValue {
        match self {
            Widget::Select { options } => {
                FieldValue::Text(options.first().cloned().unwrap_or_default())
            }
            Widget::MultiSelect { .. } => FieldValue::List(Vec::new()),
            Widget::Checkbox => FieldValue::Flag(false),
            _ => FieldValue::Text(String::new()),
        }
    }
}

fn raw_text(raw: &RawInput) -> String {
    match raw {
        RawInput::Text(s) => s.clone(),
        RawInput::Checked(b) => b.to_string(),
        RawInput::Selected(items) => items.join(", "),
    }
}

/// Parse user date input: the widget's format first, then ISO
fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, format)
        .or_else(|_| NaiveDate::parse_from_str(raw, ISO_DATE))
        .ok()
}

impl FieldAdapter for Widget {
    fn on_change(&self, raw: &RawInput) -> FieldUpdate {
        match self {
            Widget::Text | Widget::Email | Widget::Password => FieldUpdate::value(raw_text(raw)),

            Widget::Select { options } => {
                let text = raw_text(raw);
                let valid = options.iter().any(|o| *o == text);
                FieldUpdate::with_validity(text, valid)
            }

            Widget::Date { format } => {
                let text = raw_text(raw);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return FieldUpdate::with_validity(String::new(), true);
                }
                match parse_date(trimmed, format) {
                    Some(date) => FieldUpdate::with_validity(date.format(ISO_DATE).to_string(), true),
                    // Keep what was typed so the user can fix it
                    None => FieldUpdate::with_validity(text, false),
                }
            }

            Widget::MultiSelect { options } => {
                let items: Vec<String> = match raw {
                    RawInput::Selected(items) => items.clone(),
                    RawInput::Text(s) => s
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                    RawInput::Checked(_) => Vec::new(),
                };
                let valid = items.iter().all(|item| options.contains(item));
                FieldUpdate::with_validity(items, valid)
            }

            Widget::Checkbox => match raw {
                RawInput::Checked(b) => FieldUpdate::value(*b),
                RawInput::Text(s) => match parse_bool(s) {
                    Some(b) => FieldUpdate::value(b),
                    None => FieldUpdate::with_validity(false, false),
                },
                RawInput::Selected(_) => FieldUpdate::with_validity(false, false),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> Widget {
        Widget::Date {
            format: "%d.%m.%Y".to_string(),
        }
    }

    #[test]
    fn test_text_widgets_never_report_validity() {
        let update = Widget::Email.on_change(&RawInput::from("not-an-email"));
        assert_eq!(update, FieldUpdate::value("not-an-email"));
    }

    #[test]
    fn test_date_normalizes_to_iso() {
        let update = date().on_change(&RawInput::from("31.01.2000"));
        assert_eq!(update, FieldUpdate::with_validity("2000-01-31", true));
        let update = date().on_change(&RawInput::from("2000-01-31"));
        assert_eq!(update, FieldUpdate::with_validity("2000-01-31", true));
    }

    #[test]
    fn test_date_malformed_is_internally_invalid() {
        let update = date().on_change(&RawInput::from("31.13.2000"));
        assert_eq!(update.validity, Some(false));
        assert_eq!(update.value, FieldValue::text("31.13.2000"));
    }

    #[test]
    fn test_date_empty_is_valid() {
        let update = date().on_change(&RawInput::from("   "));
        assert_eq!(update, FieldUpdate::with_validity("", true));
    }

    #[test]
    fn test_select_flags_unknown_option() {
        let select = Widget::Select {
            options: vec!["Germany".into(), "France".into()],
        };
        assert_eq!(select.on_change(&RawInput::from("France")).validity, Some(true));
        assert_eq!(select.on_change(&RawInput::from("Spain")).validity, Some(false));
    }

    #[test]
    fn test_multi_select_from_text_and_selection() {
        let multi = Widget::MultiSelect {
            options: vec!["Credit card".into(), "PayPal".into()],
        };
        let update = multi.on_change(&RawInput::from("PayPal, Credit card"));
        assert_eq!(
            update,
            FieldUpdate::with_validity(vec!["PayPal".to_string(), "Credit card".to_string()], true)
        );
        let update = multi.on_change(&RawInput::Selected(vec!["Cash".into()]));
        assert_eq!(update.validity, Some(false));
        let update = multi.on_change(&RawInput::from(""));
        assert_eq!(update, FieldUpdate::with_validity(Vec::<String>::new(), true));
    }

    #[test]
    fn test_checkbox_input() {
        assert_eq!(
            Widget::Checkbox.on_change(&RawInput::Checked(true)),
            FieldUpdate::value(true)
        );
        assert_eq!(
            Widget::Checkbox.on_change(&RawInput::from("yes")),
            FieldUpdate::value(true)
        );
        assert_eq!(
            Widget::Checkbox.on_change(&RawInput::from("sure")),
            FieldUpdate::with_validity(false, false)
        );
    }

    #[test]
    fn test_default_values() {
        assert_eq!(Widget::Text.default_value(), FieldValue::text(""));
        assert_eq!(Widget::Checkbox.default_value(), FieldValue::Flag(false));
        let select = Widget::Select {
            options: vec!["Germany".into()],
        };
        assert_eq!(select.default_value(), FieldValue::text("Germany"));
    }
}
