//! Field value maps

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::field::{FieldName, FieldNameError, FieldValue};

/// Mapping from field name to value for one form session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<FieldName, FieldValue>);

/// Error converting external data into form values
#[derive(Debug, Error)]
pub enum ValuesError {
    #[error("expected an object of field values")]
    NotAnObject,

    #[error(transparent)]
    BadName(#[from] FieldNameError),

    #[error("field '{field}' has an unsupported value (expected string, boolean or list of strings)")]
    BadValue { field: String },
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &FieldName) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Look up a value by its raw name
    pub fn get_str(&self, field: &str) -> Option<&FieldValue> {
        field.parse::<FieldName>().ok().and_then(|f| self.0.get(&f))
    }

    pub fn insert(&mut self, field: FieldName, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(field, value)
    }

    pub fn contains(&self, field: &FieldName) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &FieldName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldValue)> {
        self.0.iter()
    }

    pub(crate) fn get_mut(&mut self, field: &FieldName) -> Option<&mut FieldValue> {
        self.0.get_mut(field)
    }

    /// Render the values as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect(),
        )
    }

    /// Build values from a JSON object
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ValuesError> {
        let obj = value.as_object().ok_or(ValuesError::NotAnObject)?;
        let mut values = FormValues::new();
        for (key, raw) in obj {
            let name: FieldName = key.parse()?;
            let value = FieldValue::from_json(raw)
                .ok_or_else(|| ValuesError::BadValue { field: key.clone() })?;
            values.insert(name, value);
        }
        Ok(values)
    }
}

impl FromIterator<(FieldName, FieldValue)> for FormValues {
    fn from_iter<T: IntoIterator<Item = (FieldName, FieldValue)>>(iter: T) -> Self {
        FormValues(iter.into_iter().collect())
    }
}

impl IntoIterator for FormValues {
    type Item = (FieldName, FieldValue);
    type IntoIter = std::collections::btree_map::IntoIter<FieldName, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormValues {
    type Item = (&'a FieldName, &'a FieldValue);
    type IntoIter = std::collections::btree_map::Iter<'a, FieldName, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> FieldName {
        s.parse().unwrap()
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({
            "email": "a@b.com",
            "terms": true,
            "payment": ["PayPal"]
        });
        let values = FormValues::from_json(&json).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values.get(&name("terms")), Some(&FieldValue::Flag(true)));
        assert_eq!(values.to_json(), json);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            FormValues::from_json(&serde_json::json!("nope")),
            Err(ValuesError::NotAnObject)
        ));
        assert!(matches!(
            FormValues::from_json(&serde_json::json!({"Bad Name": "x"})),
            Err(ValuesError::BadName(_))
        ));
        assert!(matches!(
            FormValues::from_json(&serde_json::json!({"age": 3})),
            Err(ValuesError::BadValue { .. })
        ));
    }

    #[test]
    fn test_get_str() {
        let values: FormValues = [(name("country"), FieldValue::text("Germany"))]
            .into_iter()
            .collect();
        assert_eq!(values.get_str("country"), Some(&FieldValue::text("Germany")));
        assert_eq!(values.get_str("Country"), None);
    }
}
