//! Custom fields attached to devices, VMs, interfaces and services
//!
//! The inventory returns custom fields as a free-form JSON object. Each value is
//! classified once on decode; conversion to a concrete type happens later and
//! fails if the declared type and the stored value disagree.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Declared type of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomFieldType {
    /// Free text
    Text,
    /// Integer or decimal number
    Number,
    /// `true`/`false`
    Boolean,
    /// Lists, objects and anything else that has no label representation
    Unsupported,
}

impl fmt::Display for CustomFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CustomFieldType::Text => "text",
            CustomFieldType::Number => "number",
            CustomFieldType::Boolean => "boolean",
            CustomFieldType::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Custom field conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustomFieldError {
    /// Value can't be returned as the requested type
    #[error("custom field of type {declared} cannot be converted to {requested}")]
    CannotConvert {
        /// Type the field was declared with
        declared: CustomFieldType,
        /// Type the caller asked for
        requested: CustomFieldType,
    },
}

/// A single custom field value
#[derive(Debug, Clone, PartialEq)]
pub struct CustomField {
    /// Declared type
    pub datatype: CustomFieldType,
    /// Raw value as returned by the inventory
    pub value: Value,
}

impl CustomField {
    /// Create a custom field from an explicit type and value
    pub fn new(datatype: CustomFieldType, value: impl Into<Value>) -> Self {
        Self {
            datatype,
            value: value.into(),
        }
    }

    /// Create a text field
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(CustomFieldType::Text, value.into())
    }

    /// Create a number field
    pub fn number(value: f64) -> Self {
        Self::new(CustomFieldType::Number, value)
    }

    /// Create a boolean field
    pub fn boolean(value: bool) -> Self {
        Self::new(CustomFieldType::Boolean, value)
    }

    /// Classify a raw JSON value. Returns `None` for `null`, which carries no information.
    fn classify(value: Value) -> Option<Self> {
        let datatype = match &value {
            Value::Null => return None,
            Value::String(_) => CustomFieldType::Text,
            Value::Number(_) => CustomFieldType::Number,
            Value::Bool(_) => CustomFieldType::Boolean,
            Value::Array(_) | Value::Object(_) => CustomFieldType::Unsupported,
        };
        Some(Self { datatype, value })
    }

    fn mismatch(&self, requested: CustomFieldType) -> CustomFieldError {
        CustomFieldError::CannotConvert {
            declared: self.datatype,
            requested,
        }
    }

    /// Return the value as text
    ///
    /// # Errors
    /// Fails unless the field is a text field holding a string.
    pub fn as_text(&self) -> Result<&str, CustomFieldError> {
        match (self.datatype, &self.value) {
            (CustomFieldType::Text, Value::String(s)) => Ok(s),
            _ => Err(self.mismatch(CustomFieldType::Text)),
        }
    }

    /// Return the value as a number
    ///
    /// # Errors
    /// Fails unless the field is a number field holding a number.
    pub fn as_number(&self) -> Result<f64, CustomFieldError> {
        match (self.datatype, self.value.as_f64()) {
            (CustomFieldType::Number, Some(n)) => Ok(n),
            _ => Err(self.mismatch(CustomFieldType::Number)),
        }
    }

    /// Return the value as a boolean
    ///
    /// # Errors
    /// Fails unless the field is a boolean field holding a bool.
    pub fn as_bool(&self) -> Result<bool, CustomFieldError> {
        match (self.datatype, self.value.as_bool()) {
            (CustomFieldType::Boolean, Some(b)) => Ok(b),
            _ => Err(self.mismatch(CustomFieldType::Boolean)),
        }
    }
}

/// All custom fields of one inventory record, keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFieldMap {
    entries: HashMap<String, CustomField>,
}

impl CustomFieldMap {
    /// Create an empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CustomField> {
        self.entries.get(name)
    }

    /// Add or replace a field
    pub fn insert(&mut self, name: impl Into<String>, field: CustomField) {
        self.entries.insert(name.into(), field);
    }

    /// Iterate over all fields in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomField)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no fields
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CustomField)> for CustomFieldMap {
    fn from_iter<I: IntoIterator<Item = (K, CustomField)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<'de> Deserialize<'de> for CustomFieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<HashMap<String, Value>> = Option::deserialize(deserializer)?;

        let entries = raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(key, value)| CustomField::classify(value).map(|cf| (key, cf)))
            .collect();

        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty_and_null() {
        let map: CustomFieldMap = serde_json::from_str("{}").unwrap();
        assert!(map.is_empty());

        let map: CustomFieldMap = serde_json::from_str("null").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_decode_classifies_values() {
        let map: CustomFieldMap = serde_json::from_str(
            r#"{"no_dhcp": true, "someInt": 123, "some_text": "foobar", "unset": null, "choices": ["a", "b"]}"#,
        )
        .unwrap();

        assert_eq!(map.len(), 4);
        assert_eq!(map.get("no_dhcp"), Some(&CustomField::boolean(true)));
        assert_eq!(map.get("someInt").unwrap().datatype, CustomFieldType::Number);
        assert_eq!(map.get("some_text"), Some(&CustomField::text("foobar")));
        assert!(map.get("unset").is_none());
        assert_eq!(
            map.get("choices").unwrap().datatype,
            CustomFieldType::Unsupported
        );
    }

    #[test]
    fn test_conversion_honors_declared_type() {
        let cf = CustomField::boolean(true);

        assert!(cf.as_bool().unwrap());
        assert_eq!(
            cf.as_number(),
            Err(CustomFieldError::CannotConvert {
                declared: CustomFieldType::Boolean,
                requested: CustomFieldType::Number,
            })
        );
        assert!(cf.as_text().is_err());

        // declared text, stored number
        let cf = CustomField::new(CustomFieldType::Text, 12);
        assert!(cf.as_text().is_err());
    }
}
