//! # Document Model
//!
//! The minimal value model shared by every document store implementation:
//! typed field values, write instructions (plain values or the store's
//! server-time primitive), documents and equality filters.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A single stored field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// What to write into one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Value(FieldValue),
    /// Resolved by the store to its own clock at commit time
    ServerTimestamp,
}

impl From<FieldValue> for FieldWrite {
    fn from(value: FieldValue) -> Self {
        FieldWrite::Value(value)
    }
}

impl From<&str> for FieldWrite {
    fn from(value: &str) -> Self {
        FieldWrite::Value(value.into())
    }
}

impl From<String> for FieldWrite {
    fn from(value: String) -> Self {
        FieldWrite::Value(value.into())
    }
}

impl From<f64> for FieldWrite {
    fn from(value: f64) -> Self {
        FieldWrite::Value(value.into())
    }
}

pub type Fields = BTreeMap<String, FieldValue>;
pub type FieldWrites = BTreeMap<String, FieldWrite>;

/// A document as returned by a query
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    fn field(&self, name: &str) -> Result<&FieldValue> {
        self.fields
            .get(name)
            .ok_or_else(|| anyhow!("document {} has no field '{}'", self.id, name))
    }

    /// Read a field as text. Numbers are accepted and rendered as written.
    pub fn text(&self, name: &str) -> Result<String> {
        match self.field(name)? {
            FieldValue::String(s) => Ok(s.clone()),
            FieldValue::Integer(i) => Ok(i.to_string()),
            FieldValue::Double(d) => Ok(d.to_string()),
            other => Err(anyhow!(
                "field '{}' of document {} is not text: {:?}",
                name,
                self.id,
                other
            )),
        }
    }

    /// Read a field as a number. Numeric strings are accepted.
    pub fn number(&self, name: &str) -> Result<f64> {
        match self.field(name)? {
            FieldValue::Double(d) => Ok(*d),
            FieldValue::Integer(i) => Ok(*i as f64),
            FieldValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| anyhow!("field '{}' of document {} is not a number: {}", name, self.id, e)),
            other => Err(anyhow!(
                "field '{}' of document {} is not a number: {:?}",
                name,
                self.id,
                other
            )),
        }
    }

    pub fn timestamp(&self, name: &str) -> Result<DateTime<Utc>> {
        match self.field(name)? {
            FieldValue::Timestamp(t) => Ok(*t),
            FieldValue::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| anyhow!("field '{}' of document {} is not a timestamp: {}", name, self.id, e)),
            other => Err(anyhow!(
                "field '{}' of document {} is not a timestamp: {:?}",
                name,
                self.id,
                other
            )),
        }
    }
}

/// `field == value`, the only filter the app needs
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityFilter {
    pub field: String,
    pub value: FieldValue,
}

impl EqualityFilter {
    pub fn new(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, FieldValue)]) -> Document {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Document::new("doc1", fields)
    }

    #[test]
    fn test_text_accepts_numbers() {
        let d = doc(&[("peso", FieldValue::Integer(500)), ("nome", "Scale A".into())]);
        assert_eq!(d.text("peso").unwrap(), "500");
        assert_eq!(d.text("nome").unwrap(), "Scale A");
        assert!(d.text("missing").is_err());
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        let d = doc(&[("pesoLeite", "12.5".into()), ("other", FieldValue::Boolean(true))]);
        assert_eq!(d.number("pesoLeite").unwrap(), 12.5);
        assert!(d.number("other").is_err());
    }

    #[test]
    fn test_timestamp_accepts_rfc3339() {
        let d = doc(&[("data", "2024-05-01T10:00:00Z".into())]);
        let t = d.timestamp("data").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_equality_filter() {
        let filter = EqualityFilter::new("userId", "u1");
        let mut fields = Fields::new();
        fields.insert("userId".to_string(), "u1".into());
        assert!(filter.matches(&fields));
        fields.insert("userId".to_string(), "u2".into());
        assert!(!filter.matches(&fields));
        fields.remove("userId");
        assert!(!filter.matches(&fields));
    }
}
