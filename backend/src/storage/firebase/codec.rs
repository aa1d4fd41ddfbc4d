//! Conversion between the document model and Firestore's REST JSON encoding.
//!
//! Firestore wraps every value in a single-key object naming its type, e.g.
//! `{"stringValue": "Mimosa"}` or `{"integerValue": "42"}` (64-bit integers
//! travel as strings).

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde_json::{json, Map, Value};

use crate::storage::document::{Document, FieldValue, Fields};

pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Boolean(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
    }
}

/// Decode one typed value. Types the document model has no counterpart for
/// (arrays, maps, references, geo points, bytes) decode to `None`.
pub fn decode_value(value: &Value) -> Result<Option<FieldValue>> {
    let object = value
        .as_object()
        .ok_or_else(|| anyhow!("Firestore value is not an object: {}", value))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| anyhow!("Firestore value has no type tag"))?;

    let decoded = match kind.as_str() {
        "nullValue" => FieldValue::Null,
        "booleanValue" => FieldValue::Boolean(
            inner.as_bool().ok_or_else(|| anyhow!("bad booleanValue: {}", inner))?,
        ),
        "integerValue" => FieldValue::Integer(match inner {
            Value::String(s) => s.parse().with_context(|| format!("bad integerValue: {}", s))?,
            Value::Number(n) => n.as_i64().ok_or_else(|| anyhow!("bad integerValue: {}", n))?,
            other => bail!("bad integerValue: {}", other),
        }),
        "doubleValue" => FieldValue::Double(match inner {
            Value::Number(n) => n.as_f64().ok_or_else(|| anyhow!("bad doubleValue: {}", n))?,
            // NaN and the infinities are sent as strings
            Value::String(s) => s.parse().with_context(|| format!("bad doubleValue: {}", s))?,
            other => bail!("bad doubleValue: {}", other),
        }),
        "stringValue" => FieldValue::String(
            inner
                .as_str()
                .ok_or_else(|| anyhow!("bad stringValue: {}", inner))?
                .to_string(),
        ),
        "timestampValue" => {
            let raw = inner
                .as_str()
                .ok_or_else(|| anyhow!("bad timestampValue: {}", inner))?;
            FieldValue::Timestamp(
                DateTime::parse_from_rfc3339(raw)
                    .with_context(|| format!("bad timestampValue: {}", raw))?
                    .with_timezone(&Utc),
            )
        }
        "arrayValue" | "mapValue" | "referenceValue" | "geoPointValue" | "bytesValue" => {
            return Ok(None);
        }
        other => bail!("unknown Firestore value type '{}'", other),
    };
    Ok(Some(decoded))
}

pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    Value::Object(encoded)
}

/// Decode a Firestore `Document` resource into the document model.
/// The id is the last segment of the resource name.
pub fn decode_document(resource: &Value) -> Result<Document> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Firestore document has no name"))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("Firestore document name has no id: {}", name))?;

    let mut fields = Fields::new();
    if let Some(raw_fields) = resource.get("fields").and_then(Value::as_object) {
        for (field, value) in raw_fields {
            match decode_value(value).with_context(|| format!("field '{}' of {}", field, name))? {
                Some(decoded) => {
                    fields.insert(field.clone(), decoded);
                }
                None => debug!("Ignoring field '{}' of {}: unsupported value type", field, name),
            }
        }
    }

    Ok(Document::new(id, fields))
}
