//! Document and Value types for the media store
//!
//! This module provides the data structures shared by the store, the codecs
//! and the query compiler:
//! - Document: an ordered field map with a generated identifier
//! - Value: JSON types plus DateTime and Regex
//! - FilterDocument: the map form of a compiled store filter
//! - Conversion to and from extended JSON (`$date`, `$regex`)

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Maximum document size in bytes (16 MB)
pub const MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Maximum nesting depth for documents
pub const MAX_NESTING_DEPTH: usize = 32;

/// A compiled filter: field names (possibly dotted) to conditions
pub type FilterDocument = BTreeMap<String, Value>;

/// Unique identifier for stored documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new random document ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive a stable ID from a key, e.g. a canonical uri
    pub fn from_key(key: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()))
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value type supporting JSON types plus DateTime and Regex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object with string keys
    Object(BTreeMap<String, Value>),
    /// DateTime with UTC timezone
    DateTime(DateTime<Utc>),
    /// Regular expression, only meaningful inside filters
    Regex {
        pattern: String,
        case_insensitive: bool,
    },
}

impl Value {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is a number (int or float)
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int32(_) | Value::Int64(_) | Value::Float64(_))
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(*i as i64),
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(i) => Some(*i as f64),
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get as datetime
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Get as array reference
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get as object reference
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get as mutable object reference
    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Calculate the size of this value in bytes (approximate)
    pub fn size_bytes(&self) -> usize {
        match self {
            Value::Null | Value::Bool(_) => 1,
            Value::Int32(_) => 4,
            Value::Int64(_) | Value::Float64(_) | Value::DateTime(_) => 8,
            Value::String(s) => s.len(),
            Value::Regex { pattern, .. } => pattern.len() + 1,
            Value::Array(arr) => arr.iter().map(|v| v.size_bytes()).sum::<usize>() + 8,
            Value::Object(obj) => {
                obj.iter()
                    .map(|(k, v)| k.len() + v.size_bytes())
                    .sum::<usize>()
                    + 8
            }
        }
    }

    /// Get the nesting depth of this value
    pub fn nesting_depth(&self) -> usize {
        match self {
            Value::Array(arr) => 1 + arr.iter().map(|v| v.nesting_depth()).max().unwrap_or(0),
            Value::Object(obj) => 1 + obj.values().map(|v| v.nesting_depth()).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Render as extended JSON. Dates become `{"$date": millis}` and
    /// regexes `{"$regex": pattern, "$options": "i"}`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int32(i) => JsonValue::from(*i),
            Value::Int64(i) => JsonValue::from(*i),
            Value::Float64(f) => JsonValue::from(*f),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(arr) => JsonValue::Array(arr.iter().map(Value::to_json).collect()),
            Value::Object(obj) => JsonValue::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::DateTime(dt) => {
                let mut map = JsonMap::new();
                map.insert("$date".to_string(), JsonValue::from(dt.timestamp_millis()));
                JsonValue::Object(map)
            }
            Value::Regex {
                pattern,
                case_insensitive,
            } => {
                let mut map = JsonMap::new();
                map.insert("$regex".to_string(), JsonValue::String(pattern.clone()));
                if *case_insensitive {
                    map.insert("$options".to_string(), JsonValue::String("i".to_string()));
                }
                JsonValue::Object(map)
            }
        }
    }

    /// Parse extended JSON into a Value
    pub fn from_json(json: &JsonValue) -> Result<Value, DocumentError> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
                        Ok(Value::Int32(i as i32))
                    } else {
                        Ok(Value::Int64(i))
                    }
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float64(f))
                } else {
                    Err(DocumentError::DeserializationError(format!(
                        "Invalid number: {}",
                        n
                    )))
                }
            }
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            JsonValue::Array(arr) => {
                let values: Result<Vec<_>, _> = arr.iter().map(Value::from_json).collect();
                Ok(Value::Array(values?))
            }
            JsonValue::Object(obj) => {
                if let Some(date) = obj.get("$date") {
                    return Self::date_from_json(date).map(Value::DateTime);
                }
                if let Some(pattern) = obj.get("$regex").and_then(|p| p.as_str()) {
                    let case_insensitive = obj
                        .get("$options")
                        .and_then(|o| o.as_str())
                        .map(|o| o.contains('i'))
                        .unwrap_or(false);
                    return Ok(Value::Regex {
                        pattern: pattern.to_string(),
                        case_insensitive,
                    });
                }
                let mut map = BTreeMap::new();
                for (k, v) in obj {
                    map.insert(k.clone(), Value::from_json(v)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn date_from_json(date: &JsonValue) -> Result<DateTime<Utc>, DocumentError> {
        match date {
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .ok_or_else(|| DocumentError::DeserializationError(format!("Invalid $date: {}", n))),
            JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DocumentError::DeserializationError(format!("Invalid $date {}: {}", s, e))),
            other => Err(DocumentError::DeserializationError(format!(
                "Invalid $date: {}",
                other
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(obj: BTreeMap<String, Value>) -> Self {
        Value::Object(obj)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

/// Render a filter document as extended JSON
pub fn filter_to_json(filter: &FilterDocument) -> JsonValue {
    JsonValue::Object(
        filter
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Parse a filter document from extended JSON
pub fn filter_from_json(json: &JsonValue) -> Result<FilterDocument, DocumentError> {
    match Value::from_json(json)? {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::DeserializationError(
            "Filter must be an object".to_string(),
        )),
    }
}

/// Stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier
    #[serde(rename = "_id")]
    pub id: DocumentId,

    /// Document fields stored in a BTreeMap for ordered iteration
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create a new document with a random ID
    pub fn new() -> Self {
        Self::with_id(DocumentId::new())
    }

    /// Create a document with a specific ID
    pub fn with_id(id: DocumentId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Create a document from fields
    pub fn from_fields(fields: BTreeMap<String, Value>) -> Self {
        Self {
            id: DocumentId::new(),
            fields,
        }
    }

    /// Insert a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Insert a field only when a value is present
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.fields.insert(key.to_string(), value.into());
        }
    }

    /// Get a field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Check if a field exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Get field by path (e.g., "policy.availableCountries")
    pub fn get_by_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;

        for part in parts {
            match current {
                Value::Object(obj) => {
                    current = obj.get(part)?;
                }
                Value::Array(arr) => {
                    let index = part.parse::<usize>().ok()?;
                    current = arr.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// Set field by path, creating intermediate objects
    pub fn set_by_path(&mut self, path: &str, value: Value) -> Result<(), DocumentError> {
        let parts: Vec<&str> = path.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(DocumentError::InvalidPath(path.to_string()));
        }

        let (field_name, parent_path) = match parts.split_last() {
            Some(split) => split,
            None => return Err(DocumentError::InvalidPath(path.to_string())),
        };

        if parent_path.is_empty() {
            self.fields.insert(field_name.to_string(), value);
            return Ok(());
        }

        let mut current = self
            .fields
            .entry(parent_path[0].to_string())
            .or_insert_with(|| Value::Object(BTreeMap::new()));

        for &part in &parent_path[1..] {
            match current {
                Value::Object(obj) => {
                    current = obj
                        .entry(part.to_string())
                        .or_insert_with(|| Value::Object(BTreeMap::new()));
                }
                _ => return Err(DocumentError::InvalidPath(path.to_string())),
            }
        }

        match current {
            Value::Object(obj) => {
                obj.insert(field_name.to_string(), value);
                Ok(())
            }
            _ => Err(DocumentError::InvalidPath(path.to_string())),
        }
    }

    /// Get document size in bytes
    pub fn size_bytes(&self) -> usize {
        self.fields
            .iter()
            .map(|(k, v)| k.len() + v.size_bytes())
            .sum()
    }

    /// Validate document constraints
    pub fn validate(&self) -> Result<(), DocumentError> {
        let size = self.size_bytes();
        if size > MAX_DOCUMENT_SIZE {
            return Err(DocumentError::DocumentTooLarge {
                size,
                max: MAX_DOCUMENT_SIZE,
            });
        }

        let max_depth = self
            .fields
            .values()
            .map(|v| v.nesting_depth())
            .max()
            .unwrap_or(0);

        if max_depth > MAX_NESTING_DEPTH {
            return Err(DocumentError::NestingTooDeep {
                depth: max_depth,
                max: MAX_NESTING_DEPTH,
            });
        }

        Ok(())
    }

    /// Render the fields as extended JSON (the id is not included)
    pub fn to_json(&self) -> JsonValue {
        filter_to_json(&self.fields)
    }

    /// Parse fields from extended JSON, assigning a fresh ID
    pub fn from_json(json: &JsonValue) -> Result<Self, DocumentError> {
        filter_from_json(json).map(Self::from_fields)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document-related errors
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Document too large: {size} bytes (max: {max})")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("Nesting too deep: {depth} levels (max: {max})")]
    NestingTooDeep { depth: usize, max: usize },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_id_from_key_is_stable() {
        let a = DocumentId::from_key("http://example.com/a");
        let b = DocumentId::from_key("http://example.com/a");
        assert_eq!(a, b);
        assert_ne!(a, DocumentId::from_key("http://example.com/b"));
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn test_value_conversions() {
        let v: Value = true.into();
        assert_eq!(v.as_bool(), Some(true));

        let v: Value = 42i32.into();
        assert_eq!(v.as_i64(), Some(42));
        assert_eq!(v.as_f64(), Some(42.0));

        let v: Value = "test".into();
        assert_eq!(v.as_str(), Some("test"));
    }

    #[test]
    fn test_document_path_navigation() {
        let mut doc = Document::new();
        doc.set_by_path("policy.availableCountries", Value::Array(vec!["GB".into()]))
            .unwrap();
        doc.set_by_path("policy.revenue", "free".into()).unwrap();

        assert_eq!(
            doc.get_by_path("policy.revenue").unwrap().as_str(),
            Some("free")
        );
        assert_eq!(
            doc.get_by_path("policy.availableCountries.0").unwrap().as_str(),
            Some("GB")
        );
        assert!(doc.get_by_path("policy.missing").is_none());
        assert!(doc.set_by_path("policy..x", Value::Null).is_err());
    }

    #[test]
    fn test_set_by_path_through_scalar_fails() {
        let mut doc = Document::new();
        doc.insert("title", "Eastenders");
        assert!(matches!(
            doc.set_by_path("title.first", Value::Null),
            Err(DocumentError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_extended_json_dates_and_regexes() {
        let when = Utc.timestamp_millis_opt(1_000).single().unwrap();
        let filter: FilterDocument = [
            ("transmissionTime".to_string(), Value::DateTime(when)),
            (
                "title".to_string(),
                Value::Regex {
                    pattern: "^east".to_string(),
                    case_insensitive: true,
                },
            ),
        ]
        .into_iter()
        .collect();

        let json = filter_to_json(&filter);
        assert_eq!(
            json,
            json!({
                "transmissionTime": {"$date": 1000},
                "title": {"$regex": "^east", "$options": "i"}
            })
        );
        assert_eq!(filter_from_json(&json).unwrap(), filter);
    }

    #[test]
    fn test_from_json_number_widths() {
        assert_eq!(Value::from_json(&json!(7)).unwrap(), Value::Int32(7));
        assert_eq!(
            Value::from_json(&json!(5_000_000_000i64)).unwrap(),
            Value::Int64(5_000_000_000)
        );
        assert_eq!(Value::from_json(&json!(1.5)).unwrap(), Value::Float64(1.5));
        assert!(Value::from_json(&json!({"$date": true})).is_err());
    }

    #[test]
    fn test_document_validation() {
        let mut doc = Document::new();
        assert!(doc.validate().is_ok());

        let mut deep = Value::Null;
        for _ in 0..=MAX_NESTING_DEPTH {
            deep = Value::Array(vec![deep]);
        }
        doc.insert("deep", deep);
        assert!(matches!(
            doc.validate(),
            Err(DocumentError::NestingTooDeep { .. })
        ));
    }
}
