//! Translation between domain entities and store documents
//!
//! Every entity encodes to an ordered field map using the store's camelCase
//! field names. These names are the ones the query compiler addresses, so
//! the two must stay in step.

pub mod content;
pub mod version;

pub use content::*;

use crate::document::Value;
use crate::model::EnumKey;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Encoded entity fields
pub type Fields = BTreeMap<String, Value>;

/// Two-way translation for a single entity type
pub trait DocumentCodec: Sized {
    /// Encode into document fields
    fn encode(&self) -> Fields;

    /// Decode from document fields
    fn decode(fields: &Fields) -> Result<Self, CodecError>;
}

/// Builds a field map, skipping absent values
#[derive(Debug, Default)]
pub(crate) struct FieldWriter {
    fields: Fields,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn put_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.put(key, value);
        }
        self
    }

    pub fn put_enum<E: EnumKey>(&mut self, key: &str, value: Option<E>) -> &mut Self {
        self.put_opt(key, value.map(|v| v.key()))
    }

    pub fn put_set(&mut self, key: &str, values: &BTreeSet<String>) -> &mut Self {
        if !values.is_empty() {
            let values: Vec<Value> = values.iter().map(|v| Value::from(v.as_str())).collect();
            self.put(key, values);
        }
        self
    }

    pub fn put_list<T: DocumentCodec>(&mut self, key: &str, entities: &[T]) -> &mut Self {
        if !entities.is_empty() {
            let values: Vec<Value> = entities.iter().map(|e| Value::Object(e.encode())).collect();
            self.put(key, values);
        }
        self
    }

    pub fn put_entity<T: DocumentCodec>(&mut self, key: &str, entity: Option<&T>) -> &mut Self {
        if let Some(entity) = entity {
            self.put(key, Value::Object(entity.encode()));
        }
        self
    }

    pub fn finish(&mut self) -> Fields {
        std::mem::take(&mut self.fields)
    }
}

/// Typed access to the fields of one entity
pub(crate) struct FieldReader<'a> {
    fields: &'a Fields,
    entity: &'static str,
}

impl<'a> FieldReader<'a> {
    pub fn new(fields: &'a Fields, entity: &'static str) -> Self {
        Self { fields, entity }
    }

    fn present(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> CodecError {
        CodecError::WrongType {
            entity: self.entity,
            field: key.to_string(),
            expected,
        }
    }

    fn missing(&self, key: &str) -> CodecError {
        CodecError::MissingField {
            entity: self.entity,
            field: key.to_string(),
        }
    }

    pub fn string(&self, key: &str) -> Result<Option<String>, CodecError> {
        self.present(key)
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.wrong_type(key, "string"))
            })
            .transpose()
    }

    pub fn required_string(&self, key: &str) -> Result<String, CodecError> {
        self.string(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>, CodecError> {
        self.present(key)
            .map(|v| v.as_i64().ok_or_else(|| self.wrong_type(key, "integer")))
            .transpose()
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, CodecError> {
        self.present(key)
            .map(|v| v.as_bool().ok_or_else(|| self.wrong_type(key, "boolean")))
            .transpose()
    }

    pub fn datetime(&self, key: &str) -> Result<Option<DateTime<Utc>>, CodecError> {
        self.present(key)
            .map(|v| v.as_datetime().ok_or_else(|| self.wrong_type(key, "datetime")))
            .transpose()
    }

    pub fn required_datetime(&self, key: &str) -> Result<DateTime<Utc>, CodecError> {
        self.datetime(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn enum_key<E: EnumKey>(&self, key: &str) -> Result<Option<E>, CodecError> {
        match self.string(key)? {
            Some(stored) => E::from_key(&stored)
                .map(Some)
                .ok_or(CodecError::UnknownEnumKey {
                    field: key.to_string(),
                    key: stored,
                }),
            None => Ok(None),
        }
    }

    pub fn string_set(&self, key: &str) -> Result<BTreeSet<String>, CodecError> {
        self.array(key)?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.wrong_type(key, "array of strings"))
            })
            .collect()
    }

    pub fn list<T: DocumentCodec>(&self, key: &str) -> Result<Vec<T>, CodecError> {
        self.array(key)?
            .iter()
            .map(|v| match v {
                Value::Object(obj) => T::decode(obj),
                _ => Err(self.wrong_type(key, "array of objects")),
            })
            .collect()
    }

    pub fn entity<T: DocumentCodec>(&self, key: &str) -> Result<Option<T>, CodecError> {
        self.present(key)
            .map(|v| match v {
                Value::Object(obj) => T::decode(obj),
                _ => Err(self.wrong_type(key, "object")),
            })
            .transpose()
    }

    fn array(&self, key: &str) -> Result<&'a [Value], CodecError> {
        match self.present(key) {
            Some(Value::Array(values)) => Ok(values),
            Some(_) => Err(self.wrong_type(key, "array")),
            None => Ok(&[]),
        }
    }
}

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Missing field {field} on {entity}")]
    MissingField { entity: &'static str, field: String },

    #[error("Field {field} on {entity} is not a {expected}")]
    WrongType {
        entity: &'static str,
        field: String,
        expected: &'static str,
    },

    #[error("Unknown value {key} for {field}")]
    UnknownEnumKey { field: String, key: String },

    #[error("Unrecognised content type: {0}")]
    UnknownContentType(String),
}
