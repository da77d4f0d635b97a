//! Builds content queries from request parameters
//!
//! Parameters look like `attribute[-operator]=value1,value2`, for example
//! `version.duration-greaterThan=600` or `location.available=true`. The
//! operator defaults to `equals`. `publishers`, `offset` and `limit` are
//! reserved for the publisher allow-list and result selection.

use super::attribute::{self, Attribute, ValueKind};
use super::constraint::{Constraint, ConstraintValues, ContentQuery, Operator};
use super::QueryError;
use crate::model::{EnumKey, MediaType, Publisher, TransportType};
use crate::store::Selection;
use chrono::{DateTime, Utc};

const PUBLISHERS: &str = "publishers";
const OFFSET: &str = "offset";
const LIMIT: &str = "limit";

/// Parses request parameters into a content query
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParamParser;

impl QueryParamParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse `name=value` strings
    pub fn parse_pairs<'a>(&self, params: impl IntoIterator<Item = &'a str>) -> Result<ContentQuery, QueryError> {
        let pairs: Result<Vec<(&str, &str)>, QueryError> = params
            .into_iter()
            .map(|param| {
                param
                    .split_once('=')
                    .ok_or_else(|| QueryError::InvalidParameter(param.to_string()))
            })
            .collect();
        self.parse(pairs?)
    }

    /// Parse already split parameters
    pub fn parse<'a>(&self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<ContentQuery, QueryError> {
        let mut constraints = Vec::new();
        let mut publishers = None;
        let mut selection = Selection::all();

        for (name, value) in params {
            match name {
                PUBLISHERS => publishers = Some(Self::parse_publishers(value)?),
                OFFSET => selection.offset = Self::parse_count(name, value)?,
                LIMIT => selection.limit = Some(Self::parse_count(name, value)?),
                _ => constraints.push(self.parse_constraint(name, value)?),
            }
        }

        let mut query = ContentQuery::new(constraints).with_selection(selection);
        if let Some(publishers) = publishers {
            query = query.with_publishers(publishers);
        }
        Ok(query)
    }

    /// Parse one constraint parameter
    pub fn parse_constraint(&self, name: &str, value: &str) -> Result<Constraint, QueryError> {
        let (attribute_name, operator) = match name.split_once('-') {
            Some((attribute_name, operator_name)) => (
                attribute_name,
                Operator::from_name(operator_name)
                    .ok_or_else(|| QueryError::UnknownOperator(operator_name.to_string()))?,
            ),
            None => (name, Operator::Equals),
        };

        let attribute = attribute::lookup(attribute_name)
            .ok_or_else(|| QueryError::UnknownAttribute(attribute_name.to_string()))?;

        let tokens: Vec<&str> = value.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return Err(QueryError::MissingValue(attribute.name));
        }

        Constraint::new(*attribute, operator, Self::parse_values(attribute, &tokens)?)
    }

    fn parse_values(attribute: &Attribute, tokens: &[&str]) -> Result<ConstraintValues, QueryError> {
        let invalid = |token: &str, reason: String| QueryError::InvalidValue {
            attribute: attribute.name,
            value: token.to_string(),
            reason,
        };

        let values = match attribute.value_kind {
            ValueKind::Integer => ConstraintValues::Integer(
                tokens
                    .iter()
                    .copied()
                    .map(|t| t.parse::<i64>().map_err(|e| invalid(t, e.to_string())))
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::String => {
                ConstraintValues::String(tokens.iter().map(|t| t.to_string()).collect())
            }
            ValueKind::Boolean => ConstraintValues::Boolean(
                tokens
                    .iter()
                    .copied()
                    .map(|t| t.parse::<bool>().map_err(|e| invalid(t, e.to_string())))
                    .collect::<Result<_, _>>()?,
            ),
            ValueKind::Enum => {
                for &token in tokens {
                    if !Self::is_enum_name(attribute, token) {
                        return Err(invalid(token, "not a known value".to_string()));
                    }
                }
                ConstraintValues::Enum(tokens.iter().map(|t| t.to_string()).collect())
            }
            ValueKind::DateTime => ConstraintValues::DateTime(
                tokens
                    .iter()
                    .copied()
                    .map(|t| {
                        DateTime::parse_from_rfc3339(t)
                            .map(|dt| dt.with_timezone(&Utc))
                            .map_err(|e| invalid(t, e.to_string()))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(values)
    }

    fn is_enum_name(attribute: &Attribute, token: &str) -> bool {
        match attribute.field {
            "transportType" => TransportType::from_key(token).is_some(),
            "mediaType" => MediaType::from_key(token).is_some(),
            _ => true,
        }
    }

    fn parse_publishers(value: &str) -> Result<Vec<Publisher>, QueryError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|key| {
                Publisher::from_key(key)
                    .ok_or_else(|| QueryError::InvalidParameter(format!("unknown publisher {}", key)))
            })
            .collect()
    }

    fn parse_count(name: &str, value: &str) -> Result<usize, QueryError> {
        value
            .trim()
            .parse()
            .map_err(|_| QueryError::InvalidParameter(format!("{}={}", name, value)))
    }
}
