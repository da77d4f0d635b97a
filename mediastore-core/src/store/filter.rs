//! Filter expressions for the document store
//!
//! Parses Mongo-style filter documents (as produced by the query compiler)
//! into an expression tree the in-memory store can evaluate.

use crate::document::{FilterDocument, Value};
use regex::Regex;

/// Parsed filter expression
#[derive(Debug, Clone)]
pub enum FilterExpr {
    /// Matches every document
    Empty,
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    Gt { field: String, value: Value },
    Gte { field: String, value: Value },
    Lt { field: String, value: Value },
    Lte { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    Nin { field: String, values: Vec<Value> },
    Exists { field: String, exists: bool },
    Regex { field: String, regex: Regex },
    /// At least one element of the array at `field` satisfies `filter`
    ElemMatch { field: String, filter: Box<FilterExpr> },
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Parse a filter document
    pub fn parse(filter: &FilterDocument) -> Result<FilterExpr, FilterError> {
        if filter.is_empty() {
            return Ok(FilterExpr::Empty);
        }

        let mut filters = Vec::with_capacity(filter.len());

        for (key, value) in filter {
            if key.starts_with('$') {
                let sub_filters = match key.as_str() {
                    "$and" | "$or" => Self::parse_clauses(key, value)?,
                    _ => return Err(FilterError::UnsupportedOperator(key.clone())),
                };
                filters.push(if key == "$and" {
                    FilterExpr::And(sub_filters)
                } else {
                    FilterExpr::Or(sub_filters)
                });
            } else {
                filters.push(Self::parse_field_condition(key, value)?);
            }
        }

        Ok(Self::conjunction(filters))
    }

    fn parse_clauses(operator: &str, value: &Value) -> Result<Vec<FilterExpr>, FilterError> {
        let clauses = value
            .as_array()
            .ok_or_else(|| FilterError::InvalidFormat(format!("{} must be an array", operator)))?;

        clauses
            .iter()
            .map(|clause| match clause {
                Value::Object(obj) => Self::parse(obj),
                _ => Err(FilterError::InvalidFormat(format!(
                    "{} clauses must be objects",
                    operator
                ))),
            })
            .collect()
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<FilterExpr, FilterError> {
        let operators = match value {
            Value::Object(obj) if !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')) => obj,
            Value::Regex {
                pattern,
                case_insensitive,
            } => return Self::regex(field, pattern, *case_insensitive),
            _ => {
                return Ok(FilterExpr::Eq {
                    field: field.to_string(),
                    value: value.clone(),
                })
            }
        };

        let mut filters = Vec::with_capacity(operators.len());

        for (op, operand) in operators {
            let filter = match op.as_str() {
                "$eq" => FilterExpr::Eq {
                    field: field.to_string(),
                    value: operand.clone(),
                },
                "$ne" => FilterExpr::Ne {
                    field: field.to_string(),
                    value: operand.clone(),
                },
                "$gt" => FilterExpr::Gt {
                    field: field.to_string(),
                    value: operand.clone(),
                },
                "$gte" => FilterExpr::Gte {
                    field: field.to_string(),
                    value: operand.clone(),
                },
                "$lt" => FilterExpr::Lt {
                    field: field.to_string(),
                    value: operand.clone(),
                },
                "$lte" => FilterExpr::Lte {
                    field: field.to_string(),
                    value: operand.clone(),
                },
                "$in" => FilterExpr::In {
                    field: field.to_string(),
                    values: Self::operand_array(op, operand)?,
                },
                "$nin" => FilterExpr::Nin {
                    field: field.to_string(),
                    values: Self::operand_array(op, operand)?,
                },
                "$exists" => {
                    let exists = operand.as_bool().ok_or_else(|| {
                        FilterError::InvalidFormat("$exists must be a boolean".to_string())
                    })?;
                    FilterExpr::Exists {
                        field: field.to_string(),
                        exists,
                    }
                }
                "$regex" => {
                    let options_ci = operators
                        .get("$options")
                        .and_then(|o| o.as_str())
                        .map(|o| o.contains('i'))
                        .unwrap_or(false);
                    match operand {
                        Value::String(pattern) => Self::regex(field, pattern, options_ci)?,
                        Value::Regex {
                            pattern,
                            case_insensitive,
                        } => Self::regex(field, pattern, *case_insensitive || options_ci)?,
                        _ => {
                            return Err(FilterError::InvalidFormat(
                                "$regex must be a string".to_string(),
                            ))
                        }
                    }
                }
                // consumed by $regex
                "$options" => continue,
                "$elemMatch" => {
                    let sub_filter = operand.as_object().ok_or_else(|| {
                        FilterError::InvalidFormat("$elemMatch must be an object".to_string())
                    })?;
                    FilterExpr::ElemMatch {
                        field: field.to_string(),
                        filter: Box::new(Self::parse(sub_filter)?),
                    }
                }
                _ => return Err(FilterError::UnsupportedOperator(op.clone())),
            };
            filters.push(filter);
        }

        Ok(Self::conjunction(filters))
    }

    fn operand_array(op: &str, operand: &Value) -> Result<Vec<Value>, FilterError> {
        operand
            .as_array()
            .cloned()
            .ok_or_else(|| FilterError::InvalidFormat(format!("{} must be an array", op)))
    }

    fn regex(field: &str, pattern: &str, case_insensitive: bool) -> Result<FilterExpr, FilterError> {
        let source = if case_insensitive {
            format!("(?i){}", pattern)
        } else {
            pattern.to_string()
        };
        let regex = Regex::new(&source).map_err(|e| FilterError::InvalidRegex(e.to_string()))?;
        Ok(FilterExpr::Regex {
            field: field.to_string(),
            regex,
        })
    }

    fn conjunction(mut filters: Vec<FilterExpr>) -> FilterExpr {
        match filters.len() {
            0 => FilterExpr::Empty,
            1 => filters.remove(0),
            _ => FilterExpr::And(filters),
        }
    }
}

/// Filter parsing errors
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid filter format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),
}
