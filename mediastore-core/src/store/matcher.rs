//! Filter evaluation against document fields
//!
//! Dotted paths traverse nested objects and fan out through arrays, so
//! `versions.duration` yields the duration of every version. A field
//! condition holds when any resolved value (or any element of a resolved
//! array) satisfies it.

use super::filter::FilterExpr;
use crate::document::Value;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;

impl FilterExpr {
    /// Evaluate this filter against a document's fields
    pub fn matches(&self, fields: &BTreeMap<String, Value>) -> bool {
        match self {
            FilterExpr::Empty => true,

            FilterExpr::Eq { field, value } => {
                let resolved = resolve(fields, field);
                if value.is_null() && resolved.is_empty() {
                    return true;
                }
                any_leaf(&resolved, |v| v == value)
            }

            FilterExpr::Ne { field, value } => !FilterExpr::Eq {
                field: field.clone(),
                value: value.clone(),
            }
            .matches(fields),

            FilterExpr::Gt { field, value } => any_leaf(&resolve(fields, field), |v| {
                compare_values(v, value) == Some(CmpOrdering::Greater)
            }),

            FilterExpr::Gte { field, value } => any_leaf(&resolve(fields, field), |v| {
                matches!(
                    compare_values(v, value),
                    Some(CmpOrdering::Greater | CmpOrdering::Equal)
                )
            }),

            FilterExpr::Lt { field, value } => any_leaf(&resolve(fields, field), |v| {
                compare_values(v, value) == Some(CmpOrdering::Less)
            }),

            FilterExpr::Lte { field, value } => any_leaf(&resolve(fields, field), |v| {
                matches!(
                    compare_values(v, value),
                    Some(CmpOrdering::Less | CmpOrdering::Equal)
                )
            }),

            FilterExpr::In { field, values } => {
                let resolved = resolve(fields, field);
                any_leaf(&resolved, |v| values.iter().any(|candidate| in_matches(v, candidate)))
            }

            FilterExpr::Nin { field, values } => !FilterExpr::In {
                field: field.clone(),
                values: values.clone(),
            }
            .matches(fields),

            FilterExpr::Exists { field, exists } => !resolve(fields, field).is_empty() == *exists,

            FilterExpr::Regex { field, regex } => {
                any_leaf(&resolve(fields, field), |v| match v {
                    Value::String(s) => regex.is_match(s),
                    _ => false,
                })
            }

            FilterExpr::ElemMatch { field, filter } => {
                resolve(fields, field).into_iter().any(|v| match v {
                    Value::Array(elements) => elements.iter().any(|element| match element {
                        Value::Object(obj) => filter.matches(obj),
                        _ => false,
                    }),
                    _ => false,
                })
            }

            FilterExpr::And(filters) => filters.iter().all(|f| f.matches(fields)),

            FilterExpr::Or(filters) => filters.iter().any(|f| f.matches(fields)),
        }
    }
}

/// Resolve a dotted path to every value it reaches
pub fn resolve<'a>(fields: &'a BTreeMap<String, Value>, path: &str) -> Vec<&'a Value> {
    let mut parts = path.split('.');
    let mut current: Vec<&Value> = match parts.next() {
        Some(first) => fields.get(first).into_iter().collect(),
        None => return Vec::new(),
    };

    for part in parts {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(obj) => next.extend(obj.get(part)),
                Value::Array(elements) => {
                    if let Ok(index) = part.parse::<usize>() {
                        next.extend(elements.get(index));
                    }
                    for element in elements {
                        if let Value::Object(obj) = element {
                            next.extend(obj.get(part));
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }

    current
}

/// True if the predicate holds for any resolved value or any element of a
/// resolved array
fn any_leaf<F>(resolved: &[&Value], predicate: F) -> bool
where
    F: Fn(&Value) -> bool,
{
    resolved.iter().any(|value| {
        predicate(value)
            || matches!(value, Value::Array(elements) if elements.iter().any(&predicate))
    })
}

fn in_matches(value: &Value, candidate: &Value) -> bool {
    match (value, candidate) {
        (
            Value::String(s),
            Value::Regex {
                pattern,
                case_insensitive,
            },
        ) => {
            let source = if *case_insensitive {
                format!("(?i){}", pattern)
            } else {
                pattern.clone()
            };
            regex::Regex::new(&source)
                .map(|re| re.is_match(s))
                .unwrap_or(false)
        }
        _ => value == candidate || compare_values(value, candidate) == Some(CmpOrdering::Equal),
    }
}

/// Compare two values of compatible types. Mixed numeric types compare by
/// value; anything else incomparable yields None.
pub fn compare_values(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(CmpOrdering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),

        (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
        (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
        (Value::Int32(a), Value::Int64(b)) => Some((*a as i64).cmp(b)),
        (Value::Int64(a), Value::Int32(b)) => Some(a.cmp(&(*b as i64))),

        (a, b) if a.is_number() && b.is_number() => {
            let (a, b) = (a.as_f64()?, b.as_f64()?);
            a.partial_cmp(&b)
        }

        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{filter_from_json, Document};
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        Document::from_json(&json).unwrap()
    }

    fn matches(filter: serde_json::Value, document: &Document) -> bool {
        let filter = FilterExpr::parse(&filter_from_json(&filter).unwrap()).unwrap();
        filter.matches(&document.fields)
    }

    #[test]
    fn test_in_matches_array_elements() {
        let d = doc(json!({"genres": ["drama", "comedy"], "title": "Eastenders"}));
        assert!(matches(json!({"genres": {"$in": ["comedy"]}}), &d));
        assert!(!matches(json!({"genres": {"$in": ["news"]}}), &d));
        assert!(matches(json!({"title": {"$in": ["Eastenders", "Holby"]}}), &d));
    }

    #[test]
    fn test_ranges_across_integer_widths() {
        let d = doc(json!({"episodeNumber": 5}));
        assert!(matches(json!({"episodeNumber": {"$gt": 2}}), &d));
        assert!(matches(json!({"episodeNumber": {"$lt": 5_000_000_000i64}}), &d));
        assert!(!matches(json!({"episodeNumber": {"$lt": 5}}), &d));
        assert!(matches(json!({"episodeNumber": {"$lte": 5.0}}), &d));
        // mismatched types never satisfy a range
        assert!(!matches(json!({"episodeNumber": {"$gte": "a"}}), &d));
    }

    #[test]
    fn test_dates_compare() {
        let d = doc(json!({"transmissionTime": {"$date": 2_000}}));
        assert!(matches(json!({"transmissionTime": {"$gt": {"$date": 1_000}}}), &d));
        assert!(!matches(json!({"transmissionTime": {"$lt": {"$date": 1_000}}}), &d));
    }

    #[test]
    fn test_elem_match_requires_single_element() {
        let d = doc(json!({
            "versions": [
                {"duration": 1, "publishedDuration": 10},
                {"duration": 10, "publishedDuration": 1}
            ]
        }));

        // dotted paths may be satisfied by different elements
        assert!(matches(
            json!({"versions.duration": {"$in": [1]}, "versions.publishedDuration": {"$in": [1]}}),
            &d
        ));
        assert!(!matches(
            json!({"versions": {"$elemMatch": {"duration": {"$in": [1]}, "publishedDuration": {"$in": [1]}}}}),
            &d
        ));
        assert!(matches(
            json!({"versions": {"$elemMatch": {"duration": {"$in": [10]}, "publishedDuration": {"$in": [1]}}}}),
            &d
        ));
    }

    #[test]
    fn test_nested_elem_match() {
        let d = doc(json!({
            "versions": [{
                "manifestedAs": [{
                    "availableAt": [
                        {"available": false, "policy": {"availableCountries": ["GB"]}},
                        {"available": true, "policy": {"availableCountries": ["US"]}}
                    ]
                }]
            }]
        }));

        assert!(matches(
            json!({"versions": {"$elemMatch": {"manifestedAs.availableAt": {"$elemMatch": {
                "available": true,
                "policy.availableCountries": {"$in": ["US"]}
            }}}}}),
            &d
        ));
        assert!(!matches(
            json!({"versions": {"$elemMatch": {"manifestedAs.availableAt": {"$elemMatch": {
                "available": true,
                "policy.availableCountries": {"$in": ["GB"]}
            }}}}}),
            &d
        ));
    }

    #[test]
    fn test_regex_and_exists() {
        let d = doc(json!({"title": "EastEnders"}));
        assert!(matches(json!({"title": {"$regex": "^east", "$options": "i"}}), &d));
        assert!(!matches(json!({"title": {"$regex": "^east"}}), &d));
        assert!(matches(json!({"title": {"$exists": true}}), &d));
        assert!(matches(json!({"curie": {"$exists": false}}), &d));
        assert!(matches(json!({"curie": null}), &d));
    }

    #[test]
    fn test_or_and_nin() {
        let d = doc(json!({"publisher": "bbc.co.uk"}));
        assert!(matches(
            json!({"$or": [{"publisher": "c4.com"}, {"publisher": "bbc.co.uk"}]}),
            &d
        ));
        assert!(matches(json!({"publisher": {"$nin": ["c4.com"]}}), &d));
        assert!(matches(json!({"publisher": {"$ne": "c4.com"}}), &d));
    }
}
