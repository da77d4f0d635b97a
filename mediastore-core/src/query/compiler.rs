//! Compiles content queries into store filters
//!
//! Constraints are grouped by the path of the entity they address. Groups on
//! the root path become top-level conditions. Every other group becomes an
//! `$elemMatch` nested inside the nearest group registered on a prefix of
//! its path, so conditions on one version (or broadcast, encoding, location)
//! must all hold for the same array element.

use super::constraint::{ConstraintValues, ContentQuery, Operator};
use super::path::{entity_path, field_name, EntityPath};
use super::{Constraint, QueryError};
use crate::document::{filter_to_json, FilterDocument, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// A group of conditions registered at a non-root path
struct FilterNode {
    path: EntityPath,
    /// Index of the enclosing node, None for the root filter
    parent: Option<usize>,
    /// Path segments between the parent and this node, joined with `.`
    key: String,
    filter: FilterDocument,
}

/// Stateless query compiler
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCompiler;

impl QueryCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile a query into a filter document
    pub fn compile(&self, query: &ContentQuery) -> Result<FilterDocument, QueryError> {
        if query.is_matches_nothing() {
            return Err(QueryError::MatchesNothing);
        }

        let groups = Self::group_by_path(query.constraints())?;

        let mut root = FilterDocument::new();
        let mut nodes: Vec<FilterNode> = Vec::new();

        // shorter paths first, so every ancestor is registered before its descendants
        for (path, conditions) in groups.into_values() {
            if path.is_empty() {
                for (field, condition) in conditions {
                    merge_into(&mut root, field, condition);
                }
                continue;
            }

            let parent = nodes
                .iter()
                .enumerate()
                .filter(|(_, node)| path.starts_with(node.path))
                .max_by_key(|(_, node)| node.path.len())
                .map(|(index, _)| index);
            let prefix_len = parent.map(|index| nodes[index].path.len()).unwrap_or(0);

            let mut filter = FilterDocument::new();
            for (field, condition) in conditions {
                merge_into(&mut filter, field, condition);
            }

            nodes.push(FilterNode {
                path,
                parent,
                key: path[prefix_len..].join("."),
                filter,
            });
        }

        // children always follow their parent, so folding in reverse embeds
        // each node before its parent is embedded in turn
        for index in (0..nodes.len()).rev() {
            let filter = std::mem::take(&mut nodes[index].filter);
            let key = std::mem::take(&mut nodes[index].key);
            let elem_match = elem_match(filter);
            match nodes[index].parent {
                Some(parent) => merge_into(&mut nodes[parent].filter, key, elem_match),
                None => merge_into(&mut root, key, elem_match),
            }
        }

        debug!(query = %query, filter = %filter_to_json(&root), "Compiled content query");
        Ok(root)
    }

    /// Group conditions by entity path, ordered by path length then by the
    /// concatenated segments
    #[allow(clippy::type_complexity)]
    fn group_by_path(
        constraints: &[Constraint],
    ) -> Result<BTreeMap<(usize, String), (EntityPath, Vec<(String, Value)>)>, QueryError> {
        let mut groups: BTreeMap<(usize, String), (EntityPath, Vec<(String, Value)>)> = BTreeMap::new();

        for constraint in constraints {
            let path = entity_path(&constraint.attribute)?;
            let Some(condition) = Self::condition(constraint)? else {
                continue;
            };
            groups
                .entry((path.len(), path.concat()))
                .or_insert_with(|| (path, Vec::new()))
                .1
                .push((field_name(&constraint.attribute), condition));
        }

        Ok(groups)
    }

    /// Store condition for one constraint, None if it places no restriction
    pub fn condition(constraint: &Constraint) -> Result<Option<Value>, QueryError> {
        let name = constraint.attribute.name;
        let unsupported = || QueryError::UnsupportedOperator {
            attribute: name,
            operator: constraint.operator,
            kind: constraint.values.kind(),
        };

        let condition = match (&constraint.values, constraint.operator) {
            (ConstraintValues::Integer(values), Operator::Equals) => operator(
                "$in",
                Value::Array(non_empty(name, values)?.iter().map(|v| Value::Int64(*v)).collect()),
            ),
            (ConstraintValues::Integer(values), Operator::LessThan) => {
                operator("$lt", Value::Int64(*values.iter().max().ok_or(QueryError::MissingValue(name))?))
            }
            (ConstraintValues::Integer(values), Operator::GreaterThan) => {
                operator("$gt", Value::Int64(*values.iter().min().ok_or(QueryError::MissingValue(name))?))
            }

            (ConstraintValues::String(values), Operator::Equals) => operator(
                "$in",
                Value::Array(non_empty(name, values)?.iter().map(|v| Value::from(v.as_str())).collect()),
            ),
            // only the first value takes part in a prefix match
            (ConstraintValues::String(values), Operator::Beginning) => {
                let first = values.first().ok_or(QueryError::MissingValue(name))?;
                Value::Regex {
                    pattern: format!("^{}", regex::escape(first)),
                    case_insensitive: true,
                }
            }

            (ConstraintValues::Boolean(_), Operator::Equals) if constraint.is_unconditionally_true() => {
                return Ok(None)
            }
            (ConstraintValues::Boolean(values), Operator::Equals) => {
                Value::Bool(*values.first().ok_or(QueryError::MissingValue(name))?)
            }

            (ConstraintValues::Enum(values), Operator::Equals) => operator(
                "$in",
                Value::Array(
                    non_empty(name, values)?
                        .iter()
                        .map(|v| Value::String(v.to_lowercase()))
                        .collect(),
                ),
            ),

            (ConstraintValues::DateTime(values), Operator::Before) => {
                operator("$lt", Value::DateTime(*values.iter().max().ok_or(QueryError::MissingValue(name))?))
            }
            (ConstraintValues::DateTime(values), Operator::After) => {
                operator("$gt", Value::DateTime(*values.iter().min().ok_or(QueryError::MissingValue(name))?))
            }

            _ => return Err(unsupported()),
        };

        Ok(Some(condition))
    }
}

fn non_empty<'a, T>(name: &'static str, values: &'a [T]) -> Result<&'a [T], QueryError> {
    if values.is_empty() {
        Err(QueryError::MissingValue(name))
    } else {
        Ok(values)
    }
}

fn operator(op: &str, operand: Value) -> Value {
    let mut map = BTreeMap::new();
    map.insert(op.to_string(), operand);
    Value::Object(map)
}

fn elem_match(filter: FilterDocument) -> Value {
    operator("$elemMatch", Value::Object(filter))
}

/// Put a condition, merging operator objects already present on the field.
/// Later operands win per operator; a non-object condition replaces.
fn merge_into(filter: &mut FilterDocument, field: String, condition: Value) {
    match (filter.get_mut(&field), condition) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            existing.extend(incoming);
        }
        (_, condition) => {
            filter.insert(field, condition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::filter_to_json;
    use crate::query::attribute::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn compile(constraints: Vec<Constraint>) -> serde_json::Value {
        let filter = QueryCompiler::new()
            .compile(&ContentQuery::new(constraints))
            .unwrap();
        filter_to_json(&filter)
    }

    #[test]
    fn test_root_conditions() {
        let filter = compile(vec![
            Constraint::equals(TITLE, vec!["EastEnders"]).unwrap(),
            Constraint::equals(GENRE, vec!["drama", "soap"]).unwrap(),
            Constraint::equals(MEDIA_TYPE, vec!["VIDEO"]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({
                "title": {"$in": ["EastEnders"]},
                "genres": {"$in": ["drama", "soap"]},
                "mediaType": {"$in": ["video"]}
            })
        );
    }

    #[test]
    fn test_range_bounds_use_extremes() {
        let filter = compile(vec![
            Constraint::greater_than(VERSION_DURATION, vec![5i64, 10, 2]).unwrap(),
            Constraint::less_than(VERSION_PUBLISHED_DURATION, vec![5i64, 10, 2]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({"versions": {"$elemMatch": {
                "duration": {"$gt": 2},
                "publishedDuration": {"$lt": 10}
            }}})
        );
    }

    #[test]
    fn test_same_field_conditions_merge() {
        let filter = compile(vec![
            Constraint::greater_than(VERSION_DURATION, vec![5i64]).unwrap(),
            Constraint::less_than(VERSION_DURATION, vec![50i64]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({"versions": {"$elemMatch": {"duration": {"$gt": 5, "$lt": 50}}}})
        );
    }

    #[test]
    fn test_broadcast_nests_inside_version() {
        let filter = compile(vec![
            Constraint::equals(BROADCAST_ON, vec!["http://www.bbc.co.uk/services/bbcone"]).unwrap(),
            Constraint::equals(VERSION_DURATION, vec![1800i64]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({"versions": {"$elemMatch": {
                "duration": {"$in": [1800]},
                "broadcasts": {"$elemMatch": {
                    "broadcastOn": {"$in": ["http://www.bbc.co.uk/services/bbcone"]}
                }}
            }}})
        );
    }

    #[test]
    fn test_location_without_version_uses_dotted_key() {
        let filter = compile(vec![
            Constraint::equals(LOCATION_AVAILABLE, vec![true]).unwrap(),
            Constraint::equals(POLICY_AVAILABLE_COUNTRIES, vec!["GB"]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({"versions.manifestedAs.availableAt": {"$elemMatch": {
                "available": true,
                "policy.availableCountries": {"$in": ["GB"]}
            }}})
        );
    }

    #[test]
    fn test_location_beneath_encoding() {
        let filter = compile(vec![
            Constraint::equals(LOCATION_TRANSPORT_TYPE, vec!["Link"]).unwrap(),
            Constraint::equals(ENCODING_DATA_CONTAINER_FORMAT, vec!["video/mp4"]).unwrap(),
            Constraint::equals(ITEM_IS_LONG_FORM, vec![true]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({
                "isLongForm": true,
                "versions.manifestedAs": {"$elemMatch": {
                    "dataContainerFormat": {"$in": ["video/mp4"]},
                    "availableAt": {"$elemMatch": {"transportType": {"$in": ["link"]}}}
                }}
            })
        );
    }

    #[test]
    fn test_unconditionally_true_contributes_nothing() {
        let filter = compile(vec![
            Constraint::equals(LOCATION_AVAILABLE, vec![true, false]).unwrap(),
        ]);
        assert_eq!(filter, json!({}));
    }

    #[test]
    fn test_beginning_uses_first_value() {
        let filter = compile(vec![
            Constraint::beginning(TITLE, vec!["East.", "Holby"]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({"title": {"$regex": "^East\\.", "$options": "i"}})
        );
    }

    #[test]
    fn test_date_bounds() {
        let early = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2010, 6, 1, 0, 0, 0).unwrap();
        let filter = compile(vec![
            Constraint::after(BROADCAST_TRANSMISSION_TIME, vec![late, early]).unwrap(),
            Constraint::before(BROADCAST_TRANSMISSION_END_TIME, vec![early, late]).unwrap(),
        ]);
        assert_eq!(
            filter,
            json!({"versions.broadcasts": {"$elemMatch": {
                "transmissionTime": {"$gt": {"$date": early.timestamp_millis()}},
                "transmissionEndTime": {"$lt": {"$date": late.timestamp_millis()}}
            }}})
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        let compiler = QueryCompiler::new();
        let compile_one = |c: Constraint| compiler.compile(&ContentQuery::new(vec![c]));

        assert!(matches!(
            compile_one(Constraint::search(TITLE, vec!["east"]).unwrap()),
            Err(QueryError::UnsupportedOperator { operator: Operator::Search, .. })
        ));
        let when = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            compile_one(Constraint::equals(BROADCAST_TRANSMISSION_TIME, vec![when]).unwrap()),
            Err(QueryError::UnsupportedOperator { .. })
        ));
        assert!(matches!(
            compile_one(Constraint::before(VERSION_DURATION, vec![1i64]).unwrap()),
            Err(QueryError::UnsupportedOperator { .. })
        ));
        assert!(matches!(
            compile_one(Constraint::equals(PERSON_NAME, vec!["Dot Cotton"]).unwrap()),
            Err(QueryError::UnsupportedEntity { .. })
        ));
        assert!(matches!(
            compile_one(Constraint::less_than(VERSION_DURATION, Vec::<i64>::new()).unwrap()),
            Err(QueryError::MissingValue("version.duration"))
        ));
        assert!(matches!(
            compiler.compile(&ContentQuery::matches_nothing()),
            Err(QueryError::MatchesNothing)
        ));
    }
}
