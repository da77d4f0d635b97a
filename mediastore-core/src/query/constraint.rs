//! Constraints and content queries

use super::attribute::{Attribute, ValueKind};
use super::QueryError;
use crate::model::{EnumKey, Publisher};
use crate::store::Selection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Comparison applied by a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equals,
    LessThan,
    GreaterThan,
    Before,
    After,
    Beginning,
    Search,
}

impl Operator {
    pub const ALL: &'static [Operator] = &[
        Operator::Equals,
        Operator::LessThan,
        Operator::GreaterThan,
        Operator::Before,
        Operator::After,
        Operator::Beginning,
        Operator::Search,
    ];

    /// Name used in query parameters
    pub fn name(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::LessThan => "lessThan",
            Operator::GreaterThan => "greaterThan",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::Beginning => "beginning",
            Operator::Search => "search",
        }
    }

    pub fn from_name(name: &str) -> Option<Operator> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed constraint operands
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintValues {
    Integer(Vec<i64>),
    String(Vec<String>),
    Boolean(Vec<bool>),
    /// Enum variant names
    Enum(Vec<String>),
    DateTime(Vec<DateTime<Utc>>),
}

impl ConstraintValues {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConstraintValues::Integer(_) => ValueKind::Integer,
            ConstraintValues::String(_) => ValueKind::String,
            ConstraintValues::Boolean(_) => ValueKind::Boolean,
            ConstraintValues::Enum(_) => ValueKind::Enum,
            ConstraintValues::DateTime(_) => ValueKind::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ConstraintValues::Integer(v) => v.len(),
            ConstraintValues::String(v) | ConstraintValues::Enum(v) => v.len(),
            ConstraintValues::Boolean(v) => v.len(),
            ConstraintValues::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<i64>> for ConstraintValues {
    fn from(values: Vec<i64>) -> Self {
        ConstraintValues::Integer(values)
    }
}

impl From<Vec<String>> for ConstraintValues {
    fn from(values: Vec<String>) -> Self {
        ConstraintValues::String(values)
    }
}

impl From<Vec<&str>> for ConstraintValues {
    fn from(values: Vec<&str>) -> Self {
        ConstraintValues::String(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<bool>> for ConstraintValues {
    fn from(values: Vec<bool>) -> Self {
        ConstraintValues::Boolean(values)
    }
}

impl From<Vec<DateTime<Utc>>> for ConstraintValues {
    fn from(values: Vec<DateTime<Utc>>) -> Self {
        ConstraintValues::DateTime(values)
    }
}

/// Whether a constraint may reject top-level results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strength {
    #[default]
    Hard,
    /// Only narrows nested collections
    Soft,
}

/// A single attribute constraint
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub attribute: Attribute,
    pub operator: Operator,
    pub values: ConstraintValues,
    pub strength: Strength,
}

impl Constraint {
    /// Create a hard constraint. String operands given for an enum attribute
    /// are taken as variant names.
    pub fn new(
        attribute: Attribute,
        operator: Operator,
        values: impl Into<ConstraintValues>,
    ) -> Result<Self, QueryError> {
        let values = match (values.into(), attribute.value_kind) {
            (ConstraintValues::String(names), ValueKind::Enum) => ConstraintValues::Enum(names),
            (values, _) => values,
        };

        if values.kind() != attribute.value_kind {
            return Err(QueryError::ValueKindMismatch {
                attribute: attribute.name,
                expected: attribute.value_kind,
                found: values.kind(),
            });
        }

        Ok(Self {
            attribute,
            operator,
            values,
            strength: Strength::Hard,
        })
    }

    pub fn equals(attribute: Attribute, values: impl Into<ConstraintValues>) -> Result<Self, QueryError> {
        Self::new(attribute, Operator::Equals, values)
    }

    pub fn less_than(attribute: Attribute, values: impl Into<ConstraintValues>) -> Result<Self, QueryError> {
        Self::new(attribute, Operator::LessThan, values)
    }

    pub fn greater_than(attribute: Attribute, values: impl Into<ConstraintValues>) -> Result<Self, QueryError> {
        Self::new(attribute, Operator::GreaterThan, values)
    }

    pub fn before(attribute: Attribute, values: impl Into<ConstraintValues>) -> Result<Self, QueryError> {
        Self::new(attribute, Operator::Before, values)
    }

    pub fn after(attribute: Attribute, values: impl Into<ConstraintValues>) -> Result<Self, QueryError> {
        Self::new(attribute, Operator::After, values)
    }

    pub fn beginning(attribute: Attribute, values: impl Into<ConstraintValues>) -> Result<Self, QueryError> {
        Self::new(attribute, Operator::Beginning, values)
    }

    pub fn search(attribute: Attribute, values: impl Into<ConstraintValues>) -> Result<Self, QueryError> {
        Self::new(attribute, Operator::Search, values)
    }

    /// Mark as soft
    pub fn soft(mut self) -> Self {
        self.strength = Strength::Soft;
        self
    }

    pub fn is_soft(&self) -> bool {
        self.strength == Strength::Soft
    }

    /// A boolean equality listing both `true` and `false` holds for anything
    pub fn is_unconditionally_true(&self) -> bool {
        match (&self.values, self.operator) {
            (ConstraintValues::Boolean(values), Operator::Equals) => {
                values.contains(&true) && values.contains(&false)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.attribute.name, self.operator)?;
        if self.is_soft() {
            f.write_str("(soft)")?;
        }
        Ok(())
    }
}

/// A conjunction of constraints plus result scoping
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentQuery {
    constraints: Vec<Constraint>,
    /// None allows every publisher
    publishers: Option<BTreeSet<Publisher>>,
    selection: Selection,
    matches_nothing: bool,
}

impl ContentQuery {
    pub fn new(constraints: Vec<Constraint>) -> Self {
        Self {
            constraints,
            ..Default::default()
        }
    }

    /// A query that can never match
    pub fn matches_nothing() -> Self {
        Self {
            matches_nothing: true,
            ..Default::default()
        }
    }

    pub fn is_matches_nothing(&self) -> bool {
        self.matches_nothing
    }

    /// Restrict results to the given publishers
    pub fn with_publishers(mut self, publishers: impl IntoIterator<Item = Publisher>) -> Self {
        self.publishers = Some(publishers.into_iter().collect());
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn hard_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| !c.is_soft())
    }

    pub fn soft_constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.is_soft())
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn publishers(&self) -> Option<&BTreeSet<Publisher>> {
        self.publishers.as_ref()
    }

    /// Content without a publisher is never allowed
    pub fn allows_publisher(&self, publisher: Option<Publisher>) -> bool {
        match (publisher, &self.publishers) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(publisher), Some(allowed)) => allowed.contains(&publisher),
        }
    }
}

impl fmt::Display for ContentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matches_nothing {
            return f.write_str("MATCHES_NOTHING");
        }
        let constraints: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", constraints.join(", "))?;
        if let Some(publishers) = &self.publishers {
            let keys: Vec<&str> = publishers.iter().map(|p| p.key()).collect();
            write!(f, " publishers={}", keys.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::attribute::*;

    #[test]
    fn test_value_kind_is_checked() {
        assert!(Constraint::equals(VERSION_DURATION, vec![10i64]).is_ok());
        assert!(matches!(
            Constraint::equals(VERSION_DURATION, vec!["ten"]),
            Err(QueryError::ValueKindMismatch { .. })
        ));
    }

    #[test]
    fn test_strings_become_enum_names() {
        let c = Constraint::equals(LOCATION_TRANSPORT_TYPE, vec!["LINK"]).unwrap();
        assert_eq!(c.values, ConstraintValues::Enum(vec!["LINK".to_string()]));
    }

    #[test]
    fn test_unconditionally_true() {
        let both = Constraint::equals(LOCATION_AVAILABLE, vec![true, false]).unwrap();
        assert!(both.is_unconditionally_true());
        let one = Constraint::equals(LOCATION_AVAILABLE, vec![true]).unwrap();
        assert!(!one.is_unconditionally_true());
    }

    #[test]
    fn test_publisher_gate() {
        let all = ContentQuery::new(vec![]);
        assert!(all.allows_publisher(Some(Publisher::Bbc)));
        assert!(!all.allows_publisher(None));

        let bbc_only = ContentQuery::new(vec![]).with_publishers([Publisher::Bbc]);
        assert!(bbc_only.allows_publisher(Some(Publisher::Bbc)));
        assert!(!bbc_only.allows_publisher(Some(Publisher::C4)));
    }

    #[test]
    fn test_hard_soft_split_and_display() {
        let query = ContentQuery::new(vec![
            Constraint::equals(VERSION_DURATION, vec![10i64]).unwrap(),
            Constraint::equals(LOCATION_AVAILABLE, vec![true]).unwrap().soft(),
        ]);
        assert_eq!(query.hard_constraints().count(), 1);
        assert_eq!(query.soft_constraints().count(), 1);
        assert_eq!(
            query.to_string(),
            "[version.duration-equals, location.available-equals(soft)]"
        );
        assert_eq!(ContentQuery::matches_nothing().to_string(), "MATCHES_NOTHING");
    }
}
