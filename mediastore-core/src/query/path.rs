//! Where each entity kind lives inside a content document

use super::attribute::{Attribute, EntityKind};
use super::QueryError;

/// Field path from the document root to the entity owning an attribute
pub type EntityPath = &'static [&'static str];

const ROOT: EntityPath = &[];
const VERSIONS: EntityPath = &["versions"];
const BROADCASTS: EntityPath = &["versions", "broadcasts"];
const ENCODINGS: EntityPath = &["versions", "manifestedAs"];
const LOCATIONS: EntityPath = &["versions", "manifestedAs", "availableAt"];

/// Resolve the path of the entity an attribute belongs to
pub fn entity_path(attribute: &Attribute) -> Result<EntityPath, QueryError> {
    match attribute.target {
        EntityKind::Content
        | EntityKind::Item
        | EntityKind::Episode
        | EntityKind::Container
        | EntityKind::Brand
        | EntityKind::Series => Ok(ROOT),
        EntityKind::Version => Ok(VERSIONS),
        EntityKind::Broadcast => Ok(BROADCASTS),
        EntityKind::Encoding => Ok(ENCODINGS),
        EntityKind::Location | EntityKind::Policy => Ok(LOCATIONS),
        EntityKind::ContentGroup | EntityKind::Person => Err(QueryError::UnsupportedEntity {
            attribute: attribute.name,
            kind: attribute.target,
        }),
    }
}

/// Store field name for an attribute, relative to its entity
pub fn field_name(attribute: &Attribute) -> String {
    if attribute.target == EntityKind::Policy {
        return format!("policy.{}", attribute.field);
    }
    if attribute.collection && !attribute.field.ends_with('s') {
        return format!("{}s", attribute.field);
    }
    attribute.field.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::attribute::*;

    #[test]
    fn test_paths() {
        assert!(entity_path(&TITLE).unwrap().is_empty());
        assert!(entity_path(&BRAND_TITLE).unwrap().is_empty());
        assert_eq!(entity_path(&VERSION_DURATION).unwrap(), &["versions"]);
        assert_eq!(
            entity_path(&BROADCAST_ON).unwrap(),
            &["versions", "broadcasts"]
        );
        assert_eq!(
            entity_path(&POLICY_AVAILABLE_COUNTRIES).unwrap(),
            &["versions", "manifestedAs", "availableAt"]
        );
    }

    #[test]
    fn test_unmapped_entity() {
        assert!(matches!(
            entity_path(&PERSON_NAME),
            Err(QueryError::UnsupportedEntity {
                kind: EntityKind::Person,
                ..
            })
        ));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(field_name(&GENRE), "genres");
        assert_eq!(field_name(&TITLE), "title");
        assert_eq!(field_name(&BROADCAST_ON), "broadcastOn");
        assert_eq!(
            field_name(&POLICY_AVAILABLE_COUNTRIES),
            "policy.availableCountries"
        );
    }
}
