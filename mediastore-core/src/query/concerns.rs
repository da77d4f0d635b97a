//! Decides whether a set of constraints concerns given entity kinds

use super::attribute::EntityKind;
use super::Constraint;

/// Versions and everything beneath them
pub const VERSION_OR_BELOW: &[EntityKind] = &[
    EntityKind::Version,
    EntityKind::Broadcast,
    EntityKind::Encoding,
    EntityKind::Location,
    EntityKind::Policy,
];

pub const BROADCAST: &[EntityKind] = &[EntityKind::Broadcast];

pub const ENCODING_OR_BELOW: &[EntityKind] = &[
    EntityKind::Encoding,
    EntityKind::Location,
    EntityKind::Policy,
];

pub const LOCATION_OR_BELOW: &[EntityKind] = &[EntityKind::Location, EntityKind::Policy];

/// Items and everything beneath them
pub const ITEM_OR_BELOW: &[EntityKind] = &[
    EntityKind::Item,
    EntityKind::Version,
    EntityKind::Broadcast,
    EntityKind::Encoding,
    EntityKind::Location,
    EntityKind::Policy,
];

/// True if any constraint targets one of `kinds` (or a subtype of one)
pub fn concerns<'a>(constraints: impl IntoIterator<Item = &'a Constraint>, kinds: &[EntityKind]) -> bool {
    constraints
        .into_iter()
        .any(|c| kinds.iter().any(|&kind| c.attribute.target.is_a(kind)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::attribute::*;

    #[test]
    fn test_concerns() {
        let duration = Constraint::equals(VERSION_DURATION, vec![10i64]).unwrap();
        let episode = Constraint::equals(EPISODE_NUMBER, vec![1i64]).unwrap();
        let title = Constraint::equals(TITLE, vec!["EastEnders"]).unwrap();

        assert!(concerns([&duration], VERSION_OR_BELOW));
        assert!(!concerns([&duration], ENCODING_OR_BELOW));
        // episodes are items
        assert!(concerns([&episode], ITEM_OR_BELOW));
        assert!(!concerns([&title], ITEM_OR_BELOW));
        assert!(!concerns(Vec::<&Constraint>::new(), ITEM_OR_BELOW));
    }
}
