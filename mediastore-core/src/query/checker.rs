//! Evaluates constraints against a single decoded entity
//!
//! Only constraints addressed to the entity's kind are checked. A missing
//! attribute value fails the constraint; several constraint values are
//! alternatives; a collection-valued attribute passes if any element does.

use super::attribute::{Attribute, EntityKind};
use super::constraint::{ConstraintValues, Operator};
use super::Constraint;
use crate::model::{
    Broadcast, Container, ContainerKind, Content, ContentGroup, Described, EnumKey, Encoding, Item,
    ItemKind, Location, Policy, Version,
};
use chrono::{DateTime, Utc};

/// Attribute value read from an entity
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Integer(i64),
    String(String),
    Boolean(bool),
    /// Stored enum key
    Enum(&'static str),
    DateTime(DateTime<Utc>),
    Many(Vec<AttributeValue>),
}

impl AttributeValue {
    fn strings<'a>(values: impl IntoIterator<Item = &'a String>) -> Self {
        AttributeValue::Many(values.into_iter().cloned().map(AttributeValue::String).collect())
    }
}

/// An entity constraints can be checked against
pub trait Queryable {
    fn entity_kind(&self) -> EntityKind;

    /// Value of an attribute, None when absent
    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue>;
}

/// Whether `entity` satisfies every constraint addressed to it
pub fn satisfies<'a, Q>(entity: &Q, constraints: impl IntoIterator<Item = &'a Constraint>) -> bool
where
    Q: Queryable + ?Sized,
{
    let kind = entity.entity_kind();
    constraints
        .into_iter()
        .filter(|c| kind.answers_for(c.attribute.target))
        .all(|c| check(entity, c))
}

fn check<Q: Queryable + ?Sized>(entity: &Q, constraint: &Constraint) -> bool {
    match entity.attribute_value(&constraint.attribute) {
        None => false,
        Some(AttributeValue::Many(values)) => values.iter().any(|v| value_matches(v, constraint)),
        Some(value) => value_matches(&value, constraint),
    }
}

fn value_matches(value: &AttributeValue, constraint: &Constraint) -> bool {
    use AttributeValue as A;
    use ConstraintValues as C;

    match (&constraint.values, constraint.operator, value) {
        (_, Operator::Search, _) => true,

        (C::Integer(expected), Operator::Equals, A::Integer(actual)) => expected.contains(actual),
        (C::Integer(bounds), Operator::LessThan, A::Integer(actual)) => bounds.iter().any(|b| actual < b),
        (C::Integer(bounds), Operator::GreaterThan, A::Integer(actual)) => bounds.iter().any(|b| actual > b),

        (C::String(expected), Operator::Equals, A::String(actual)) => expected.contains(actual),
        (C::String(prefixes), Operator::Beginning, A::String(actual)) => {
            let actual = actual.to_lowercase();
            prefixes.iter().any(|p| actual.starts_with(&p.to_lowercase()))
        }

        (C::Boolean(expected), Operator::Equals, A::Boolean(actual)) => expected.contains(actual),

        (C::Enum(names), Operator::Equals, A::Enum(key)) => {
            names.iter().any(|name| name.eq_ignore_ascii_case(key))
        }

        (C::DateTime(expected), Operator::Equals, A::DateTime(actual)) => expected.contains(actual),
        (C::DateTime(bounds), Operator::Before, A::DateTime(actual)) => bounds.iter().any(|b| actual < b),
        (C::DateTime(bounds), Operator::After, A::DateTime(actual)) => bounds.iter().any(|b| actual > b),

        _ => false,
    }
}

fn described_value(described: &Described, attribute: &Attribute) -> Option<AttributeValue> {
    match attribute.field {
        "title" => described.title.clone().map(AttributeValue::String),
        "description" => described.description.clone().map(AttributeValue::String),
        "canonicalUri" => Some(AttributeValue::String(described.canonical_uri.clone())),
        "curie" => described.curie.clone().map(AttributeValue::String),
        "publisher" => described.publisher.map(|p| AttributeValue::String(p.key().to_string())),
        "genre" => Some(AttributeValue::strings(&described.genres)),
        "tag" => Some(AttributeValue::strings(&described.tags)),
        "mediaType" => described.media_type.map(|m| AttributeValue::Enum(m.key())),
        "lastUpdated" => described.last_updated.map(AttributeValue::DateTime),
        _ => None,
    }
}

impl Queryable for Item {
    fn entity_kind(&self) -> EntityKind {
        match self.kind {
            ItemKind::Episode => EntityKind::Episode,
            ItemKind::Item | ItemKind::Clip | ItemKind::Film => EntityKind::Item,
        }
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute.field {
            "isLongForm" => Some(AttributeValue::Boolean(self.is_long_form)),
            "episodeNumber" => self.episode_number.map(AttributeValue::Integer),
            "seriesNumber" => self.series_number.map(AttributeValue::Integer),
            _ => described_value(&self.described, attribute),
        }
    }
}

impl Queryable for Container {
    fn entity_kind(&self) -> EntityKind {
        match self.kind {
            ContainerKind::Brand => EntityKind::Brand,
            ContainerKind::Series => EntityKind::Series,
            ContainerKind::Container => EntityKind::Container,
        }
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute.field {
            "seriesNumber" => self.series_number.map(AttributeValue::Integer),
            _ => described_value(&self.described, attribute),
        }
    }
}

impl Queryable for ContentGroup {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::ContentGroup
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        described_value(&self.described, attribute)
    }
}

impl Queryable for Content {
    fn entity_kind(&self) -> EntityKind {
        match self {
            Content::Item(item) => item.entity_kind(),
            Content::Container(container) => container.entity_kind(),
            Content::Group(group) => group.entity_kind(),
        }
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match self {
            Content::Item(item) => item.attribute_value(attribute),
            Content::Container(container) => container.attribute_value(attribute),
            Content::Group(group) => group.attribute_value(attribute),
        }
    }
}

impl Queryable for Version {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Version
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute.field {
            "duration" => self.duration.map(AttributeValue::Integer),
            "publishedDuration" => self.published_duration.map(AttributeValue::Integer),
            _ => None,
        }
    }
}

impl Queryable for Broadcast {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Broadcast
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute.field {
            "broadcastOn" => Some(AttributeValue::String(self.broadcast_on.clone())),
            "transmissionTime" => Some(AttributeValue::DateTime(self.transmission_time)),
            "transmissionEndTime" => Some(AttributeValue::DateTime(self.transmission_end_time)),
            "broadcastDuration" => Some(AttributeValue::Integer(self.duration())),
            "repeat" => self.repeat.map(AttributeValue::Boolean),
            _ => None,
        }
    }
}

impl Queryable for Encoding {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Encoding
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute.field {
            "dataContainerFormat" => self.data_container_format.clone().map(AttributeValue::String),
            "bitRate" => self.bit_rate.map(AttributeValue::Integer),
            "videoCoding" => self.video_coding.clone().map(AttributeValue::String),
            "audioCoding" => self.audio_coding.clone().map(AttributeValue::String),
            _ => None,
        }
    }
}

impl Queryable for Location {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Location
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        if attribute.target == EntityKind::Policy {
            return self.policy.as_ref()?.attribute_value(attribute);
        }
        match attribute.field {
            "available" => Some(AttributeValue::Boolean(self.available)),
            "transportType" => self.transport_type.map(|t| AttributeValue::Enum(t.key())),
            "uri" => self.uri.clone().map(AttributeValue::String),
            _ => None,
        }
    }
}

impl Queryable for Policy {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Policy
    }

    fn attribute_value(&self, attribute: &Attribute) -> Option<AttributeValue> {
        match attribute.field {
            "availableCountries" => Some(AttributeValue::strings(&self.available_countries)),
            "availabilityStart" => self.availability_start.map(AttributeValue::DateTime),
            "availabilityEnd" => self.availability_end.map(AttributeValue::DateTime),
            _ => None,
        }
    }
}
