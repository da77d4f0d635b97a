//! Queryable attributes and the entity kinds they belong to
//!
//! Attributes are immutable statics. Each names the entity kind it lives on,
//! the store field it maps to, and the kind of value it holds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of entity an attribute can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Content,
    Item,
    Episode,
    Container,
    Brand,
    Series,
    ContentGroup,
    Version,
    Broadcast,
    Encoding,
    Location,
    Policy,
    Person,
}

impl EntityKind {
    /// Immediate supertype in the content hierarchy
    pub fn parent(self) -> Option<EntityKind> {
        match self {
            EntityKind::Episode => Some(EntityKind::Item),
            EntityKind::Brand | EntityKind::Series => Some(EntityKind::Container),
            EntityKind::Item | EntityKind::Container | EntityKind::ContentGroup => {
                Some(EntityKind::Content)
            }
            _ => None,
        }
    }

    /// Whether `self` is `other` or one of its subtypes
    pub fn is_a(self, other: EntityKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Whether a constraint targeting `target` can be evaluated on an entity
    /// of this kind. Locations also answer for their policy.
    pub fn answers_for(self, target: EntityKind) -> bool {
        self.is_a(target)
            || target.is_a(self)
            || (self == EntityKind::Location && target == EntityKind::Policy)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Kind of value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Integer,
    String,
    Boolean,
    Enum,
    DateTime,
}

/// A named, typed field on an entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// External (query parameter) name
    pub name: &'static str,
    /// Store field name, before pluralisation
    pub field: &'static str,
    pub target: EntityKind,
    pub value_kind: ValueKind,
    /// Holds a collection of values rather than one
    pub collection: bool,
}

impl Attribute {
    const fn single(
        name: &'static str,
        field: &'static str,
        target: EntityKind,
        value_kind: ValueKind,
    ) -> Self {
        Self {
            name,
            field,
            target,
            value_kind,
            collection: false,
        }
    }

    const fn many(
        name: &'static str,
        field: &'static str,
        target: EntityKind,
        value_kind: ValueKind,
    ) -> Self {
        Self {
            name,
            field,
            target,
            value_kind,
            collection: true,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

use EntityKind as E;
use ValueKind as V;

pub const TITLE: Attribute = Attribute::single("title", "title", E::Content, V::String);
pub const DESCRIPTION: Attribute = Attribute::single("description", "description", E::Content, V::String);
pub const URI: Attribute = Attribute::single("uri", "canonicalUri", E::Content, V::String);
pub const CURIE: Attribute = Attribute::single("curie", "curie", E::Content, V::String);
pub const PUBLISHER: Attribute = Attribute::single("publisher", "publisher", E::Content, V::String);
pub const GENRE: Attribute = Attribute::many("genre", "genre", E::Content, V::String);
pub const TAG: Attribute = Attribute::many("tag", "tag", E::Content, V::String);
pub const MEDIA_TYPE: Attribute = Attribute::single("mediaType", "mediaType", E::Content, V::Enum);
pub const LAST_UPDATED: Attribute = Attribute::single("lastUpdated", "lastUpdated", E::Content, V::DateTime);

pub const ITEM_IS_LONG_FORM: Attribute = Attribute::single("item.isLongForm", "isLongForm", E::Item, V::Boolean);
pub const EPISODE_NUMBER: Attribute = Attribute::single("episode.episodeNumber", "episodeNumber", E::Episode, V::Integer);
pub const EPISODE_SERIES_NUMBER: Attribute = Attribute::single("episode.seriesNumber", "seriesNumber", E::Episode, V::Integer);
pub const BRAND_TITLE: Attribute = Attribute::single("brand.title", "title", E::Brand, V::String);

pub const VERSION_DURATION: Attribute = Attribute::single("version.duration", "duration", E::Version, V::Integer);
pub const VERSION_PUBLISHED_DURATION: Attribute =
    Attribute::single("version.publishedDuration", "publishedDuration", E::Version, V::Integer);

pub const BROADCAST_ON: Attribute = Attribute::single("broadcast.on", "broadcastOn", E::Broadcast, V::String);
pub const BROADCAST_TRANSMISSION_TIME: Attribute =
    Attribute::single("broadcast.transmissionTime", "transmissionTime", E::Broadcast, V::DateTime);
pub const BROADCAST_TRANSMISSION_END_TIME: Attribute =
    Attribute::single("broadcast.transmissionEndTime", "transmissionEndTime", E::Broadcast, V::DateTime);
pub const BROADCAST_DURATION: Attribute =
    Attribute::single("broadcast.duration", "broadcastDuration", E::Broadcast, V::Integer);
pub const BROADCAST_REPEAT: Attribute = Attribute::single("broadcast.repeat", "repeat", E::Broadcast, V::Boolean);

pub const ENCODING_DATA_CONTAINER_FORMAT: Attribute =
    Attribute::single("encoding.dataContainerFormat", "dataContainerFormat", E::Encoding, V::String);
pub const ENCODING_BIT_RATE: Attribute = Attribute::single("encoding.bitRate", "bitRate", E::Encoding, V::Integer);
pub const ENCODING_VIDEO_CODING: Attribute =
    Attribute::single("encoding.videoCoding", "videoCoding", E::Encoding, V::String);
pub const ENCODING_AUDIO_CODING: Attribute =
    Attribute::single("encoding.audioCoding", "audioCoding", E::Encoding, V::String);

pub const LOCATION_AVAILABLE: Attribute = Attribute::single("location.available", "available", E::Location, V::Boolean);
pub const LOCATION_TRANSPORT_TYPE: Attribute =
    Attribute::single("location.transportType", "transportType", E::Location, V::Enum);
pub const LOCATION_URI: Attribute = Attribute::single("location.uri", "uri", E::Location, V::String);

pub const POLICY_AVAILABLE_COUNTRIES: Attribute =
    Attribute::many("policy.availableCountries", "availableCountries", E::Policy, V::String);
pub const POLICY_AVAILABILITY_START: Attribute =
    Attribute::single("policy.availabilityStart", "availabilityStart", E::Policy, V::DateTime);
pub const POLICY_AVAILABILITY_END: Attribute =
    Attribute::single("policy.availabilityEnd", "availabilityEnd", E::Policy, V::DateTime);

/// Targets an entity the store has no path for
pub const PERSON_NAME: Attribute = Attribute::single("person.name", "name", E::Person, V::String);

/// Every known attribute
pub const ALL: &[Attribute] = &[
    TITLE,
    DESCRIPTION,
    URI,
    CURIE,
    PUBLISHER,
    GENRE,
    TAG,
    MEDIA_TYPE,
    LAST_UPDATED,
    ITEM_IS_LONG_FORM,
    EPISODE_NUMBER,
    EPISODE_SERIES_NUMBER,
    BRAND_TITLE,
    VERSION_DURATION,
    VERSION_PUBLISHED_DURATION,
    BROADCAST_ON,
    BROADCAST_TRANSMISSION_TIME,
    BROADCAST_TRANSMISSION_END_TIME,
    BROADCAST_DURATION,
    BROADCAST_REPEAT,
    ENCODING_DATA_CONTAINER_FORMAT,
    ENCODING_BIT_RATE,
    ENCODING_VIDEO_CODING,
    ENCODING_AUDIO_CODING,
    LOCATION_AVAILABLE,
    LOCATION_TRANSPORT_TYPE,
    LOCATION_URI,
    POLICY_AVAILABLE_COUNTRIES,
    POLICY_AVAILABILITY_START,
    POLICY_AVAILABILITY_END,
    PERSON_NAME,
];

/// Find an attribute by external name
pub fn lookup(name: &str) -> Option<&'static Attribute> {
    ALL.iter().find(|a| a.name == name)
}
