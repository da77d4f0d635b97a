//! Versions and the entities nested beneath them

use super::enums::TransportType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One cut of a piece of content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Version {
    pub canonical_uri: Option<String>,
    /// Duration in seconds
    pub duration: Option<i64>,
    pub published_duration: Option<i64>,
    pub broadcasts: Vec<Broadcast>,
    pub manifested_as: Vec<Encoding>,
}

/// A scheduled transmission of a version on a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    /// Channel uri
    pub broadcast_on: String,
    pub transmission_time: DateTime<Utc>,
    pub transmission_end_time: DateTime<Utc>,
    #[serde(default)]
    pub repeat: Option<bool>,
    #[serde(default)]
    pub source_id: Option<String>,
}

impl Broadcast {
    pub fn new(
        broadcast_on: impl Into<String>,
        transmission_time: DateTime<Utc>,
        transmission_end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            broadcast_on: broadcast_on.into(),
            transmission_time,
            transmission_end_time,
            repeat: None,
            source_id: None,
        }
    }

    /// Broadcast duration in seconds
    pub fn duration(&self) -> i64 {
        (self.transmission_end_time - self.transmission_time).num_seconds()
    }
}

/// A physical encoding of a version
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Encoding {
    pub data_container_format: Option<String>,
    pub bit_rate: Option<i64>,
    pub video_coding: Option<String>,
    pub audio_coding: Option<String>,
    pub available_at: Vec<Location>,
}

/// Where an encoding can be obtained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub transport_type: Option<TransportType>,
    #[serde(default)]
    pub policy: Option<Policy>,
}

fn default_available() -> bool {
    true
}

impl Default for Location {
    fn default() -> Self {
        Self {
            uri: None,
            available: true,
            transport_type: None,
            policy: None,
        }
    }
}

/// Availability rules for a location
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    /// ISO country codes
    pub available_countries: BTreeSet<String>,
    pub availability_start: Option<DateTime<Utc>>,
    pub availability_end: Option<DateTime<Utc>>,
}
