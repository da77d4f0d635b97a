//! Enumerated domain values
//!
//! Each enum has a stable lower-case key. The key is what gets stored in
//! documents and what enum-valued query constraints are compiled to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerations stored by key
pub trait EnumKey: Sized + Copy + 'static {
    /// Every variant, in declaration order
    const ALL: &'static [Self];

    /// Stored key
    fn key(&self) -> &'static str;

    /// Look up a variant by key, ignoring case
    fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.key().eq_ignore_ascii_case(key))
    }
}

/// Source of a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Publisher {
    #[serde(rename = "bbc.co.uk")]
    Bbc,
    #[serde(rename = "channel4.com")]
    C4,
    #[serde(rename = "itv.com")]
    Itv,
    #[serde(rename = "five.tv")]
    Five,
    #[serde(rename = "youtube.com")]
    Youtube,
    #[serde(rename = "pressassociation.com")]
    Pa,
    #[serde(rename = "metabroadcast.com")]
    Metabroadcast,
}

impl EnumKey for Publisher {
    const ALL: &'static [Self] = &[
        Publisher::Bbc,
        Publisher::C4,
        Publisher::Itv,
        Publisher::Five,
        Publisher::Youtube,
        Publisher::Pa,
        Publisher::Metabroadcast,
    ];

    fn key(&self) -> &'static str {
        match self {
            Publisher::Bbc => "bbc.co.uk",
            Publisher::C4 => "channel4.com",
            Publisher::Itv => "itv.com",
            Publisher::Five => "five.tv",
            Publisher::Youtube => "youtube.com",
            Publisher::Pa => "pressassociation.com",
            Publisher::Metabroadcast => "metabroadcast.com",
        }
    }
}

/// How a location delivers its encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Link,
    Embed,
    Download,
    Stream,
    Bittorrent,
    Application,
}

impl EnumKey for TransportType {
    const ALL: &'static [Self] = &[
        TransportType::Link,
        TransportType::Embed,
        TransportType::Download,
        TransportType::Stream,
        TransportType::Bittorrent,
        TransportType::Application,
    ];

    fn key(&self) -> &'static str {
        match self {
            TransportType::Link => "link",
            TransportType::Embed => "embed",
            TransportType::Download => "download",
            TransportType::Stream => "stream",
            TransportType::Bittorrent => "bittorrent",
            TransportType::Application => "application",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

impl EnumKey for MediaType {
    const ALL: &'static [Self] = &[MediaType::Video, MediaType::Audio];

    fn key(&self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

macro_rules! display_by_key {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        })*
    };
}

display_by_key!(Publisher, TransportType, MediaType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_ignores_case() {
        assert_eq!(Publisher::from_key("BBC.co.uk"), Some(Publisher::Bbc));
        assert_eq!(TransportType::from_key("LINK"), Some(TransportType::Link));
        assert_eq!(MediaType::from_key("radio"), None);
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&Publisher::C4).unwrap();
        assert_eq!(json, "\"channel4.com\"");
        for publisher in Publisher::ALL {
            let json = serde_json::to_value(publisher).unwrap();
            assert_eq!(json.as_str(), Some(publisher.key()));
        }
        assert_eq!(TransportType::Embed.to_string(), "embed");
    }
}
