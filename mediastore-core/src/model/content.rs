//! Top-level content: items, containers and content groups

use super::enums::{MediaType, Publisher};
use super::version::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Descriptive fields shared by every kind of content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Described {
    pub canonical_uri: String,
    pub curie: Option<String>,
    pub aliases: BTreeSet<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<Publisher>,
    pub genres: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub media_type: Option<MediaType>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Described {
    pub fn new(canonical_uri: impl Into<String>) -> Self {
        Self {
            canonical_uri: canonical_uri.into(),
            ..Default::default()
        }
    }

    /// Canonical uri, curie and aliases
    pub fn all_uris(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_uri.as_str())
            .chain(self.curie.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
    }

    /// Whether `uri` is the canonical uri, the curie or an alias
    pub fn is_known_as(&self, uri: &str) -> bool {
        self.all_uris().any(|known| known == uri)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Item,
    Episode,
    Clip,
    Film,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    #[serde(flatten)]
    pub described: Described,
    pub kind: ItemKind,
    pub is_long_form: bool,
    /// Uri of the brand or series this item belongs to
    pub container: Option<String>,
    pub episode_number: Option<i64>,
    pub series_number: Option<i64>,
    pub versions: Vec<Version>,
}

impl Item {
    pub fn new(canonical_uri: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            described: Described::new(canonical_uri),
            kind,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Brand,
    Series,
    #[default]
    Container,
}

/// A brand or series with its items embedded
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    #[serde(flatten)]
    pub described: Described,
    pub kind: ContainerKind,
    pub series_number: Option<i64>,
    pub contents: Vec<Content>,
}

impl Container {
    pub fn new(canonical_uri: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            described: Described::new(canonical_uri),
            kind,
            ..Default::default()
        }
    }
}

/// A curated playlist of content
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentGroup {
    #[serde(flatten)]
    pub described: Described,
    pub contents: Vec<Content>,
}

impl ContentGroup {
    pub fn new(canonical_uri: impl Into<String>) -> Self {
        Self {
            described: Described::new(canonical_uri),
            contents: Vec::new(),
        }
    }
}

/// Any piece of top-level content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum Content {
    Item(Item),
    Container(Container),
    Group(ContentGroup),
}

impl Content {
    pub fn described(&self) -> &Described {
        match self {
            Content::Item(item) => &item.described,
            Content::Container(container) => &container.described,
            Content::Group(group) => &group.described,
        }
    }

    pub fn canonical_uri(&self) -> &str {
        &self.described().canonical_uri
    }

    pub fn publisher(&self) -> Option<Publisher> {
        self.described().publisher
    }

    /// Embedded sub-content, empty for items
    pub fn contents(&self) -> &[Content] {
        match self {
            Content::Item(_) => &[],
            Content::Container(container) => &container.contents,
            Content::Group(group) => &group.contents,
        }
    }
}

impl From<Item> for Content {
    fn from(item: Item) -> Self {
        Content::Item(item)
    }
}

impl From<Container> for Content {
    fn from(container: Container) -> Self {
        Content::Container(container)
    }
}

impl From<ContentGroup> for Content {
    fn from(group: ContentGroup) -> Self {
        Content::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_described_uris() {
        let mut described = Described::new("http://www.bbc.co.uk/programmes/b006m86d");
        described.curie = Some("bbc:b006m86d".to_string());
        described.aliases.insert("http://bbc.co.uk/eastenders".to_string());

        assert!(described.is_known_as("bbc:b006m86d"));
        assert!(described.is_known_as("http://bbc.co.uk/eastenders"));
        assert!(!described.is_known_as("http://example.com"));
        assert_eq!(described.all_uris().count(), 3);
    }

    #[test]
    fn test_content_json_shape() {
        let content: Content = serde_json::from_value(json!({
            "entity": "container",
            "canonicalUri": "http://brand",
            "kind": "brand",
            "publisher": "bbc.co.uk",
            "contents": [{
                "entity": "item",
                "canonicalUri": "http://episode",
                "kind": "episode",
                "versions": [{"duration": 1800}]
            }]
        }))
        .unwrap();

        match &content {
            Content::Container(container) => {
                assert_eq!(container.kind, ContainerKind::Brand);
                assert_eq!(container.described.publisher, Some(Publisher::Bbc));
                assert_eq!(content.contents().len(), 1);
            }
            other => panic!("unexpected content {:?}", other),
        }
    }
}
