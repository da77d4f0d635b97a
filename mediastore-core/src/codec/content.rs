//! Codecs for top-level content
//!
//! Content documents carry a `type` discriminator and a `lookup` array with
//! every uri the document can be found by, including the uris of embedded
//! items.

use super::{CodecError, DocumentCodec, FieldReader, FieldWriter, Fields};
use crate::document::{Document, DocumentId, Value};
use crate::model::{Container, ContainerKind, Content, ContentGroup, Described, Item, ItemKind};

pub const TYPE: &str = "type";
pub const LOOKUP: &str = "lookup";
pub const CANONICAL_URI: &str = "canonicalUri";

fn item_type(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Item => "Item",
        ItemKind::Episode => "Episode",
        ItemKind::Clip => "Clip",
        ItemKind::Film => "Film",
    }
}

fn container_type(kind: ContainerKind) -> &'static str {
    match kind {
        ContainerKind::Brand => "Brand",
        ContainerKind::Series => "Series",
        ContainerKind::Container => "Container",
    }
}

const GROUP_TYPE: &str = "ContentGroup";

fn write_described(writer: &mut FieldWriter, described: &Described) {
    writer
        .put(CANONICAL_URI, described.canonical_uri.as_str())
        .put_opt("curie", described.curie.clone())
        .put_set("aliases", &described.aliases)
        .put_opt("title", described.title.clone())
        .put_opt("description", described.description.clone())
        .put_enum("publisher", described.publisher)
        .put_set("genres", &described.genres)
        .put_set("tags", &described.tags)
        .put_enum("mediaType", described.media_type)
        .put_opt("lastUpdated", described.last_updated);
}

fn read_described(reader: &FieldReader<'_>) -> Result<Described, CodecError> {
    Ok(Described {
        canonical_uri: reader.required_string(CANONICAL_URI)?,
        curie: reader.string("curie")?,
        aliases: reader.string_set("aliases")?,
        title: reader.string("title")?,
        description: reader.string("description")?,
        publisher: reader.enum_key("publisher")?,
        genres: reader.string_set("genres")?,
        tags: reader.string_set("tags")?,
        media_type: reader.enum_key("mediaType")?,
        last_updated: reader.datetime("lastUpdated")?,
    })
}

impl DocumentCodec for Item {
    fn encode(&self) -> Fields {
        let mut writer = FieldWriter::new();
        write_described(&mut writer, &self.described);
        writer
            .put(TYPE, item_type(self.kind))
            .put("isLongForm", self.is_long_form)
            .put_opt("container", self.container.clone())
            .put_opt("episodeNumber", self.episode_number)
            .put_opt("seriesNumber", self.series_number)
            .put_list("versions", &self.versions)
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "item");
        let kind = match reader.string(TYPE)?.as_deref() {
            Some("Item") | None => ItemKind::Item,
            Some("Episode") => ItemKind::Episode,
            Some("Clip") => ItemKind::Clip,
            Some("Film") => ItemKind::Film,
            Some(other) => return Err(CodecError::UnknownContentType(other.to_string())),
        };
        Ok(Item {
            described: read_described(&reader)?,
            kind,
            is_long_form: reader.bool("isLongForm")?.unwrap_or(false),
            container: reader.string("container")?,
            episode_number: reader.int("episodeNumber")?,
            series_number: reader.int("seriesNumber")?,
            versions: reader.list("versions")?,
        })
    }
}

impl DocumentCodec for Container {
    fn encode(&self) -> Fields {
        let mut writer = FieldWriter::new();
        write_described(&mut writer, &self.described);
        writer
            .put(TYPE, container_type(self.kind))
            .put_opt("seriesNumber", self.series_number)
            .put_list("contents", &self.contents)
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "container");
        let kind = match reader.string(TYPE)?.as_deref() {
            Some("Brand") => ContainerKind::Brand,
            Some("Series") => ContainerKind::Series,
            Some("Container") | None => ContainerKind::Container,
            Some(other) => return Err(CodecError::UnknownContentType(other.to_string())),
        };
        Ok(Container {
            described: read_described(&reader)?,
            kind,
            series_number: reader.int("seriesNumber")?,
            contents: reader.list("contents")?,
        })
    }
}

impl DocumentCodec for ContentGroup {
    fn encode(&self) -> Fields {
        let mut writer = FieldWriter::new();
        write_described(&mut writer, &self.described);
        writer
            .put(TYPE, GROUP_TYPE)
            .put_list("contents", &self.contents)
            .finish()
    }

    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "content group");
        Ok(ContentGroup {
            described: read_described(&reader)?,
            contents: reader.list("contents")?,
        })
    }
}

impl DocumentCodec for Content {
    fn encode(&self) -> Fields {
        match self {
            Content::Item(item) => item.encode(),
            Content::Container(container) => container.encode(),
            Content::Group(group) => group.encode(),
        }
    }

    /// Dispatch on the `type` discriminator
    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let reader = FieldReader::new(fields, "content");
        let content_type = reader
            .string(TYPE)?
            .ok_or_else(|| CodecError::MissingField {
                entity: "content",
                field: TYPE.to_string(),
            })?;

        match content_type.as_str() {
            "Item" | "Episode" | "Clip" | "Film" => Item::decode(fields).map(Content::Item),
            "Brand" | "Series" | "Container" => Container::decode(fields).map(Content::Container),
            GROUP_TYPE => ContentGroup::decode(fields).map(Content::Group),
            _ => Err(CodecError::UnknownContentType(content_type)),
        }
    }
}

/// Every uri a content document can be looked up by
pub fn lookup_uris(content: &Content) -> Vec<String> {
    let mut uris: Vec<String> = content.described().all_uris().map(str::to_string).collect();
    for child in content.contents() {
        uris.extend(child.described().all_uris().map(str::to_string));
    }
    uris.sort();
    uris.dedup();
    uris
}

/// Encode content as a storable document, with a stable id derived from its
/// canonical uri
pub fn to_document(content: &Content) -> Document {
    let mut doc = Document::with_id(DocumentId::from_key(content.canonical_uri()));
    doc.fields = content.encode();
    let lookup: Vec<Value> = lookup_uris(content).into_iter().map(Value::from).collect();
    doc.insert(LOOKUP, lookup);
    doc
}

/// Decode a stored document
pub fn from_document(doc: &Document) -> Result<Content, CodecError> {
    Content::decode(&doc.fields)
}
