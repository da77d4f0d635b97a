//! Prunes nested collections of fetched content to what the query matched
//!
//! The store matches a document when some nested element satisfies the
//! filter, but returns the whole document. Trimming walks each result and
//! keeps only the versions, broadcasts, encodings, locations and sub-content
//! that still satisfy the query.
//!
//! Each nested level is trimmed the same way:
//! 1. elements failing a soft constraint are dropped;
//! 2. if none remain and no hard constraint concerns the level (or anything
//!    beneath it), the level is empty but valid;
//! 3. remaining elements must satisfy the hard constraints and trim
//!    successfully one level down;
//! 4. if nothing survives, the level has no value and its owner is dropped.

use super::checker::{satisfies, Queryable};
use super::concerns::{
    concerns, BROADCAST, ENCODING_OR_BELOW, ITEM_OR_BELOW, LOCATION_OR_BELOW, VERSION_OR_BELOW,
};
use super::constraint::ContentQuery;
use super::{Constraint, EntityKind};
use crate::model::{Content, Encoding, Version};
use std::mem;
use tracing::{debug, trace};

/// Constraints split by strength, without those that hold unconditionally
struct TrimScope<'q> {
    hard: Vec<&'q Constraint>,
    soft: Vec<&'q Constraint>,
}

impl<'q> TrimScope<'q> {
    fn new(query: &'q ContentQuery) -> Self {
        let (soft, hard): (Vec<&Constraint>, Vec<&Constraint>) = query
            .constraints()
            .iter()
            .filter(|c| !c.is_unconditionally_true())
            .partition(|c| c.is_soft());
        Self { hard, soft }
    }

    fn concerns(&self, kinds: &[EntityKind]) -> bool {
        concerns(self.hard.iter().copied(), kinds)
    }

    fn passes_soft<Q: Queryable + ?Sized>(&self, entity: &Q) -> bool {
        satisfies(entity, self.soft.iter().copied())
    }

    fn passes_hard<Q: Queryable + ?Sized>(&self, entity: &Q) -> bool {
        satisfies(entity, self.hard.iter().copied())
    }

    /// Trim one nested level; None means nothing that could have matched remains
    fn trim_level<T, F>(&self, elements: Vec<T>, kinds: &[EntityKind], keep: F) -> Option<Vec<T>>
    where
        T: Queryable,
        F: FnMut(T) -> Option<T>,
    {
        let candidates: Vec<T> = elements.into_iter().filter(|e| self.passes_soft(e)).collect();

        if candidates.is_empty() && !self.concerns(kinds) {
            return Some(Vec::new());
        }

        let kept: Vec<T> = candidates
            .into_iter()
            .filter(|e| self.passes_hard(e))
            .filter_map(keep)
            .collect();

        if kept.is_empty() {
            None
        } else {
            Some(kept)
        }
    }

    fn trim_versions(&self, versions: Vec<Version>) -> Option<Vec<Version>> {
        self.trim_level(versions, VERSION_OR_BELOW, |version| self.trim_version(version))
    }

    fn trim_version(&self, mut version: Version) -> Option<Version> {
        version.broadcasts = self.trim_level(mem::take(&mut version.broadcasts), BROADCAST, Some)?;
        version.manifested_as = self.trim_level(
            mem::take(&mut version.manifested_as),
            ENCODING_OR_BELOW,
            |encoding| self.trim_encoding(encoding),
        )?;
        Some(version)
    }

    fn trim_encoding(&self, mut encoding: Encoding) -> Option<Encoding> {
        encoding.available_at =
            self.trim_level(mem::take(&mut encoding.available_at), LOCATION_OR_BELOW, Some)?;
        Some(encoding)
    }

    /// Trim embedded sub-content of a container or group. Every member is
    /// checked against the hard constraints addressed to its kind.
    fn trim_contents(&self, members: Vec<Content>) -> Vec<Content> {
        members
            .into_iter()
            .filter(|member| self.passes_soft(member))
            .filter_map(|member| match member {
                Content::Item(mut item) => {
                    if !self.passes_hard(&item) {
                        trace!(uri = %item.described.canonical_uri, "Dropping sub-item failing query");
                        return None;
                    }
                    item.versions = self.trim_versions(mem::take(&mut item.versions))?;
                    Some(Content::Item(item))
                }
                Content::Container(mut container) => {
                    if !self.passes_hard(&container) {
                        trace!(uri = %container.described.canonical_uri, "Dropping sub-container failing query");
                        return None;
                    }
                    container.contents = self.trim_nested(mem::take(&mut container.contents))?;
                    Some(Content::Container(container))
                }
                Content::Group(mut group) => {
                    if !self.passes_hard(&group) {
                        trace!(uri = %group.described.canonical_uri, "Dropping sub-group failing query");
                        return None;
                    }
                    group.contents = self.trim_nested(mem::take(&mut group.contents))?;
                    Some(Content::Group(group))
                }
            })
            .collect()
    }

    /// Nested containers survive unless they lose every member to an
    /// item-level constraint
    fn trim_nested(&self, members: Vec<Content>) -> Option<Vec<Content>> {
        let trimmed = self.trim_contents(members);
        if trimmed.is_empty() && self.concerns(ITEM_OR_BELOW) {
            None
        } else {
            Some(trimmed)
        }
    }

    fn trim_top_level(&self, content: Content, remove_non_matching: bool) -> Option<Content> {
        match content {
            Content::Item(mut item) => {
                match self.trim_versions(mem::take(&mut item.versions)) {
                    Some(versions) => item.versions = versions,
                    None if remove_non_matching => {
                        trace!(uri = %item.described.canonical_uri, "Removing item with no matching versions");
                        return None;
                    }
                    // kept with no versions
                    None => {}
                }
                Some(Content::Item(item))
            }
            Content::Container(mut container) => {
                match self.trim_nested(mem::take(&mut container.contents)) {
                    Some(contents) => container.contents = contents,
                    None if remove_non_matching => {
                        trace!(uri = %container.described.canonical_uri, "Removing container with no matching contents");
                        return None;
                    }
                    None => {}
                }
                Some(Content::Container(container))
            }
            Content::Group(mut group) => {
                match self.trim_nested(mem::take(&mut group.contents)) {
                    Some(contents) => group.contents = contents,
                    None if remove_non_matching => return None,
                    None => {}
                }
                Some(Content::Group(group))
            }
        }
    }
}

/// Stateless result trimmer
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultTrimmer;

impl ResultTrimmer {
    pub fn new() -> Self {
        Self
    }

    /// Trim fetched content against a query.
    ///
    /// Content whose publisher the query does not allow is always removed.
    /// Otherwise, content left with nothing that could have matched is
    /// removed when `remove_non_matching` is set and kept with emptied
    /// collections when it is not.
    pub fn trim(&self, contents: Vec<Content>, query: &ContentQuery, remove_non_matching: bool) -> Vec<Content> {
        if query.is_matches_nothing() {
            return Vec::new();
        }

        let scope = TrimScope::new(query);
        let fetched = contents.len();

        let trimmed: Vec<Content> = contents
            .into_iter()
            .filter(|content| {
                let allowed = query.allows_publisher(content.publisher());
                if !allowed {
                    trace!(uri = %content.canonical_uri(), publisher = ?content.publisher(), "Publisher not allowed");
                }
                allowed
            })
            .filter_map(|content| scope.trim_top_level(content, remove_non_matching))
            .collect();

        debug!(
            query = %query,
            fetched,
            returned = trimmed.len(),
            remove_non_matching,
            "Trimmed query results"
        );
        trimmed
    }
}
