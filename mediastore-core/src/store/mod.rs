//! Document store for the media store
//!
//! This module provides the collection abstraction the content store is
//! written against, together with a thread-safe in-memory implementation
//! that understands the filters produced by the query compiler.

pub mod filter;
pub mod matcher;
pub mod memory;

pub use filter::*;
pub use memory::*;

use serde::{Deserialize, Serialize};

/// Offset and limit applied to a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    /// Number of matching results to skip
    pub offset: usize,
    /// Maximum number of results, unlimited if None
    pub limit: Option<usize>,
}

impl Selection {
    /// Everything
    pub fn all() -> Self {
        Self::default()
    }

    /// A page of results
    pub fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }

    /// Whether the selection restricts the result set at all
    pub fn has_limit_or_offset(&self) -> bool {
        self.offset > 0 || self.limit.is_some()
    }

    /// Apply the selection to an iterator
    pub fn apply<I: Iterator>(&self, iter: I) -> std::iter::Take<std::iter::Skip<I>> {
        iter.skip(self.offset).take(self.limit.unwrap_or(usize::MAX))
    }
}
