//! Mediastore Core - media content query engine
//!
//! This crate provides:
//! - Document model and an in-memory document store with Mongo-style filters
//! - Media content model (items, containers, versions, broadcasts, encodings, locations)
//! - Query compiler producing nested `$elemMatch` filters
//! - Result trimmer pruning fetched content to what a query matched
//! - Content repository and query executor

pub mod codec;
pub mod config;
pub mod content_store;
pub mod document;
pub mod executor;
pub mod logging;
pub mod model;
pub mod query;
pub mod store;

pub use config::StoreConfig;
pub use content_store::{ContentStore, ContentStoreError};
pub use document::*;
pub use executor::{ContentQueryExecutor, ExecutorError};
pub use logging::{init_logging, LoggingConfig, SlowQueryLogger};
pub use model::*;
pub use query::*;
pub use store::*;
