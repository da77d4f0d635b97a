pub mod attributes;
pub mod config;
pub mod query;

pub use attributes::*;
pub use config::*;
pub use query::*;
