//! Media content domain model

pub mod content;
pub mod enums;
pub mod version;

pub use content::*;
pub use enums::*;
pub use version::*;
