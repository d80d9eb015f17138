//! rmon library
//!
//! Browse cloud cost-saving findings from the rmon backend: fetch the
//! resource catalog once, then filter, facet and page through it.

pub mod api;
pub mod config;
pub mod costs;
pub mod dashboard;
pub mod error;
pub mod exit_codes;
pub mod global;
pub mod resources;
pub mod retry;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, RmonError};
pub use resources::tabs::{Action, TabController};
pub use resources::types::{Category, ResourceCatalog, ResourceRecord, Tab};
