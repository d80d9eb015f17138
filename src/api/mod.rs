//! Backend access: authenticated HTTP client and catalog sources

pub mod client;
pub mod source;
pub mod types;

pub use client::ApiClient;
pub use source::{CatalogSource, SnapshotSource};
pub use types::AccountDetails;
