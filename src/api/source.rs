//! Where the catalog comes from
//!
//! The engine consumes a `ResourceCatalog` and a region list; it does not
//! care whether they came from the backend or from a snapshot file.

use crate::api::client::ApiClient;
use crate::error::{Result, RmonError};
use crate::resources::region::RegionSummary;
use crate::resources::types::ResourceCatalog;
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name used in notices ("api", "snapshot")
    fn name(&self) -> &'static str;

    async fn fetch_catalog(&self) -> Result<ResourceCatalog>;

    async fn fetch_regions(&self) -> Result<Vec<RegionSummary>>;
}

#[async_trait]
impl CatalogSource for ApiClient {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn fetch_catalog(&self) -> Result<ResourceCatalog> {
        ApiClient::fetch_catalog(self).await
    }

    async fn fetch_regions(&self) -> Result<Vec<RegionSummary>> {
        ApiClient::fetch_regions(self).await
    }
}

/// Catalog stored in a JSON file shaped like the all-resources response
///
/// An optional top-level `regions` array supplies the region list; without
/// it, regions are derived from the records themselves.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Value> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RmonError::unavailable("snapshot", format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            RmonError::unavailable("snapshot", format!("{}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl CatalogSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch_catalog(&self) -> Result<ResourceCatalog> {
        let mut body = self.read().await?;
        if let Value::Object(map) = &mut body {
            map.remove("regions");
        }
        let catalog = ResourceCatalog::from_json(body)?;
        info!(
            "Loaded {} records from snapshot {}",
            catalog.len(),
            self.path.display()
        );
        Ok(catalog)
    }

    async fn fetch_regions(&self) -> Result<Vec<RegionSummary>> {
        let body = self.read().await?;
        if let Some(regions) = body.get("regions") {
            return serde_json::from_value(regions.clone())
                .map_err(|e| RmonError::unavailable("snapshot", format!("invalid regions: {}", e)));
        }
        let catalog = ResourceCatalog::from_json(body)?;
        Ok(regions_from_catalog(&catalog))
    }
}

/// Per-region record counts, in first-seen order
pub fn regions_from_catalog(catalog: &ResourceCatalog) -> Vec<RegionSummary> {
    let mut counts: indexmap::IndexMap<&str, u64> = indexmap::IndexMap::new();
    for record in catalog.records_for(crate::resources::types::Tab::AllResources) {
        if !record.region.is_empty() {
            *counts.entry(record.region.as_str()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(name, total_resources)| RegionSummary {
            name: name.to_string(),
            total_resources,
        })
        .collect()
}

/// Write a catalog (and its region list) in the snapshot format
pub fn write_snapshot(
    path: &Path,
    catalog: &ResourceCatalog,
    regions: &[RegionSummary],
) -> Result<()> {
    let mut body = serde_json::to_value(catalog)?;
    if let Value::Object(map) = &mut body {
        map.insert("regions".to_string(), serde_json::to_value(regions)?);
    }
    std::fs::write(path, serde_json::to_string_pretty(&body)?)?;
    Ok(())
}
