//! Facet computation
//!
//! Facets list the filter values still reachable for the active tab under
//! the current region selection. They are computed from region-filtered
//! records only: the filter dimensions themselves never narrow the options
//! they offer.

use crate::resources::region::RegionContext;
use crate::resources::types::{ResourceCatalog, Tab, TypeKey};
use indexmap::IndexSet;
use serde::Serialize;

/// Facet values shown before a section offers "Load More"
pub const FACET_PREVIEW_COUNT: usize = 3;

/// Selectable values per filter dimension, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetSet {
    pub instance_types: IndexSet<TypeKey>,
    pub tags: IndexSet<String>,
    pub statuses: IndexSet<String>,
}

impl FacetSet {
    pub fn is_empty(&self) -> bool {
        self.instance_types.is_empty() && self.tags.is_empty() && self.statuses.is_empty()
    }
}

/// Derive the facets for `tab` under `region`
pub fn compute_facets(catalog: &ResourceCatalog, tab: Tab, region: &RegionContext) -> FacetSet {
    let mut facets = FacetSet::default();

    for record in catalog
        .records_for(tab)
        .filter(|r| region.admits(&r.region))
    {
        if let Some(key) = record.type_key() {
            facets.instance_types.insert(key);
        }
        if let Some(status) = &record.status {
            facets.statuses.insert(status.clone());
        }
        for tag in &record.tags {
            facets.tags.insert(tag.facet_key());
        }
    }

    facets
}

/// Values a facet section displays: the first `count` unless expanded
pub fn preview<T>(values: &IndexSet<T>, expanded: bool, count: usize) -> Vec<&T> {
    if expanded {
        values.iter().collect()
    } else {
        values.iter().take(count).collect()
    }
}

/// Whether a section needs a "Load More" / "Show Less" toggle
pub fn has_more<T>(values: &IndexSet<T>, count: usize) -> bool {
    values.len() > count
}
