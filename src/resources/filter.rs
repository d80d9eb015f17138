//! Filter state and the filter engine
//!
//! A record passes when every clause passes: region, instance type, status,
//! tag and cost-savings range. An empty set or an unset bound places no
//! constraint on its dimension. Per-category results are computed first and
//! the `all_resources` aggregate is their concatenation in fixed category
//! order, so it is exactly the union of what each tab shows.

use crate::error::{Result, RmonError};
use crate::resources::region::RegionContext;
use crate::resources::types::{Category, ResourceCatalog, ResourceRecord, Tab, TypeKey};
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::Hash;
use tracing::debug;

/// Inclusive bounds on `potential_cost_savings`
///
/// `min > max` is accepted as-is and simply matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl CostRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, savings: f64) -> bool {
        self.min.map_or(true, |min| savings >= min) && self.max.map_or(true, |max| savings <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Parse a bound typed by the user: blank means unset
pub fn parse_bound(field: &str, input: &str) -> Result<Option<f64>> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(RmonError::validation(
            field,
            format!("'{}' is not a number", input),
        )),
    }
}

/// Filter dimensions offered as facets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    InstanceTypes,
    Tags,
    Statuses,
}

impl FacetKind {
    pub fn title(self) -> &'static str {
        match self {
            FacetKind::InstanceTypes => "Instance Types",
            FacetKind::Tags => "Tags",
            FacetKind::Statuses => "Status",
        }
    }
}

/// One selectable facet value, tagged with its dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetEntry {
    Type(TypeKey),
    Tag(String),
    Status(String),
}

impl FacetEntry {
    pub fn kind(&self) -> FacetKind {
        match self {
            FacetEntry::Type(_) => FacetKind::InstanceTypes,
            FacetEntry::Tag(_) => FacetKind::Tags,
            FacetEntry::Status(_) => FacetKind::Statuses,
        }
    }

    pub fn label(&self) -> String {
        match self {
            FacetEntry::Type(key) => key.to_string(),
            FacetEntry::Tag(tag) | FacetEntry::Status(tag) => tag.clone(),
        }
    }
}

/// The user's current constraint selection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterState {
    pub instance_types: IndexSet<TypeKey>,
    pub tags: IndexSet<String>,
    pub statuses: IndexSet<String>,
    pub cost_savings: CostRange,
}

fn toggle<T: Hash + Eq>(set: &mut IndexSet<T>, value: T) {
    if !set.shift_remove(&value) {
        set.insert(value);
    }
}

impl FilterState {
    /// True when no dimension constrains anything
    pub fn is_permissive(&self) -> bool {
        self.instance_types.is_empty()
            && self.tags.is_empty()
            && self.statuses.is_empty()
            && self.cost_savings.is_unbounded()
    }

    pub fn toggle_instance_type(&mut self, key: TypeKey) {
        toggle(&mut self.instance_types, key);
    }

    pub fn toggle_tag(&mut self, tag: impl Into<String>) {
        toggle(&mut self.tags, tag.into());
    }

    pub fn toggle_status(&mut self, status: impl Into<String>) {
        toggle(&mut self.statuses, status.into());
    }

    pub fn set_min_savings(&mut self, min: Option<f64>) {
        self.cost_savings.min = min;
    }

    pub fn set_max_savings(&mut self, max: Option<f64>) {
        self.cost_savings.max = max;
    }

    /// Whether a facet value is currently selected
    pub fn is_selected(&self, entry: &FacetEntry) -> bool {
        match entry {
            FacetEntry::Type(key) => self.instance_types.contains(key),
            FacetEntry::Tag(tag) => self.tags.contains(tag),
            FacetEntry::Status(status) => self.statuses.contains(status),
        }
    }

    /// Instance-type, status, tag and cost clauses (region handled separately)
    pub fn matches(&self, record: &ResourceRecord) -> bool {
        let type_ok = self.instance_types.is_empty()
            || self.instance_types.iter().any(|key| record.has_type(key));

        let status_ok = self.statuses.is_empty()
            || record
                .status
                .as_deref()
                .map_or(false, |s| self.statuses.contains(s));

        let tag_ok =
            self.tags.is_empty() || record.tags.iter().any(|t| self.tags.contains(&t.facet_key()));

        type_ok && status_ok && tag_ok && self.cost_savings.contains(record.potential_cost_savings)
    }
}

/// Full predicate: region clause AND filter clauses
pub fn record_matches(record: &ResourceRecord, region: &RegionContext, filter: &FilterState) -> bool {
    region.admits(&record.region) && filter.matches(record)
}

/// Filtered records per category plus the aggregate, borrowing the catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredCatalog<'a> {
    per_category: BTreeMap<Category, Vec<&'a ResourceRecord>>,
    all_resources: Vec<&'a ResourceRecord>,
}

impl<'a> FilteredCatalog<'a> {
    pub fn category(&self, category: Category) -> &[&'a ResourceRecord] {
        self.per_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn all_resources(&self) -> &[&'a ResourceRecord] {
        &self.all_resources
    }

    /// Records visible under a tab
    pub fn tab(&self, tab: Tab) -> &[&'a ResourceRecord] {
        match tab {
            Tab::AllResources => self.all_resources(),
            Tab::Category(category) => self.category(category),
        }
    }
}

/// Apply region and filter state to every category of the catalog
pub fn compute_filtered<'a>(
    catalog: &'a ResourceCatalog,
    region: &RegionContext,
    filter: &FilterState,
) -> FilteredCatalog<'a> {
    let mut filtered = FilteredCatalog::default();

    for category in Category::all() {
        let records: Vec<&ResourceRecord> = catalog
            .records(*category)
            .iter()
            .filter(|r| record_matches(r, region, filter))
            .collect();
        filtered.all_resources.extend(records.iter().copied());
        filtered.per_category.insert(*category, records);
    }

    debug!(
        "Filtered catalog: {} of {} records visible",
        filtered.all_resources.len(),
        catalog.len()
    );
    filtered
}
