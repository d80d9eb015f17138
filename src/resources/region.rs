//! Region selection
//!
//! A region context is either the `Global` sentinel (no restriction) or a
//! non-empty set of concrete region names. It can never be empty: removing
//! the last concrete region falls back to `Global`.

use indexmap::IndexSet;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the "all regions" sentinel
pub const GLOBAL: &str = "Global";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionContext {
    #[default]
    Global,
    Regions(IndexSet<String>),
}

impl RegionContext {
    pub fn global() -> Self {
        RegionContext::Global
    }

    /// Context holding exactly these regions (no toggling); `Global` anywhere,
    /// or an empty input, yields `Global`
    pub fn from_regions<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = IndexSet::new();
        for region in regions {
            let region = region.as_ref().trim();
            if region == GLOBAL {
                return RegionContext::Global;
            }
            if !region.is_empty() {
                set.insert(region.to_string());
            }
        }
        if set.is_empty() {
            RegionContext::Global
        } else {
            RegionContext::Regions(set)
        }
    }

    /// Toggle one region in or out of the selection
    ///
    /// Selecting `Global` always yields `Global`. Selecting a concrete region
    /// drops `Global` and toggles that region; an emptied set reverts to
    /// `Global`.
    pub fn select(&self, region: &str) -> Self {
        if region == GLOBAL {
            return RegionContext::Global;
        }
        let mut set = match self {
            RegionContext::Global => IndexSet::new(),
            RegionContext::Regions(set) => set.clone(),
        };
        if !set.shift_remove(region) {
            set.insert(region.to_string());
        }
        if set.is_empty() {
            RegionContext::Global
        } else {
            RegionContext::Regions(set)
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, RegionContext::Global)
    }

    /// Region clause: does a record in `region` pass this context?
    pub fn admits(&self, region: &str) -> bool {
        match self {
            RegionContext::Global => true,
            RegionContext::Regions(set) => set.contains(region),
        }
    }

    /// Whether `name` shows as selected in a region picker
    pub fn is_selected(&self, name: &str) -> bool {
        match self {
            RegionContext::Global => name == GLOBAL,
            RegionContext::Regions(set) => set.contains(name),
        }
    }

    /// Selected names, `["Global"]` for the sentinel
    pub fn names(&self) -> Vec<&str> {
        match self {
            RegionContext::Global => vec![GLOBAL],
            RegionContext::Regions(set) => set.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for RegionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}

impl Serialize for RegionContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let names = self.names();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

/// Entry of the resources-per-region listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    #[serde(alias = "region", alias = "region_name")]
    pub name: String,
    #[serde(default)]
    pub total_resources: u64,
}

/// Regions worth offering in a picker: those with at least one resource
pub fn selectable_regions(regions: &[RegionSummary]) -> Vec<&RegionSummary> {
    regions.iter().filter(|r| r.total_resources > 0).collect()
}
