//! Tab controller: the single writer of the view state
//!
//! Owns the active tab, region selection, filter state and current page,
//! and applies the reset rules as one transition:
//!
//! - changing tab resets filters and page
//! - changing region selection resets filters and page
//! - changing any filter dimension resets the page only
//! - changing page touches nothing else

use crate::resources::filter::FilterState;
use crate::resources::pagination::PaginationState;
use crate::resources::region::RegionContext;
use crate::resources::types::{ResourceCatalog, Tab, TypeKey};
use crate::resources::view::ViewModel;
use tracing::debug;

/// A user interaction that changes view state
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectTab(Tab),
    SelectRegion(String),
    SetRegions(RegionContext),
    ToggleInstanceType(TypeKey),
    ToggleTag(String),
    ToggleStatus(String),
    SetMinSavings(Option<f64>),
    SetMaxSavings(Option<f64>),
    SetPage(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabController {
    active: Tab,
    region: RegionContext,
    filters: FilterState,
    pagination: PaginationState,
}

impl TabController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    pub fn region(&self) -> &RegionContext {
        &self.region
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn page(&self) -> usize {
        self.pagination.page()
    }

    pub fn apply(&mut self, action: Action) {
        debug!("Applying {:?}", action);
        match action {
            Action::SelectTab(tab) => self.select_tab(tab),
            Action::SelectRegion(region) => self.select_region(&region),
            Action::SetRegions(ctx) => self.set_regions(ctx),
            Action::ToggleInstanceType(key) => self.toggle_instance_type(key),
            Action::ToggleTag(tag) => self.toggle_tag(tag),
            Action::ToggleStatus(status) => self.toggle_status(status),
            Action::SetMinSavings(min) => self.set_min_savings(min),
            Action::SetMaxSavings(max) => self.set_max_savings(max),
            Action::SetPage(page) => self.set_page(page),
        }
    }

    /// Switch tab; re-selecting the active tab only returns to page 1
    pub fn select_tab(&mut self, tab: Tab) {
        if tab != self.active {
            self.active = tab;
            self.filters = FilterState::default();
        }
        self.pagination.reset();
    }

    /// Toggle one region (or choose `Global`)
    pub fn select_region(&mut self, region: &str) {
        let next = self.region.select(region);
        self.set_regions(next);
    }

    /// Replace the region selection; a no-op when nothing changes
    pub fn set_regions(&mut self, region: RegionContext) {
        if region != self.region {
            self.region = region;
            self.filters = FilterState::default();
            self.pagination.reset();
        }
    }

    pub fn toggle_instance_type(&mut self, key: TypeKey) {
        self.filters.toggle_instance_type(key);
        self.pagination.reset();
    }

    pub fn toggle_tag(&mut self, tag: impl Into<String>) {
        self.filters.toggle_tag(tag);
        self.pagination.reset();
    }

    pub fn toggle_status(&mut self, status: impl Into<String>) {
        self.filters.toggle_status(status);
        self.pagination.reset();
    }

    pub fn set_min_savings(&mut self, min: Option<f64>) {
        self.filters.set_min_savings(min);
        self.pagination.reset();
    }

    pub fn set_max_savings(&mut self, max: Option<f64>) {
        self.filters.set_max_savings(max);
        self.pagination.reset();
    }

    pub fn set_page(&mut self, page: usize) {
        self.pagination.set(page);
    }

    /// Derive everything the rendering layer needs for the current state
    pub fn view<'a>(&'a self, catalog: &'a ResourceCatalog) -> ViewModel<'a> {
        ViewModel::build(catalog, self.active, &self.region, &self.filters, self.page())
    }
}
