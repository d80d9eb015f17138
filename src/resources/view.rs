//! View model handed to the rendering layer

use crate::resources::facets::{compute_facets, FacetSet};
use crate::resources::filter::{compute_filtered, FilterState};
use crate::resources::pagination::{paginate, PAGE_SIZE};
use crate::resources::region::RegionContext;
use crate::resources::types::{ResourceCatalog, ResourceRecord, Tab};
use serde::Serialize;

/// Everything needed to render one tab, derived from current state only
#[derive(Debug, Serialize)]
pub struct ViewModel<'a> {
    pub tab: Tab,
    pub page_records: Vec<&'a ResourceRecord>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub facets: FacetSet,
    pub filter_state: &'a FilterState,
    pub region_context: &'a RegionContext,
}

impl<'a> ViewModel<'a> {
    pub fn build(
        catalog: &'a ResourceCatalog,
        tab: Tab,
        region: &'a RegionContext,
        filters: &'a FilterState,
        page: usize,
    ) -> Self {
        let filtered = compute_filtered(catalog, region, filters);
        let records = filtered.tab(tab);
        let page_view = paginate(records, page, PAGE_SIZE);

        ViewModel {
            tab,
            page_records: page_view.items.to_vec(),
            current_page: page,
            total_pages: page_view.total_pages,
            total_records: records.len(),
            has_previous: page > 1,
            has_next: page < page_view.total_pages,
            facets: compute_facets(catalog, tab, region),
            filter_state: filters,
            region_context: region,
        }
    }
}
