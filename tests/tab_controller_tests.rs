//! Tests for the tab controller's reset rules and the view it derives

mod common;

use common::{ids, sample_catalog};
use rmon::resources::region::RegionContext;
use rmon::resources::types::TypeKey;
use rmon::{Action, Category, Tab, TabController};

#[test]
fn test_initial_state() {
    let ctl = TabController::new();
    assert_eq!(ctl.active(), Tab::AllResources);
    assert!(ctl.region().is_global());
    assert!(ctl.filters().is_permissive());
    assert_eq!(ctl.page(), 1);
}

#[test]
fn test_switching_tab_resets_filters_and_page() {
    let mut ctl = TabController::new();
    ctl.toggle_status("running");
    ctl.set_page(2);

    ctl.select_tab(Tab::Category(Category::RdsInstances));
    assert_eq!(ctl.active(), Tab::Category(Category::RdsInstances));
    assert!(ctl.filters().is_permissive());
    assert_eq!(ctl.page(), 1);
}

#[test]
fn test_reselecting_tab_keeps_filters() {
    let mut ctl = TabController::new();
    ctl.toggle_tag("Env:Prod");
    ctl.set_page(3);

    ctl.select_tab(Tab::AllResources);
    assert!(ctl.filters().tags.contains("Env:Prod"));
    assert_eq!(ctl.page(), 1);
}

#[test]
fn test_region_change_resets_filters_and_page() {
    let mut ctl = TabController::new();
    ctl.select_tab(Tab::Category(Category::Ec2Instances));
    ctl.toggle_instance_type(TypeKey::instance_type("t3.micro"));
    ctl.set_page(2);

    ctl.select_region("us-east-1");
    assert!(ctl.region().is_selected("us-east-1"));
    assert!(ctl.filters().is_permissive());
    assert_eq!(ctl.page(), 1);
    // Tab survives a region change
    assert_eq!(ctl.active(), Tab::Category(Category::Ec2Instances));
}

#[test]
fn test_unchanged_region_selection_is_noop() {
    let mut ctl = TabController::new();
    ctl.set_regions(RegionContext::from_regions(["us-east-1"]));
    ctl.toggle_status("running");
    ctl.set_page(2);

    ctl.set_regions(RegionContext::from_regions(["us-east-1"]));
    assert!(ctl.filters().statuses.contains("running"));
    assert_eq!(ctl.page(), 2);
}

#[test]
fn test_deselecting_last_region_falls_back_to_global() {
    let mut ctl = TabController::new();
    ctl.select_region("us-east-1");
    ctl.select_region("us-west-2");
    ctl.select_region("us-east-1");
    assert!(ctl.region().is_selected("us-west-2"));
    assert!(!ctl.region().is_selected("us-east-1"));

    ctl.select_region("us-west-2");
    assert!(ctl.region().is_global());

    ctl.select_region("us-east-1");
    ctl.select_region("Global");
    assert!(ctl.region().is_global());
}

#[test]
fn test_filter_changes_reset_page() {
    let mut ctl = TabController::new();
    ctl.set_page(2);
    ctl.toggle_status("running");
    assert_eq!(ctl.page(), 1);

    ctl.set_page(2);
    ctl.set_min_savings(Some(1.0));
    assert_eq!(ctl.page(), 1);

    ctl.set_page(2);
    ctl.set_max_savings(None);
    assert_eq!(ctl.page(), 1);
}

#[test]
fn test_toggle_twice_removes_value() {
    let mut ctl = TabController::new();
    ctl.toggle_tag("Env:Prod");
    ctl.toggle_tag("Env:Prod");
    assert!(ctl.filters().is_permissive());
}

#[test]
fn test_set_page_keeps_everything_else() {
    let mut ctl = TabController::new();
    ctl.toggle_status("running");
    ctl.set_page(5);
    assert_eq!(ctl.page(), 5);
    assert!(ctl.filters().statuses.contains("running"));

    ctl.set_page(0);
    assert_eq!(ctl.page(), 1);
}

#[test]
fn test_actions_dispatch() {
    let mut ctl = TabController::new();
    ctl.apply(Action::SelectTab(Tab::Category(Category::EbsVolumes)));
    ctl.apply(Action::SelectRegion("us-east-1".to_string()));
    ctl.apply(Action::ToggleStatus("available".to_string()));
    ctl.apply(Action::SetMinSavings(Some(5.0)));
    ctl.apply(Action::SetPage(1));

    let catalog = sample_catalog();
    let view = ctl.view(&catalog);
    assert_eq!(ids(&view.page_records), vec!["vol-1"]);
}

#[test]
fn test_view_pages_through_aggregate() {
    let catalog = sample_catalog();
    let mut ctl = TabController::new();

    let view = ctl.view(&catalog);
    assert_eq!(view.total_records, 8);
    assert_eq!(view.total_pages, 2);
    assert_eq!(ids(&view.page_records), vec!["i-001", "i-002", "i-003", "orders-db"]);
    assert!(!view.has_previous);
    assert!(view.has_next);

    ctl.set_page(2);
    let view = ctl.view(&catalog);
    assert_eq!(
        ids(&view.page_records),
        vec!["vol-1", "vol-2", "orders-snap", "eipalloc-1"]
    );
    assert!(view.has_previous);
    assert!(!view.has_next);
}

#[test]
fn test_view_past_last_page_is_empty() {
    let catalog = sample_catalog();
    let mut ctl = TabController::new();
    ctl.set_page(7);
    let view = ctl.view(&catalog);
    assert!(view.page_records.is_empty());
    assert_eq!(view.current_page, 7);
    assert!(!view.has_next);
}

#[test]
fn test_empty_view_has_one_page() {
    let catalog = sample_catalog();
    let mut ctl = TabController::new();
    ctl.select_tab(Tab::Category(Category::Ec2Snapshots));
    let view = ctl.view(&catalog);
    assert_eq!(view.total_records, 0);
    assert_eq!(view.total_pages, 1);
    assert!(!view.has_previous);
    assert!(!view.has_next);
}

#[test]
fn test_view_facets_ignore_filters() {
    let catalog = sample_catalog();
    let mut ctl = TabController::new();
    let before = ctl.view(&catalog).facets;

    ctl.toggle_instance_type(TypeKey::instance_type("m5.large"));
    ctl.toggle_status("stopped");
    let view = ctl.view(&catalog);
    assert_eq!(view.total_records, 1);
    assert_eq!(view.facets, before);
}

#[test]
fn test_view_serializes_for_json_output() {
    let catalog = sample_catalog();
    let mut ctl = TabController::new();
    ctl.select_region("us-east-1");
    let value = serde_json::to_value(ctl.view(&catalog)).unwrap();
    assert_eq!(value["tab"], "all_resources");
    assert_eq!(value["region_context"], serde_json::json!(["us-east-1"]));
    assert_eq!(value["total_records"], 4);
    assert_eq!(value["page_records"][0]["instance_id"], "i-001");
}
