//! Resource catalog: filtering, faceting and pagination
//!
//! The catalog is fetched once per session and never mutated. Everything a
//! screen shows is derived from it plus the `TabController` state:
//! region-scoped facets, filtered per-category lists, the aggregate and the
//! current page.

pub mod card;
pub mod export;
pub mod facets;
pub mod filter;
pub mod pagination;
pub mod region;
pub mod summary;
pub mod tabs;
pub mod types;
pub mod view;

use crate::api::source::{regions_from_catalog, write_snapshot};
use crate::api::CatalogSource;
use crate::error::{Result, RmonError};
use crate::resources::card::{detail_rows, DetailValue, ResourceCard};
use crate::resources::export::ExportFormat;
use crate::resources::facets::{compute_facets, has_more, preview, FacetSet};
use crate::resources::filter::{compute_filtered, parse_bound, FacetEntry, FacetKind, FilterState};
use crate::resources::pagination::clamp_page;
use crate::resources::region::RegionContext;
use crate::resources::summary::SavingsSummary;
use crate::resources::tabs::TabController;
use crate::resources::types::{ResourceCatalog, Tab, TypeKey};
use crate::resources::view::ViewModel;
use crate::utils::{truncate, OutputFormat};
use clap::{Args, Subcommand};
use comfy_table::Table;
use console::style;
use indexmap::IndexSet;
use std::path::PathBuf;
use tracing::warn;

/// Notice shown when the catalog could not be loaded
pub const LOAD_FAILED_NOTICE: &str = "Failed to load resource data. Please try again later.";

#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    /// Category tab (all_resources, ec2_instances, rds_instances, ebs_volumes,
    /// rds_snapshots, ec2_snapshots, elastic_ips)
    #[arg(long, default_value = "all_resources")]
    pub tab: String,
    /// Region to include (repeatable; omit or pass Global for all regions)
    #[arg(long = "region")]
    pub regions: Vec<String>,
    /// Instance type or DB instance class (repeatable; `db.` values are RDS classes)
    #[arg(long = "instance-type")]
    pub instance_types: Vec<String>,
    /// Tag as Key:Value (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Status (repeatable)
    #[arg(long = "status")]
    pub statuses: Vec<String>,
    /// Minimum potential cost savings (inclusive)
    #[arg(long)]
    pub min_savings: Option<String>,
    /// Maximum potential cost savings (inclusive)
    #[arg(long)]
    pub max_savings: Option<String>,
    /// Page number (1-based, 4 records per page)
    #[arg(long, default_value = "1")]
    pub page: usize,
}

impl FilterArgs {
    /// Replay the arguments through a controller, in the order a user would
    /// click: tab, regions, filters, then page
    pub fn controller(&self) -> Result<TabController> {
        let mut ctl = TabController::new();
        ctl.select_tab(self.tab.parse::<Tab>()?);
        ctl.set_regions(RegionContext::from_regions(self.regions.iter().cloned()));

        // Repeated flags name a set; only toggle values not yet selected
        for value in &self.instance_types {
            let key = value.parse::<TypeKey>()?;
            if !ctl.filters().instance_types.contains(&key) {
                ctl.toggle_instance_type(key);
            }
        }
        for tag in &self.tags {
            if !tag.contains(':') {
                return Err(RmonError::validation(
                    "tag",
                    format!("'{}' is not in Key:Value form", tag),
                ));
            }
            if !ctl.filters().tags.contains(tag) {
                ctl.toggle_tag(tag.as_str());
            }
        }
        for status in &self.statuses {
            if !ctl.filters().statuses.contains(status) {
                ctl.toggle_status(status.as_str());
            }
        }
        if let Some(min) = &self.min_savings {
            ctl.set_min_savings(parse_bound("min_savings", min)?);
        }
        if let Some(max) = &self.max_savings {
            ctl.set_max_savings(parse_bound("max_savings", max)?);
        }
        ctl.set_page(self.page);
        Ok(ctl)
    }

    /// Controller with the requested page clamped into range for `catalog`
    pub fn controller_for(&self, catalog: &ResourceCatalog) -> Result<TabController> {
        let mut ctl = self.controller()?;
        let total = ctl.view(catalog).total_pages;
        let page = clamp_page(ctl.page(), total);
        if page != ctl.page() {
            warn!("Page {} out of range, showing page {} of {}", ctl.page(), page, total);
            ctl.set_page(page);
        }
        Ok(ctl)
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum ResourceCommands {
    /// List one page of resource cards
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Show every field of each record
        #[arg(short, long)]
        details: bool,
    },
    /// Show the filter values available for a tab and region selection
    Facets {
        #[command(flatten)]
        filters: FilterArgs,
        /// Show every value instead of a preview
        #[arg(long)]
        all: bool,
    },
    /// Potential savings per category for the filtered view
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export every filtered record of the tab (all pages)
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Export format (csv, html, json)
        #[arg(long, default_value = "csv")]
        format: String,
        /// Output file (stdout if omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Save the catalog and region list for offline use with --snapshot
    Snapshot {
        /// Destination file
        #[arg(long)]
        file: PathBuf,
    },
}

/// What `handle_command` needs from the caller
pub struct CommandContext<'a> {
    pub source: &'a dyn CatalogSource,
    pub output: OutputFormat,
    pub facet_preview_count: usize,
}

/// Fetch the catalog; an unavailable source yields an empty catalog and a notice
pub async fn load_catalog(source: &dyn CatalogSource) -> Result<(ResourceCatalog, Option<String>)> {
    match source.fetch_catalog().await {
        Ok(catalog) => Ok((catalog, None)),
        Err(e @ RmonError::SourceUnavailable { .. }) => {
            warn!("Catalog from {} unavailable: {}", source.name(), e);
            Ok((ResourceCatalog::new(), Some(LOAD_FAILED_NOTICE.to_string())))
        }
        Err(e) => Err(e),
    }
}

/// Load the catalog for display, reporting a failed load on stderr
async fn catalog_with_notice(source: &dyn CatalogSource) -> Result<ResourceCatalog> {
    let (catalog, notice) = load_catalog(source).await?;
    if let Some(notice) = notice {
        eprintln!("{} {}", style("WARNING:").yellow().bold(), notice);
    }
    Ok(catalog)
}

pub async fn handle_command(cmd: ResourceCommands, ctx: &CommandContext<'_>) -> Result<()> {
    match cmd {
        ResourceCommands::List { filters, details } => {
            let catalog = catalog_with_notice(ctx.source).await?;
            let ctl = filters.controller_for(&catalog)?;
            let view = ctl.view(&catalog);
            match ctx.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Table => print_view_table(&view),
                OutputFormat::Text => print_view_text(&view, details),
            }
        }
        ResourceCommands::Facets { filters, all } => {
            let catalog = catalog_with_notice(ctx.source).await?;
            let ctl = filters.controller()?;
            let facets = compute_facets(&catalog, ctl.active(), ctl.region());
            match ctx.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&facets)?),
                OutputFormat::Text | OutputFormat::Table => print_facets(
                    &facets,
                    ctl.filters(),
                    all,
                    ctx.facet_preview_count,
                ),
            }
        }
        ResourceCommands::Summary { filters } => {
            let catalog = catalog_with_notice(ctx.source).await?;
            let ctl = filters.controller()?;
            let filtered = compute_filtered(&catalog, ctl.region(), ctl.filters());
            let summary = SavingsSummary::from_filtered(&filtered);
            match ctx.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text | OutputFormat::Table => summary.print(),
            }
        }
        ResourceCommands::Export {
            filters,
            format,
            file,
        } => {
            let format = format.parse::<ExportFormat>()?;
            let catalog = catalog_with_notice(ctx.source).await?;
            let ctl = filters.controller()?;
            let filtered = compute_filtered(&catalog, ctl.region(), ctl.filters());
            export::export_records(format, ctl.active(), filtered.tab(ctl.active()), file.as_deref())?;
        }
        ResourceCommands::Snapshot { file } => {
            let catalog = ctx.source.fetch_catalog().await?;
            let regions = match ctx.source.fetch_regions().await {
                Ok(regions) => regions,
                Err(e) => {
                    warn!("Region list unavailable ({}); deriving from records", e);
                    regions_from_catalog(&catalog)
                }
            };
            write_snapshot(&file, &catalog, &regions)?;
            println!("Saved {} records to {}", catalog.len(), file.display());
        }
    }
    Ok(())
}

fn print_view_text(view: &ViewModel<'_>, details: bool) {
    println!(
        "{} | {} | page {} of {} ({} records)",
        style(view.tab.label()).bold().cyan(),
        view.region_context,
        view.current_page,
        view.total_pages,
        view.total_records
    );
    println!();

    if view.page_records.is_empty() {
        println!("No resources found.");
    }
    for record in &view.page_records {
        let card = ResourceCard::from_record(record);
        println!("{}", style(&card.title).bold());
        println!("  Type: {}", card.type_label);
        println!("  Region: {}", card.region);
        println!("  Potential Cost Savings: {}", style(&card.savings).green());
        if details {
            for row in detail_rows(record) {
                match &row.value {
                    DetailValue::Text(text) if text.contains('\n') => {
                        println!("    {}:", row.key);
                        for line in text.lines() {
                            println!("      {}", line);
                        }
                    }
                    value => println!("    {}: {}", row.key, value.to_plain()),
                }
            }
        }
        println!();
    }

    let prev = if view.has_previous { "--page N-1" } else { "(first page)" };
    let next = if view.has_next { "--page N+1" } else { "(last page)" };
    println!("{}  {}", style(prev).dim(), style(next).dim());
}

fn print_view_table(view: &ViewModel<'_>) {
    let mut table = Table::new();
    table.set_header(vec!["Resource", "Type", "Region", "Potential Savings"]);
    for record in &view.page_records {
        let card = ResourceCard::from_record(record);
        table.add_row(vec![
            truncate(&card.title, 40),
            card.type_label,
            card.region,
            card.savings,
        ]);
    }
    println!("{}", table);
    println!(
        "Page {} of {} ({} records)",
        view.current_page, view.total_pages, view.total_records
    );
}

fn print_facet_section<T>(
    kind: FacetKind,
    values: &IndexSet<T>,
    entry: impl Fn(&T) -> FacetEntry,
    filters: &FilterState,
    expanded: bool,
    count: usize,
) {
    if values.is_empty() {
        return;
    }
    println!("{}", style(kind.title()).bold());
    for value in preview(values, expanded, count) {
        let entry = entry(value);
        let mark = if filters.is_selected(&entry) { "[x]" } else { "[ ]" };
        println!("  {} {}", mark, entry.label());
    }
    if !expanded && has_more(values, count) {
        println!("  {}", style(format!("... {} more (--all)", values.len() - count)).dim());
    }
}

fn print_facets(facets: &FacetSet, filters: &FilterState, all: bool, count: usize) {
    if facets.is_empty() {
        println!("No filters available.");
        return;
    }
    print_facet_section(
        FacetKind::InstanceTypes,
        &facets.instance_types,
        |k| FacetEntry::Type(k.clone()),
        filters,
        all,
        count,
    );
    print_facet_section(
        FacetKind::Tags,
        &facets.tags,
        |t| FacetEntry::Tag(t.clone()),
        filters,
        all,
        count,
    );
    print_facet_section(
        FacetKind::Statuses,
        &facets.statuses,
        |s| FacetEntry::Status(s.clone()),
        filters,
        all,
        count,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args() -> FilterArgs {
        FilterArgs {
            tab: "all_resources".to_string(),
            page: 1,
            ..FilterArgs::default()
        }
    }

    #[test]
    fn test_filter_args_build_controller() {
        let filters = FilterArgs {
            tab: "ec2-instances".to_string(),
            regions: vec!["us-east-1".to_string()],
            instance_types: vec!["t3.micro".to_string(), "db.t3.small".to_string()],
            tags: vec!["Env:Prod".to_string()],
            min_savings: Some("5".to_string()),
            max_savings: Some("".to_string()),
            page: 2,
            ..args()
        };
        let ctl = filters.controller().unwrap();
        assert_eq!(ctl.active(), Tab::Category(crate::resources::types::Category::Ec2Instances));
        assert!(ctl.region().is_selected("us-east-1"));
        assert_eq!(ctl.filters().instance_types.len(), 2);
        assert!(ctl
            .filters()
            .instance_types
            .contains(&TypeKey::db_instance_class("db.t3.small")));
        assert_eq!(ctl.filters().cost_savings.min, Some(5.0));
        assert_eq!(ctl.filters().cost_savings.max, None);
        // Page is applied last so the filter resets do not clobber it
        assert_eq!(ctl.page(), 2);
    }

    #[test]
    fn test_repeated_flags_select_once() {
        let catalog = ResourceCatalog::from_json(json!({
            "ec2_instances": [
                {"instance_id": "i-1", "instance_type": "t3.micro", "region": "us-east-1",
                 "status": "running", "tags": [{"Key": "Env", "Value": "Prod"}]},
                {"instance_id": "i-2", "instance_type": "m5.large", "region": "us-east-1",
                 "status": "stopped"}
            ]
        }))
        .unwrap();
        let filters = FilterArgs {
            statuses: vec!["running".to_string(), "running".to_string()],
            tags: vec!["Env:Prod".to_string(), "Env:Prod".to_string()],
            instance_types: vec!["t3.micro".to_string(), "instance_type:t3.micro".to_string()],
            ..args()
        };
        let ctl = filters.controller_for(&catalog).unwrap();
        assert_eq!(ctl.filters().statuses.len(), 1);
        assert_eq!(ctl.filters().tags.len(), 1);
        assert_eq!(ctl.filters().instance_types.len(), 1);
        assert_eq!(ctl.view(&catalog).total_records, 1);
    }

    #[test]
    fn test_filter_args_reject_bad_input() {
        let bad_tag = FilterArgs {
            tags: vec!["EnvProd".to_string()],
            ..args()
        };
        assert!(matches!(bad_tag.controller(), Err(RmonError::Validation { .. })));

        let bad_bound = FilterArgs {
            min_savings: Some("lots".to_string()),
            ..args()
        };
        assert!(matches!(bad_bound.controller(), Err(RmonError::Validation { .. })));
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let catalog = ResourceCatalog::from_json(json!({
            "ec2_instances": [{"instance_id": "i-1", "region": "us-east-1"}]
        }))
        .unwrap();
        let filters = FilterArgs { page: 9, ..args() };
        let ctl = filters.controller_for(&catalog).unwrap();
        assert_eq!(ctl.page(), 1);
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl CatalogSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_catalog(&self) -> Result<ResourceCatalog> {
            Err(RmonError::unavailable("all-resources", "HTTP 500"))
        }

        async fn fetch_regions(&self) -> Result<Vec<region::RegionSummary>> {
            Err(RmonError::Auth("not logged in".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unavailable_source_yields_empty_catalog_and_notice() {
        let (catalog, notice) = load_catalog(&FailingSource).await.unwrap();
        assert!(catalog.is_empty());
        assert_eq!(notice.as_deref(), Some(LOAD_FAILED_NOTICE));
    }
}
