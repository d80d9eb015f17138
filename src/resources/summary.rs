//! Savings summary for the filtered view

use crate::resources::filter::FilteredCatalog;
use crate::resources::types::Category;
use crate::utils::format_money;
use comfy_table::{Cell, Color, Table};
use console::style;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySavings {
    pub category: Category,
    pub label: &'static str,
    pub count: usize,
    pub total_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsSummary {
    pub categories: Vec<CategorySavings>,
    pub total_count: usize,
    pub total_savings: f64,
}

impl SavingsSummary {
    pub fn from_filtered(filtered: &FilteredCatalog<'_>) -> Self {
        let categories: Vec<CategorySavings> = Category::all()
            .iter()
            .map(|category| {
                let records = filtered.category(*category);
                CategorySavings {
                    category: *category,
                    label: category.label(),
                    count: records.len(),
                    total_savings: records
                        .iter()
                        .fold(0.0, |acc, r| acc + r.potential_cost_savings),
                }
            })
            .collect();

        Self {
            total_count: categories.iter().map(|c| c.count).sum(),
            // f64 `sum` of nothing is -0.0, which prints as "$-0.00"
            total_savings: categories.iter().fold(0.0, |acc, c| acc + c.total_savings),
            categories,
        }
    }

    /// Category with the largest potential savings, if any has savings at all
    pub fn top_category(&self) -> Option<&CategorySavings> {
        self.categories
            .iter()
            .filter(|c| c.total_savings > 0.0)
            .max_by(|a, b| a.total_savings.total_cmp(&b.total_savings))
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Category", "Resources", "Potential Savings"]);
        for entry in &self.categories {
            let savings = Cell::new(format_money(entry.total_savings));
            let savings = if entry.total_savings > 0.0 {
                savings.fg(Color::Green)
            } else {
                savings
            };
            table.add_row(vec![Cell::new(entry.label), Cell::new(entry.count), savings]);
        }
        table.add_row(vec![
            Cell::new("Total"),
            Cell::new(self.total_count),
            Cell::new(format_money(self.total_savings)),
        ]);
        table
    }

    pub fn print(&self) {
        println!("{}", style("Potential Cost Savings").bold().cyan());
        println!("{}", self.to_table());
        if let Some(top) = self.top_category() {
            println!(
                "\n{} {} ({} across {} resources)",
                style("Largest opportunity:").bold(),
                top.label,
                format_money(top.total_savings),
                top.count
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::filter::{compute_filtered, FilterState};
    use crate::resources::region::RegionContext;
    use crate::resources::types::ResourceCatalog;
    use serde_json::json;

    #[test]
    fn test_summary_totals() {
        let catalog = ResourceCatalog::from_json(json!({
            "ec2_instances": [
                {"instance_id": "i-1", "region": "us-east-1", "potential_cost_savings": 10.0},
                {"instance_id": "i-2", "region": "us-west-2", "potential_cost_savings": 5.5}
            ],
            "elastic_ips": [
                {"allocation_id": "eip-1", "region": "us-east-1", "potential_cost_savings": 3.6}
            ]
        }))
        .unwrap();

        let filtered = compute_filtered(&catalog, &RegionContext::Global, &FilterState::default());
        let summary = SavingsSummary::from_filtered(&filtered);
        assert_eq!(summary.categories.len(), 6);
        assert_eq!(summary.total_count, 3);
        assert!((summary.total_savings - 19.1).abs() < 1e-9);
        assert_eq!(summary.top_category().unwrap().category, Category::Ec2Instances);

        let east = RegionContext::from_regions(["us-east-1"]);
        let filtered = compute_filtered(&catalog, &east, &FilterState::default());
        let summary = SavingsSummary::from_filtered(&filtered);
        assert_eq!(summary.total_count, 2);
        assert!((summary.total_savings - 13.6).abs() < 1e-9);
    }

    #[test]
    fn test_summary_of_empty_view() {
        let catalog = ResourceCatalog::new();
        let filtered = compute_filtered(&catalog, &RegionContext::Global, &FilterState::default());
        let summary = SavingsSummary::from_filtered(&filtered);
        assert_eq!(summary.total_count, 0);
        assert!(summary.top_category().is_none());
        assert!(summary.to_table().to_string().contains("Total"));
    }

    #[test]
    fn test_empty_totals_print_as_positive_zero() {
        let catalog = ResourceCatalog::from_json(json!({
            "ec2_instances": [
                {"instance_id": "i-1", "region": "us-east-1", "potential_cost_savings": 10.0}
            ]
        }))
        .unwrap();
        let mut filters = FilterState::default();
        filters.toggle_status("terminated");
        for filters in [FilterState::default(), filters] {
            let region = RegionContext::from_regions(["eu-west-1"]);
            let summary = SavingsSummary::from_filtered(&compute_filtered(&catalog, &region, &filters));
            assert!(summary.total_savings.is_sign_positive());
            assert_eq!(format_money(summary.total_savings), "$0.00");
            for entry in &summary.categories {
                assert_eq!(format_money(entry.total_savings), "$0.00");
            }
            assert!(!summary.to_table().to_string().contains("$-0.00"));
        }

        let summary = SavingsSummary::from_filtered(&compute_filtered(
            &ResourceCatalog::new(),
            &RegionContext::Global,
            &FilterState::default(),
        ));
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("-0.0"));
    }
}
