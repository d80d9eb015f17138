//! Cost explorer: latest cumulative costs and historical series

use crate::error::{Result, RmonError};
use crate::utils::{format_money, title_case};
use chrono::{Days, NaiveDate};
use comfy_table::{Cell, Table};
use console::style;
use serde::Serialize;
use serde_json::Value;

pub const LAST_UPDATED_KEY: &str = "last_updated";

/// One labelled cost figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostCard {
    pub key: String,
    pub label: String,
    pub amount: f64,
}

/// Latest cumulative cost per service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestCost {
    pub cards: Vec<CostCard>,
    pub last_updated: Option<String>,
}

impl LatestCost {
    /// Every numeric field except `last_updated`, in response order
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(RmonError::unavailable(
                "latest-cumulative-cost",
                "expected a JSON object",
            ));
        };

        let last_updated = map
            .get(LAST_UPDATED_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        let cards = map
            .iter()
            .filter(|(key, _)| key.as_str() != LAST_UPDATED_KEY)
            .filter_map(|(key, value)| {
                value.as_f64().map(|amount| CostCard {
                    key: key.clone(),
                    label: title_case(key),
                    amount,
                })
            })
            .collect();

        Ok(Self { cards, last_updated })
    }

    pub fn print(&self) {
        println!("{}", style("Latest Cumulative Cost").bold().cyan());
        let mut table = Table::new();
        table.set_header(vec!["Service", "Cost"]);
        for card in &self.cards {
            table.add_row(vec![Cell::new(&card.label), Cell::new(format_money(card.amount))]);
        }
        println!("{}", table);
        if let Some(updated) = &self.last_updated {
            println!("Last updated: {}", updated);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSeries {
    pub key: String,
    pub label: String,
    pub values: Vec<f64>,
}

/// Historical costs for a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostHistory {
    Series { series: Vec<CostSeries> },
    NoData { message: String },
}

impl CostHistory {
    pub fn no_data(message: impl Into<String>) -> Self {
        let message = message.into();
        CostHistory::NoData {
            message: if message.is_empty() {
                "No cost data available for the selected range".to_string()
            } else {
                message
            },
        }
    }

    /// Array-valued fields become series; everything else is ignored
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(RmonError::unavailable(
                "cumulative-cost-range",
                "expected a JSON object",
            ));
        };
        if let Some(message) = map.get("message").and_then(Value::as_str) {
            return Ok(CostHistory::no_data(message));
        }

        let series = map
            .iter()
            .filter_map(|(key, value)| {
                let items = value.as_array()?;
                Some(CostSeries {
                    key: key.clone(),
                    label: title_case(key),
                    values: items.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect(),
                })
            })
            .collect();
        Ok(CostHistory::Series { series })
    }

    /// Number of days covered by the longest series
    pub fn days(&self) -> usize {
        match self {
            CostHistory::Series { series } => {
                series.iter().map(|s| s.values.len()).max().unwrap_or(0)
            }
            CostHistory::NoData { .. } => 0,
        }
    }

    pub fn print(&self, start: NaiveDate) {
        println!("{}", style("Cost History").bold().cyan());
        match self {
            CostHistory::NoData { message } => println!("{}", message),
            CostHistory::Series { series } => {
                let labels = day_labels(start, self.days());
                let mut table = Table::new();
                let mut header = vec!["Service".to_string()];
                header.extend(labels);
                table.set_header(header);
                for s in series {
                    let mut row = vec![Cell::new(&s.label)];
                    row.extend(s.values.iter().map(|v| Cell::new(format_money(*v))));
                    table.add_row(row);
                }
                println!("{}", table);
            }
        }
    }
}

/// `count` consecutive day labels (`MMM dd`) starting at `start`
pub fn day_labels(start: NaiveDate, count: usize) -> Vec<String> {
    (0..count as u64)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .map(|day| day.format("%b %d").to_string())
        .collect()
}

/// Yesterday through tomorrow
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    let end = today.checked_add_days(Days::new(1)).unwrap_or(today);
    (start, end)
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(field: &str, input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        RmonError::validation(field, format!("'{}' is not a YYYY-MM-DD date", input))
    })
}
