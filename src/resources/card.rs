//! Card and detail rendering for a single record

use crate::resources::types::{ResourceRecord, Sizing, Tag};
use crate::utils::{format_money, split_links, TextSegment};
use serde::Serialize;
use serde_json::Value;

/// Placeholder title for records without any identifier field
pub const UNIDENTIFIED: &str = "(unidentified)";

/// Compact summary shown in the card grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceCard {
    pub title: String,
    pub type_label: String,
    pub region: String,
    pub savings: String,
}

impl ResourceCard {
    pub fn from_record(record: &ResourceRecord) -> Self {
        Self {
            title: record.id.clone().unwrap_or_else(|| UNIDENTIFIED.to_string()),
            type_label: type_label(&record.sizing),
            region: record.region.clone(),
            savings: format_money(record.potential_cost_savings),
        }
    }
}

/// `instance_type`, `db_instance_class`, `EBS {size}GB` or `-`
pub fn type_label(sizing: &Sizing) -> String {
    match sizing {
        Sizing::InstanceType(t) => t.clone(),
        Sizing::DbInstanceClass(c) => c.clone(),
        Sizing::VolumeSize(size) => format!("EBS {}GB", size),
        Sizing::Unspecified => "-".to_string(),
    }
}

/// Rendered value of one raw field in the detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DetailValue {
    Text(String),
    Segments(Vec<TextSegment>),
}

impl DetailValue {
    /// Flatten to display text (links are shown inline)
    pub fn to_plain(&self) -> String {
        match self {
            DetailValue::Text(text) => text.clone(),
            DetailValue::Segments(segments) => segments
                .iter()
                .map(|s| match s {
                    TextSegment::Text(t) | TextSegment::Link(t) => t.as_str(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub key: String,
    pub value: DetailValue,
}

/// Every raw field of the record, in the order the backend sent them
pub fn detail_rows(record: &ResourceRecord) -> Vec<DetailRow> {
    record
        .fields()
        .iter()
        .map(|(key, value)| DetailRow {
            key: key.clone(),
            value: render_value(key, value),
        })
        .collect()
}

fn render_value(key: &str, value: &Value) -> DetailValue {
    match (key, value) {
        ("recommendations", Value::String(text)) => DetailValue::Segments(split_links(text)),
        ("tags", Value::Array(items)) => DetailValue::Text(
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<Tag>(item.clone()).ok())
                .map(|tag| format!("{}: {}", tag.key, tag.value))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        (_, Value::Object(_)) | (_, Value::Array(_)) => DetailValue::Text(
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
        ),
        (_, Value::String(s)) => DetailValue::Text(s.clone()),
        (_, Value::Null) => DetailValue::Text(String::new()),
        (_, other) => DetailValue::Text(other.to_string()),
    }
}
