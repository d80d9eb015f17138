//! Export of the filtered record list

use crate::error::{Result, RmonError};
use crate::resources::card::{type_label, UNIDENTIFIED};
use crate::resources::types::{ResourceRecord, Tab};
use chrono::Utc;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Html,
    Json,
}

impl FromStr for ExportFormat {
    type Err = RmonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "html" => Ok(ExportFormat::Html),
            "json" => Ok(ExportFormat::Json),
            other => Err(RmonError::validation(
                "format",
                format!("Unsupported export format: {}. Use 'csv', 'html' or 'json'", other),
            )),
        }
    }
}

const COLUMNS: [&str; 8] = [
    "Category",
    "ID",
    "Type",
    "Region",
    "Status",
    "Potential Savings",
    "Tags",
    "Recommendations",
];

fn row(record: &ResourceRecord) -> [String; 8] {
    [
        record.category.key().to_string(),
        record.id.clone().unwrap_or_else(|| UNIDENTIFIED.to_string()),
        type_label(&record.sizing),
        record.region.clone(),
        record.status.clone().unwrap_or_default(),
        format!("{:.2}", record.potential_cost_savings),
        record
            .tags
            .iter()
            .map(|t| t.facet_key())
            .collect::<Vec<_>>()
            .join(";"),
        record.recommendations.clone(),
    ]
}

/// Render records in the requested format
pub fn render(format: ExportFormat, tab: Tab, records: &[&ResourceRecord]) -> Result<String> {
    match format {
        ExportFormat::Csv => Ok(generate_csv(records)),
        ExportFormat::Html => Ok(generate_html(tab, records)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
    }
}

/// Write to `file`, or to stdout when no file is given
pub fn export_records(
    format: ExportFormat,
    tab: Tab,
    records: &[&ResourceRecord],
    file: Option<&Path>,
) -> Result<()> {
    let output = render(format, tab, records)?;
    match file {
        Some(path) => {
            std::fs::write(path, output)?;
            println!("Exported {} records to {}", records.len(), path.display());
        }
        None => print!("{}", output),
    }
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn generate_csv(records: &[&ResourceRecord]) -> String {
    let mut csv = COLUMNS.join(",");
    csv.push('\n');
    for record in records {
        let fields: Vec<String> = row(record).iter().map(|f| csv_field(f)).collect();
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }
    csv
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn generate_html(tab: Tab, records: &[&ResourceRecord]) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>rmon Savings Report</title>
    <style>
        body { font-family: monospace; margin: 20px; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #4CAF50; color: white; }
        tr:nth-child(even) { background-color: #f2f2f2; }
        .savings { color: green; }
    </style>
</head>
<body>
"#,
    );
    let _ = writeln!(html, "    <h1>{}</h1>", html_escape(tab.label()));
    let _ = writeln!(
        html,
        "    <p>Generated: {}</p>",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    html.push_str("    <table>\n        <tr>");
    for column in COLUMNS {
        let _ = write!(html, "<th>{}</th>", column);
    }
    html.push_str("</tr>\n");

    for record in records {
        let cells = row(record);
        html.push_str("        <tr>");
        for (idx, cell) in cells.iter().enumerate() {
            if COLUMNS[idx] == "Potential Savings" {
                let _ = write!(html, "<td class=\"savings\">${}</td>", html_escape(cell));
            } else {
                let _ = write!(html, "<td>{}</td>", html_escape(cell));
            }
        }
        html.push_str("</tr>\n");
    }

    html.push_str("    </table>\n</body>\n</html>\n");
    html
}
