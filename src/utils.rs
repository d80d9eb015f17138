use clap::ValueEnum;
use regex::Regex;
use std::sync::OnceLock;

/// Output format of CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

/// Format a dollar amount the way the dashboard shows savings
pub fn format_money(amount: f64) -> String {
    format!("${:.2}", amount)
}

/// `ec2_snapshots_cost` -> `Ec2 Snapshots Cost`
pub fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Piece of free text that is either plain text or a URL
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum TextSegment {
    Text(String),
    Link(String),
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("static URL pattern compiles"))
}

/// Split text into plain and link segments, preserving every character
pub fn split_links(text: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for found in url_pattern().find_iter(text) {
        if found.start() > last {
            segments.push(TextSegment::Text(text[last..found.start()].to_string()));
        }
        segments.push(TextSegment::Link(found.as_str().to_string()));
        last = found.end();
    }
    if last < text.len() {
        segments.push(TextSegment::Text(text[last..].to_string()));
    }
    segments
}

/// Truncate to `max` characters, appending an ellipsis when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
