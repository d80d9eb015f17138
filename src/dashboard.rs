//! Interactive dashboard for browsing cost-saving findings
//!
//! Provides a ratatui-based dashboard showing:
//! - Category tabs, All Resources first
//! - Region selection and the facet filters available for it
//! - One page of resource cards with a detail popup
//!
//! Every state change goes through the `TabController`, so the reset rules
//! hold no matter which key triggered the change.

use crate::api::{AccountDetails, CatalogSource};
use crate::error::Result;
use crate::resources::card::{detail_rows, DetailValue, ResourceCard};
use crate::resources::facets::{has_more, preview, FacetSet};
use crate::resources::filter::{parse_bound, FacetEntry, FacetKind};
use crate::resources::load_catalog;
use crate::resources::region::{selectable_regions, RegionSummary, GLOBAL};
use crate::resources::tabs::TabController;
use crate::resources::types::{ResourceCatalog, Tab};
use crate::resources::view::ViewModel;
use crate::utils::{format_money, TextSegment};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::collections::HashSet;
use std::io;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Cards,
    Facets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

pub struct DashboardState {
    controller: TabController,
    regions: Vec<RegionSummary>,
    account: Option<AccountDetails>,
    notice: Option<String>,
    focus: Focus,
    card_cursor: usize,
    facet_cursor: usize,
    expanded: HashSet<FacetKind>,
    detail_open: bool,
    editing: Option<(Bound, String)>,
    status_message: Option<String>,
    preview_count: usize,
}

impl DashboardState {
    pub fn new(regions: Vec<RegionSummary>, preview_count: usize) -> Self {
        let regions = selectable_regions(&regions).into_iter().cloned().collect();
        Self {
            controller: TabController::new(),
            regions,
            account: None,
            notice: None,
            focus: Focus::Cards,
            card_cursor: 0,
            facet_cursor: 0,
            expanded: HashSet::new(),
            detail_open: false,
            editing: None,
            status_message: None,
            preview_count: preview_count.max(1),
        }
    }

    pub fn with_account(mut self, account: Option<AccountDetails>) -> Self {
        self.account = account;
        self
    }

    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }

    pub fn controller(&self) -> &TabController {
        &self.controller
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn detail_open(&self) -> bool {
        self.detail_open
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Facet lines currently shown (respecting preview/expansion)
    pub fn facet_entries(&self, facets: &FacetSet) -> Vec<FacetEntry> {
        let mut entries = Vec::new();
        let count = self.preview_count;
        let expanded = |kind: FacetKind| self.expanded.contains(&kind);
        entries.extend(
            preview(&facets.instance_types, expanded(FacetKind::InstanceTypes), count)
                .into_iter()
                .map(|k| FacetEntry::Type(k.clone())),
        );
        entries.extend(
            preview(&facets.tags, expanded(FacetKind::Tags), count)
                .into_iter()
                .map(|t| FacetEntry::Tag(t.clone())),
        );
        entries.extend(
            preview(&facets.statuses, expanded(FacetKind::Statuses), count)
                .into_iter()
                .map(|s| FacetEntry::Status(s.clone())),
        );
        entries
    }

    fn reset_cursors(&mut self) {
        self.card_cursor = 0;
        self.facet_cursor = 0;
        self.detail_open = false;
    }

    fn select_tab(&mut self, tab: Tab) {
        self.controller.select_tab(tab);
        self.expanded.clear();
        self.reset_cursors();
    }

    fn select_region(&mut self, region: &str) {
        self.controller.select_region(region);
        self.reset_cursors();
    }

    pub fn handle_key(&mut self, catalog: &ResourceCatalog, code: KeyCode) -> KeyOutcome {
        if self.editing.is_some() {
            self.handle_edit_key(code);
            return KeyOutcome::Continue;
        }
        if self.detail_open {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.detail_open = false;
            }
            return KeyOutcome::Continue;
        }

        self.status_message = None;
        let view = self.controller.view(catalog);
        let page_len = view.page_records.len();
        let (has_next, has_previous) = (view.has_next, view.has_previous);
        let entries = self.facet_entries(&view.facets);
        let facets = view.facets.clone();
        drop(view);

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return KeyOutcome::Quit,
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => {
                self.select_tab(self.controller.active().next());
            }
            KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => {
                self.select_tab(self.controller.active().prev());
            }
            KeyCode::Char('n') if has_next => {
                self.controller.set_page(self.controller.page() + 1);
                self.card_cursor = 0;
            }
            KeyCode::Char('p') if has_previous => {
                self.controller.set_page(self.controller.page() - 1);
                self.card_cursor = 0;
            }
            KeyCode::Char('g') => self.select_region(GLOBAL),
            KeyCode::Char(c @ '1'..='9') => {
                let idx = c as usize - '1' as usize;
                if let Some(region) = self.regions.get(idx).map(|r| r.name.clone()) {
                    self.select_region(&region);
                }
            }
            KeyCode::Char('f') => {
                self.focus = match self.focus {
                    Focus::Cards => Focus::Facets,
                    Focus::Facets => Focus::Cards,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => match self.focus {
                Focus::Cards => self.card_cursor = self.card_cursor.saturating_sub(1),
                Focus::Facets => self.facet_cursor = self.facet_cursor.saturating_sub(1),
            },
            KeyCode::Down | KeyCode::Char('j') => match self.focus {
                Focus::Cards if self.card_cursor + 1 < page_len => self.card_cursor += 1,
                Focus::Facets if self.facet_cursor + 1 < entries.len() => self.facet_cursor += 1,
                _ => {}
            },
            KeyCode::Char(' ') | KeyCode::Enter => match self.focus {
                Focus::Cards if page_len > 0 => self.detail_open = true,
                Focus::Facets => {
                    if let Some(entry) = entries.get(self.facet_cursor) {
                        match entry.clone() {
                            FacetEntry::Type(key) => self.controller.toggle_instance_type(key),
                            FacetEntry::Tag(tag) => self.controller.toggle_tag(tag),
                            FacetEntry::Status(status) => self.controller.toggle_status(status),
                        }
                        self.card_cursor = 0;
                    }
                }
                _ => {}
            },
            KeyCode::Char('e') if self.focus == Focus::Facets => {
                if let Some(kind) = entries.get(self.facet_cursor).map(FacetEntry::kind) {
                    let more = match kind {
                        FacetKind::InstanceTypes => has_more(&facets.instance_types, self.preview_count),
                        FacetKind::Tags => has_more(&facets.tags, self.preview_count),
                        FacetKind::Statuses => has_more(&facets.statuses, self.preview_count),
                    };
                    if more && !self.expanded.remove(&kind) {
                        self.expanded.insert(kind);
                    }
                    self.facet_cursor = 0;
                }
            }
            KeyCode::Char('m') => self.start_edit(Bound::Min),
            KeyCode::Char('M') => self.start_edit(Bound::Max),
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn start_edit(&mut self, bound: Bound) {
        let current = match bound {
            Bound::Min => self.controller.filters().cost_savings.min,
            Bound::Max => self.controller.filters().cost_savings.max,
        };
        self.editing = Some((bound, current.map(|v| v.to_string()).unwrap_or_default()));
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some((bound, buffer)) = self.editing.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Esc => self.editing = None,
            KeyCode::Enter => {
                let (bound, input) = (*bound, buffer.clone());
                let field = match bound {
                    Bound::Min => "min_savings",
                    Bound::Max => "max_savings",
                };
                match parse_bound(field, &input) {
                    Ok(value) => {
                        match bound {
                            Bound::Min => self.controller.set_min_savings(value),
                            Bound::Max => self.controller.set_max_savings(value),
                        }
                        self.card_cursor = 0;
                        self.editing = None;
                    }
                    Err(e) => self.status_message = Some(e.to_string()),
                }
            }
            _ => {}
        }
    }
}

/// Load data once, then run the input/render loop until the user quits
pub async fn run_dashboard(
    source: &dyn CatalogSource,
    account: Option<AccountDetails>,
    poll_interval: Duration,
    preview_count: usize,
) -> Result<()> {
    let (catalog, notice) = load_catalog(source).await?;
    let regions = match source.fetch_regions().await {
        Ok(regions) => regions,
        Err(e) => {
            warn!("Region list unavailable: {}", e);
            Vec::new()
        }
    };
    let mut state = DashboardState::new(regions, preview_count)
        .with_account(account)
        .with_notice(notice);

    let mut terminal = init_terminal()?;
    let result = event_loop(&mut terminal, &mut state, &catalog, poll_interval);
    restore_terminal(&mut terminal)?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut DashboardState,
    catalog: &ResourceCatalog,
    poll_interval: Duration,
) -> Result<()> {
    loop {
        terminal.draw(|f| render_dashboard(f, state, catalog))?;

        if event::poll(poll_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && state.handle_key(catalog, key.code) == KeyOutcome::Quit
                {
                    return Ok(());
                }
            }
        }
    }
}

fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn render_dashboard(f: &mut Frame, state: &DashboardState, catalog: &ResourceCatalog) {
    let size = f.size();
    let view = state.controller.view(catalog);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(size);

    render_header(f, chunks[0], state);

    let tabs = Tab::all();
    let selected = tabs
        .iter()
        .position(|t| *t == view.tab)
        .unwrap_or(0);
    let tab_bar = Tabs::new(tabs.iter().map(|t| t.label()).collect::<Vec<_>>())
        .block(Block::default().borders(Borders::ALL))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(header_style());
    f.render_widget(tab_bar, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[2]);
    render_facets(f, body[0], state, &view);
    render_cards(f, body[1], state, &view);
    render_footer(f, chunks[3], state, &view);

    if state.detail_open {
        if let Some(record) = view.page_records.get(state.card_cursor) {
            render_detail(f, size, record);
        }
    }
}

fn render_header(f: &mut Frame, area: Rect, state: &DashboardState) {
    let title = match &state.account {
        Some(account) => format!(
            "rmon | {} ({})",
            account.project_name, account.account_id
        ),
        None => "rmon".to_string(),
    };

    let mut spans = vec![Span::styled("Regions: ", Style::default().fg(Color::Cyan))];
    let global_style = if state.controller.region().is_global() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    spans.push(Span::styled("[g] Global ", global_style));
    for (idx, region) in state.regions.iter().take(9).enumerate() {
        let style = if state.controller.region().is_selected(&region.name) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(
            format!("[{}] {} ({}) ", idx + 1, region.name, region.total_resources),
            style,
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(header, area);
}

fn render_facets(f: &mut Frame, area: Rect, state: &DashboardState, view: &ViewModel<'_>) {
    let entries = state.facet_entries(&view.facets);
    let filters = view.filter_state;
    let mut lines = Vec::new();

    let savings = &filters.cost_savings;
    lines.push(Line::from(vec![
        Span::styled("Savings ", header_style()),
        Span::raw(format!(
            "[m] min {}  [M] max {}",
            savings.min.map(format_money).unwrap_or_else(|| "-".to_string()),
            savings.max.map(format_money).unwrap_or_else(|| "-".to_string()),
        )),
    ]));
    if let Some((bound, buffer)) = &state.editing {
        let which = match bound {
            Bound::Min => "min",
            Bound::Max => "max",
        };
        lines.push(Line::from(Span::styled(
            format!("  {}: {}_", which, buffer),
            Style::default().fg(Color::Cyan),
        )));
    }

    let mut current_kind = None;
    for (idx, entry) in entries.iter().enumerate() {
        let kind = entry.kind();
        if current_kind != Some(kind) {
            let values_len = match kind {
                FacetKind::InstanceTypes => view.facets.instance_types.len(),
                FacetKind::Tags => view.facets.tags.len(),
                FacetKind::Statuses => view.facets.statuses.len(),
            };
            let toggle = if values_len <= state.preview_count {
                ""
            } else if state.expanded.contains(&kind) {
                " [e] Show Less"
            } else {
                " [e] Load More"
            };
            lines.push(Line::from(Span::styled(
                format!("{}{}", kind.title(), toggle),
                header_style(),
            )));
            current_kind = Some(kind);
        }

        let label = entry.label();
        let mark = if filters.is_selected(entry) { "[x]" } else { "[ ]" };
        let mut style = Style::default();
        if state.focus == Focus::Facets && idx == state.facet_cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(format!("  {} {}", mark, label), style)));
    }

    let title = if state.focus == Focus::Facets {
        "Filters (focused)"
    } else {
        "Filters [f]"
    };
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

fn render_cards(f: &mut Frame, area: Rect, state: &DashboardState, view: &ViewModel<'_>) {
    let mut lines = Vec::new();
    if let Some(notice) = &state.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    if view.page_records.is_empty() {
        lines.push(Line::from("No resources found."));
    }

    for (idx, record) in view.page_records.iter().enumerate() {
        let card = ResourceCard::from_record(record);
        let mut title_style = Style::default().add_modifier(Modifier::BOLD);
        if state.focus == Focus::Cards && idx == state.card_cursor {
            title_style = title_style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(card.title, title_style)));
        lines.push(Line::from(format!("  Type: {}", card.type_label)));
        lines.push(Line::from(format!("  Region: {}", card.region)));
        lines.push(Line::from(vec![
            Span::raw("  Potential Cost Savings: "),
            Span::styled(card.savings, Style::default().fg(Color::Green)),
        ]));
        lines.push(Line::from(""));
    }

    let title = format!("{} ({} records)", view.tab.label(), view.total_records);
    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(panel, area);
}

fn render_footer(f: &mut Frame, area: Rect, state: &DashboardState, view: &ViewModel<'_>) {
    let enabled = Style::default().fg(Color::White);
    let disabled = Style::default().fg(Color::DarkGray);
    let mut spans = vec![
        Span::styled("[p] Previous ", if view.has_previous { enabled } else { disabled }),
        Span::raw(format!("Page {} of {} ", view.current_page, view.total_pages)),
        Span::styled("[n] Next", if view.has_next { enabled } else { disabled }),
        Span::raw("  |  Tab/h/l tabs  f focus  Enter toggle/open  q quit"),
    ];
    if let Some(message) = &state.status_message {
        spans.push(Span::styled(
            format!("  {}", message),
            Style::default().fg(Color::Red),
        ));
    }
    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn render_detail(f: &mut Frame, area: Rect, record: &crate::resources::types::ResourceRecord) {
    let popup = centered_rect(80, 80, area);
    let mut lines = Vec::new();
    for row in detail_rows(record) {
        let key = Span::styled(format!("{}: ", row.key), header_style());
        match row.value {
            DetailValue::Segments(segments) => {
                let mut spans = vec![key];
                spans.extend(segments.into_iter().map(|segment| match segment {
                    TextSegment::Text(text) => Span::raw(text),
                    TextSegment::Link(url) => Span::styled(
                        url,
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                }));
                lines.push(Line::from(spans));
            }
            DetailValue::Text(text) if text.contains('\n') => {
                lines.push(Line::from(key));
                lines.extend(text.lines().map(|l| Line::from(format!("  {}", l))));
            }
            DetailValue::Text(text) => lines.push(Line::from(vec![key, Span::raw(text)])),
        }
    }

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Resource Details (Esc to close)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup);
    f.render_widget(panel, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
