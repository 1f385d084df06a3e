//! Pure view functions.
//!
//! Everything here takes `&AppState`, draws to a ratatui `Frame` and never
//! mutates state.

use dossier_core::browser::TabView;
use dossier_core::loadout::Loadout;
use dossier_core::projection::{DicePool, DieGrade, SkillRow};
use dossier_core::record::Collection;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, List, ListItem, ListState as ListWidgetState, Paragraph, Row, Table,
    Tabs, Wrap,
};

use crate::common::text::{fit_width, join_pairs};
use crate::state::AppState;

/// Width of the navigation column.
const NAV_WIDTH: u16 = 34;

const STATUS_HEIGHT: u16 = 1;

const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

const KEY_HINTS: &str =
    "↑/↓ move · Enter view · / filter · a add · x remove · Tab switch · s all · +/- group · q quit";

/// Renders the whole screen.
pub fn render(app: &AppState, frame: &mut Frame) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)])
        .split(frame.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(NAV_WIDTH), Constraint::Min(20)])
        .split(rows[0]);

    render_navigation(app, frame, columns[0]);
    render_detail(app, frame, columns[1]);
    render_status(app, frame, rows[1]);
}

// ============================================================================
// Navigation column
// ============================================================================

fn render_navigation(app: &AppState, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Adversaries ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let filter_style = if app.filter.editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let mut filter = vec![
        Span::styled("Filter: ", filter_style),
        Span::raw(app.filter.text.as_str()),
    ];
    if app.filter.editing {
        filter.push(Span::styled("▏", filter_style));
    }
    frame.render_widget(Paragraph::new(Line::from(filter)), parts[0]);

    let Some(visible) = app.browser.visible_list() else {
        frame.render_widget(
            Paragraph::new(Span::styled("Loading…", Style::default().fg(Color::DarkGray))),
            parts[1],
        );
        return;
    };

    let counter = format!(
        "Showing {} of {}.",
        visible.len(),
        app.browser.all_adversaries().len()
    );
    frame.render_widget(
        Paragraph::new(Span::styled(counter, Style::default().fg(Color::DarkGray))),
        parts[1],
    );

    let active_id = app.browser.active_adversary().map(|a| &a.id);
    let name_width = usize::from(parts[2].width.saturating_sub(2));
    let items: Vec<ListItem> = visible
        .iter()
        .map(|adversary| {
            let style = if Some(&adversary.id) == active_id {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::styled(
                fit_width(&adversary.name, name_width).into_owned(),
                style,
            ))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("› ");
    let mut list_state = ListWidgetState::default().with_selected(Some(app.list.cursor));
    frame.render_stateful_widget(list, parts[2], &mut list_state);
}

// ============================================================================
// Detail column
// ============================================================================

fn render_detail(app: &AppState, frame: &mut Frame, area: Rect) {
    if !app.browser.all_stores_loaded() {
        render_loading(app, frame, area);
        return;
    }

    let skills = app.catalog.skills.snapshot();
    let views = app
        .browser
        .tab_views(skills.records(), |index| app.panel_options(index));
    let Some(view) = views.iter().find(|view| view.active) else {
        let block = Block::default().borders(Borders::ALL);
        frame.render_widget(
            Paragraph::new("No adversaries to show.").block(block),
            area,
        );
        return;
    };

    let loadout = Loadout::resolve(
        &view.adversary,
        app.catalog.weapons.snapshot().records(),
        app.catalog.talents.snapshot().records(),
        app.catalog.qualities.snapshot().records(),
    );
    let gear = loadout_lines(&loadout);
    let loadout_height = u16::try_from(gear.len())
        .unwrap_or(u16::MAX)
        .min(area.height / 3);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Min(0),
            Constraint::Length(loadout_height),
        ])
        .split(area);

    let minions = view
        .adversary
        .kind
        .is_minion()
        .then(|| app.panel_options(view.index).minions);

    render_tab_bar(&views, frame, parts[0]);
    render_character(app, view, frame, parts[1]);
    render_skills(&view.skills, minions, frame, parts[2]);
    frame.render_widget(
        Paragraph::new(gear).wrap(Wrap { trim: false }),
        parts[3],
    );
}

fn render_loading(app: &AppState, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Loading ");
    let mut lines = Vec::new();

    if app.loads.has_errors() {
        for err in app.loads.errors() {
            lines.push(Line::styled(
                format!("✗ {err}"),
                Style::default().fg(Color::Red),
            ));
        }
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "Press r to retry.",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        let loaded = Collection::ALL
            .iter()
            .filter(|c| app.catalog.is_loaded(**c))
            .count();
        let spinner = SPINNER_FRAMES[app.spinner_frame % SPINNER_FRAMES.len()];
        lines.push(Line::raw(format!(
            "{spinner} Loading data ({loaded}/{})",
            Collection::ALL.len()
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_tab_bar(views: &[TabView], frame: &mut Frame, area: Rect) {
    let titles: Vec<Line> = views
        .iter()
        .map(|view| Line::raw(format!("{} {}", view.index + 1, fit_width(&view.adversary.name, 18))))
        .collect();
    let selected = views.iter().position(|view| view.active);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .divider("│");
    frame.render_widget(tabs, area);
}

fn render_character(app: &AppState, view: &TabView, frame: &mut Frame, area: Rect) {
    let adversary = &view.adversary;
    let options = app.panel_options(view.index);

    let mut title = vec![Span::styled(
        adversary.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    let kind = adversary.kind.label();
    if !kind.is_empty() {
        title.push(Span::styled(
            format!("  [{kind}]"),
            Style::default().fg(Color::Cyan),
        ));
    }
    let mut lines = vec![Line::from(title)];

    if !adversary.tags.is_empty() {
        lines.push(Line::raw(format!("Tags: {}", adversary.tags.join(", "))));
    }
    lines.push(Line::raw(join_pairs(
        adversary
            .characteristics
            .iter()
            .map(|(name, value)| (name.as_str(), *value)),
    )));

    let mut controls = vec![Span::raw(format!(
        "Show all: {} (s)",
        if options.show_all { "on" } else { "off" }
    ))];
    if adversary.kind.is_minion() {
        controls.push(Span::raw(format!(
            "   Group: {} (+/-, = resets)",
            options.minions
        )));
    }
    lines.push(Line::from(controls).style(Style::default().fg(Color::DarkGray)));

    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP | Borders::BOTTOM)),
        area,
    );
}

/// Skill table. Minion groups (`minions` is `Some`) roll without a rank
/// column.
fn render_skills(rows: &[SkillRow], minions: Option<u32>, frame: &mut Frame, area: Rect) {
    let header_cells = match minions {
        Some(group) => vec![
            "Skill".to_string(),
            "Characteristic".to_string(),
            format!("Roll (for {group})"),
        ],
        None => ["Skill", "Characteristic", "Rank", "Roll"]
            .into_iter()
            .map(String::from)
            .collect(),
    };
    let header = Row::new(header_cells).style(Style::default().add_modifier(Modifier::BOLD));

    let body: Vec<Row> = rows
        .iter()
        .map(|row| {
            let style = if row.has_rank {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut cells = vec![
                Cell::from(row.name.clone()),
                Cell::from(row.characteristic.clone()),
            ];
            if minions.is_none() {
                cells.push(Cell::from(row.rank.to_string()));
            }
            cells.push(Cell::from(dice_line(&row.pool)));
            Row::new(cells).style(style)
        })
        .collect();

    let widths = if minions.is_some() {
        vec![
            Constraint::Min(16),
            Constraint::Length(15),
            Constraint::Min(14),
        ]
    } else {
        vec![
            Constraint::Min(16),
            Constraint::Length(15),
            Constraint::Length(5),
            Constraint::Min(6),
        ]
    };

    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().title(" Skills "));

    frame.render_widget(table, area);
}

/// Weapons (with qualities) and talents, one line each.
fn loadout_lines(loadout: &Loadout) -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::new();

    if !loadout.weapons.is_empty() {
        lines.push(Line::styled("Weapons", heading));
        for weapon in &loadout.weapons {
            let mut spans = vec![Span::raw(format!("  {}", weapon.name))];
            let details = weapon.details();
            if !details.is_empty() {
                spans.push(Span::styled(format!("  {}", details.join(" · ")), muted));
            }
            lines.push(Line::from(spans));
        }
    }
    if !loadout.talents.is_empty() {
        lines.push(Line::styled("Talents", heading));
        for talent in &loadout.talents {
            let mut spans = vec![Span::raw(format!("  {talent}"))];
            if let Some(description) = &talent.description {
                spans.push(Span::styled(format!("  {description}"), muted));
            }
            lines.push(Line::from(spans));
        }
    }
    lines
}

fn die_color(grade: DieGrade) -> Color {
    match grade {
        DieGrade::Proficiency => Color::Yellow,
        DieGrade::Ability => Color::Green,
        DieGrade::Boost => Color::Cyan,
    }
}

/// Coloured glyphs for a dice pool.
fn dice_line(pool: &DicePool) -> Line<'static> {
    Line::from(
        pool.dice()
            .map(|grade| {
                Span::styled(
                    grade.glyph().to_string(),
                    Style::default().fg(die_color(grade)),
                )
            })
            .collect::<Vec<_>>(),
    )
}

// ============================================================================
// Status bar
// ============================================================================

fn render_status(app: &AppState, frame: &mut Frame, area: Rect) {
    let line = match &app.status {
        Some(message) => Line::styled(message.clone(), Style::default().fg(Color::Red)),
        None => Line::styled(KEY_HINTS, Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(Paragraph::new(line), area);
}
