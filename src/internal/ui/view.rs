use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
};

use super::app::{App, CardPlacement, InputMode};
use super::show_more::ShowMore;
use crate::internal::locale;
use crate::internal::notification::NotificationType;
use crate::internal::page::{Card, DisplayText, Page};
use crate::utils::theme_loader::TuiTheme;

/// Columns taken by the selection marker in front of every card line.
const GUTTER: u16 = 2;

/// Line counts and offsets saturate at the widest value ratatui scrolls by.
fn line_offset(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[tracing::instrument(skip(app, f))]
pub fn draw(app: &mut App, f: &mut Frame) {
    let start = std::time::Instant::now();

    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_top_bar(app, f, chunks[0]);
    render_search_bar(app, f, chunks[1]);
    render_feed(app, f, chunks[2]);
    render_back_to_top(app, f, chunks[2]);
    render_status_bar(app, f, chunks[3]);

    if app
        .notification
        .as_ref()
        .is_some_and(|n| n.notification_type != NotificationType::Status)
    {
        render_notification(app, f);
    }

    if app.config.logging.enable_performance_metrics && cfg!(debug_assertions) {
        tracing::debug!(elapsed = ?start.elapsed(), "render.draw");
    }
}

/// Wrap highlighted text to `width` columns, keeping each run's highlight
/// flag. Line breaks match `textwrap::wrap` on the plain text.
pub fn wrap_display_text(text: &DisplayText, width: usize) -> Vec<Vec<(String, bool)>> {
    let plain = text.plain_text();
    if plain.is_empty() {
        return Vec::new();
    }

    let mut runs = Vec::with_capacity(text.segments().len());
    let mut offset = 0;
    for segment in text.segments() {
        let end = offset + segment.text.len();
        runs.push((offset..end, segment.highlighted));
        offset = end;
    }

    let mut lines = Vec::new();
    let mut cursor = 0;
    for line in textwrap::wrap(&plain, width.max(1)) {
        let line: &str = &line;
        let Some(start) = plain[cursor..].find(line).map(|i| cursor + i) else {
            lines.push(vec![(line.to_string(), false)]);
            continue;
        };
        let end = start + line.len();
        cursor = end;

        lines.push(
            runs.iter()
                .filter_map(|(range, highlighted)| {
                    let a = range.start.max(start);
                    let b = range.end.min(end);
                    (a < b).then(|| (plain[a..b].to_string(), *highlighted))
                })
                .collect(),
        );
    }
    lines
}

fn styled_runs(runs: Vec<(String, bool)>, base: Style, theme: &TuiTheme) -> Vec<Span<'static>> {
    runs.into_iter()
        .map(|(text, highlighted)| match highlighted {
            true => Span::styled(text, base.bg(theme.highlight_bg).fg(theme.highlight_fg)),
            false => Span::styled(text, base),
        })
        .collect()
}

/// Terminal lines for one card, ending with a blank separator line.
pub fn card_lines(
    card: &Card,
    theme: &TuiTheme,
    width: usize,
    max_lines: usize,
    selected: bool,
) -> Vec<Line<'static>> {
    let text_style = Style::default().fg(theme.foreground);
    let muted = Style::default().fg(theme.muted);
    let accent = Style::default().fg(theme.accent);

    let mut rows: Vec<Vec<Span<'static>>> = Vec::new();

    let mut meta = Vec::new();
    if let Some(date) = &card.date {
        meta.push(Span::styled(date.display.clone(), muted));
    }
    if card.instagram_link.is_some() {
        if !meta.is_empty() {
            meta.push(Span::styled("  ·  ", muted));
        }
        meta.push(Span::styled("◎ Instagram", accent));
    }
    if !meta.is_empty() {
        rows.push(meta);
    }

    if let Some(image) = card.image.as_ref().filter(|image| !image.alt.is_empty()) {
        rows.push(vec![Span::styled(format!("▣ {}", image.alt), muted)]);
    }

    if let Some(title) = &card.title {
        let style = text_style.add_modifier(Modifier::BOLD);
        for runs in wrap_display_text(title, width) {
            rows.push(styled_runs(runs, style, theme));
        }
    }

    if let Some(description) = &card.description {
        let limit = match card.show_more {
            Some(toggle) if !toggle.expanded => max_lines,
            _ => usize::MAX,
        };
        for runs in wrap_display_text(description, width).into_iter().take(limit) {
            rows.push(styled_runs(runs, text_style, theme));
        }
    }

    if let Some(label) = ShowMore::label(card) {
        rows.push(vec![Span::styled(
            format!("[{}]", label),
            accent.add_modifier(Modifier::BOLD),
        )]);
    }

    if let Some(cta) = card.call_to_action.as_ref().filter(|cta| !cta.is_empty()) {
        rows.push(vec![Span::styled(
            format!("{} →", cta),
            Style::default()
                .fg(theme.link)
                .add_modifier(Modifier::UNDERLINED),
        )]);
    }

    let marker = match selected {
        true => Span::styled("▌ ", accent),
        false => Span::raw("  "),
    };

    let mut lines: Vec<Line<'static>> = rows
        .into_iter()
        .map(|spans| {
            let mut line = Vec::with_capacity(spans.len() + 1);
            line.push(marker.clone());
            line.extend(spans);
            Line::from(line)
        })
        .collect();
    lines.push(Line::default());
    lines
}

/// Lines for every shown card plus the placeholder, and where each card starts.
pub fn feed_lines(
    page: &Page,
    theme: &TuiTheme,
    width: usize,
    max_lines: usize,
    selected: Option<usize>,
) -> (Vec<Line<'static>>, Vec<CardPlacement>) {
    let mut lines = Vec::new();
    let mut placements = Vec::new();

    for (index, card) in page.cards.iter().enumerate() {
        if card.hidden || !card.revealed {
            continue;
        }
        let card_lines = card_lines(card, theme, width, max_lines, selected == Some(index));
        placements.push(CardPlacement {
            index,
            start: line_offset(lines.len()),
            height: line_offset(card_lines.len()),
        });
        lines.extend(card_lines);
    }

    if page.placeholder.visible {
        lines.push(Line::default());
        lines.push(
            Line::from(Span::styled(
                page.placeholder.text.clone(),
                Style::default()
                    .fg(theme.muted)
                    .add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center),
        );
    }

    (lines, placements)
}

fn render_top_bar(app: &App, f: &mut Frame, area: Rect) {
    let control = app.theme_controller.control();

    let toggle = Line::from(format!("{} {} [t] ", control.icon, control.label));
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(toggle.width() as u16)])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        " Notícias",
        Style::default()
            .fg(app.theme.accent)
            .add_modifier(Modifier::BOLD),
    )));
    f.render_widget(title, chunks[0]);

    let toggle = Paragraph::new(toggle)
        .alignment(Alignment::Right)
        .style(Style::default().fg(app.theme.foreground));
    f.render_widget(toggle, chunks[1]);
}

fn render_search_bar(app: &App, f: &mut Frame, area: Rect) {
    let searching = app.input_mode == InputMode::Search;
    let border = match searching {
        true => app.theme.accent,
        false => app.theme.border,
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Buscar [/] ")
        .padding(Padding::horizontal(1));

    let query_active = app.filter.as_ref().is_some_and(|f| !f.query().is_empty());
    if let Some(outcome) = app.last_outcome.filter(|_| query_active) {
        block = block.title(
            Line::from(format!(" {}/{} ", outcome.visible, outcome.total)).right_aligned(),
        );
    }

    let line = match (app.search_input.is_empty(), searching) {
        (true, false) => Line::from(Span::styled(
            locale::SEARCH_PLACEHOLDER,
            Style::default().fg(app.theme.muted),
        )),
        (_, true) => Line::from(vec![
            Span::styled(
                app.search_input.clone(),
                Style::default().fg(app.theme.foreground),
            ),
            Span::styled("█", Style::default().fg(app.theme.accent)),
        ]),
        (false, false) => Line::from(Span::styled(
            app.search_input.clone(),
            Style::default().fg(app.theme.foreground),
        )),
    };

    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_feed(app: &mut App, f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let width = inner.width.saturating_sub(GUTTER).max(1) as usize;
    app.sync_width(width);

    if app.page.loading {
        let loading = Paragraph::new(format!("{} {}", app.spinner_char(), locale::LOADING))
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted));
        f.render_widget(loading, inner);
        return;
    }

    let (lines, placements) = feed_lines(
        &app.page,
        &app.theme,
        width,
        app.show_more.max_lines(),
        app.selected,
    );

    app.layout.viewport = inner.height;
    app.layout.total_lines = line_offset(lines.len());
    app.layout.placements = placements;
    app.scroll = app.scroll.min(app.layout.max_scroll());

    let feed = Paragraph::new(lines).scroll((app.scroll, 0));
    f.render_widget(feed, inner);
}

fn render_back_to_top(app: &App, f: &mut Frame, area: Rect) {
    if !app.back_to_top.is_visible() {
        return;
    }

    let label = Line::from(format!(" ↑ {} [g] ", locale::BACK_TO_TOP));
    let width = (label.width() as u16).min(area.width);
    if area.height < 2 || width == 0 {
        return;
    }
    let button = Rect::new(
        area.right().saturating_sub(width + 1),
        area.bottom().saturating_sub(2),
        width,
        1,
    );

    f.render_widget(Clear, button);
    f.render_widget(
        Paragraph::new(label).style(
            Style::default()
                .bg(app.theme.selection_bg)
                .fg(app.theme.selection_fg),
        ),
        button,
    );
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let text = match &app.notification {
        Some(n) if n.notification_type == NotificationType::Status => n.message.clone(),
        _ => match app.input_mode {
            InputMode::Search => "enter confirmar · esc limpar · ↑/↓ histórico".to_string(),
            InputMode::Normal => {
                "j/k navegar · espaço mostrar mais · enter abrir · i instagram · g topo · x exportar · q sair"
                    .to_string()
            }
        },
    };

    let p = Paragraph::new(format!(" {}", text)).style(
        Style::default()
            .bg(app.theme.selection_bg)
            .fg(app.theme.selection_fg),
    );
    f.render_widget(p, area);
}

fn render_notification(app: &App, f: &mut Frame) {
    let Some(notification) = &app.notification else {
        return;
    };
    let area = f.area();

    let popup_width = line_offset(Line::from(notification.message.as_str()).width())
        .saturating_add(4)
        .min(area.width.saturating_sub(4));
    let popup_height = 3;
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    let (bg_color, title) = match notification.notification_type {
        NotificationType::Error => (Color::Red, "Erro"),
        _ => (Color::Blue, "Info"),
    };

    let popup = Paragraph::new(notification.message.as_str())
        .style(
            Style::default()
                .bg(bg_color)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border))
                .title(title),
        )
        .alignment(Alignment::Center);

    f.render_widget(Clear, popup_area);
    f.render_widget(popup, popup_area);
}
