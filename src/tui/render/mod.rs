pub mod admin_view;
pub mod chat_view;
pub mod status_row;
pub mod submit_view;
pub mod tab_bar;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Block;
use regex::Regex;

use crate::model::Ticket;
use crate::util::unicode::pad_to_width;

use super::app::{App, EditTarget, Mode, Panel};
use super::field::TextField;

/// Width of the label column in forms
pub(super) const LABEL_W: usize = 13;

/// Main render function, dispatches to the active panel
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // tab bar (2 rows) | content | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);
    match app.panel {
        Panel::Submit => submit_view::render_submit_view(frame, app, chunks[1]),
        Panel::Admin => admin_view::render_admin_view(frame, app, chunks[1]),
        Panel::Chat => chat_view::render_chat_view(frame, app, chunks[1]),
    }
    status_row::render_status_row(frame, app, chunks[2]);
}

/// Case-insensitive literal match for the search keyword, if there is one
pub(super) fn keyword_regex(keyword: &str) -> Option<Regex> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", regex::escape(keyword))).ok()
}

/// Push spans for text with regex match highlighting. If no regex or no matches,
/// pushes a single span with `base_style`. Otherwise splits text at match boundaries.
pub(super) fn push_highlighted_spans<'a>(
    spans: &mut Vec<Span<'a>>,
    text: &str,
    base_style: Style,
    highlight_style: Style,
    search_re: Option<&Regex>,
) {
    let Some(re) = search_re else {
        spans.push(Span::styled(text.to_string(), base_style));
        return;
    };

    let mut last_end = 0;
    for m in re.find_iter(text) {
        if m.start() > last_end {
            spans.push(Span::styled(text[last_end..m.start()].to_string(), base_style));
        }
        spans.push(Span::styled(m.as_str().to_string(), highlight_style));
        last_end = m.end();
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
}

/// Is this field the one currently being typed into?
pub(super) fn is_editing(app: &App, target: &EditTarget) -> bool {
    app.mode == Mode::Edit && app.edit.as_ref() == Some(target)
}

/// One form row: focus marker, label, then the value
pub(super) fn form_line<'a>(app: &App, label: &str, value: Vec<Span<'a>>, focused: bool) -> Line<'a> {
    let bg = app.theme.background;
    let marker = if focused { "\u{25B8} " } else { "  " };
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(app.theme.accent).bg(bg)),
        Span::styled(
            pad_to_width(label, LABEL_W),
            Style::default().fg(if focused { app.theme.text_bright } else { app.theme.dim }).bg(bg),
        ),
    ];
    spans.extend(value);
    Line::from(spans)
}

/// Value spans for a text field; masked fields show one `*` per character
pub(super) fn text_value<'a>(app: &App, field: &TextField, editing: bool, masked: bool) -> Vec<Span<'a>> {
    let text = if masked {
        "*".repeat(field.text().chars().count())
    } else {
        field.text().to_string()
    };
    let fg = if editing { app.theme.text_bright } else { app.theme.text };
    let mut style = Style::default().fg(fg).bg(app.theme.background);
    if editing {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    vec![Span::styled(text, style)]
}

/// Place the terminal cursor inside a form row being edited
pub(super) fn place_field_cursor(frame: &mut Frame, area: Rect, row: usize, field: &TextField) {
    let x = area.x as usize + 2 + LABEL_W + field.cursor_col();
    let y = area.y as usize + row;
    if y < (area.y + area.height) as usize && x < (area.x + area.width) as usize {
        frame.set_cursor_position((x as u16, y as u16));
    }
}

/// Ticket columns: title and width in cells. `None` takes what is left.
pub(super) struct Column {
    pub title: &'static str,
    pub width: Option<usize>,
}

pub(super) fn header_line<'a>(app: &App, columns: &[Column], total_width: usize) -> Line<'a> {
    let style = Style::default()
        .fg(app.theme.dim)
        .bg(app.theme.background)
        .add_modifier(Modifier::BOLD);
    let widths = column_widths(columns, total_width);
    let spans: Vec<Span> = std::iter::once(Span::styled("  ", style))
        .chain(
            columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| Span::styled(pad_to_width(c.title, *w), style)),
        )
        .collect();
    Line::from(spans)
}

/// Resolve column widths; the flexible column gets the remainder (at least 8)
pub(super) fn column_widths(columns: &[Column], total_width: usize) -> Vec<usize> {
    let fixed: usize = columns.iter().filter_map(|c| c.width).sum::<usize>() + 2;
    let rest = total_width.saturating_sub(fixed).max(8);
    columns.iter().map(|c| c.width.unwrap_or(rest)).collect()
}

/// Cell text for one ticket column
pub(super) fn ticket_cell(ticket: &Ticket, title: &str) -> String {
    match title {
        "ID" => ticket.id.to_string(),
        "Status" => ticket.status.to_string(),
        "Priority" => ticket.priority.to_string(),
        "Department" => ticket.department.to_string(),
        "Date" => ticket.date_submitted.to_string(),
        "Name" => ticket.full_name.clone(),
        "Resolution" => ticket.resolution.clone(),
        _ => ticket.issue.replace(['\n', '\r'], " "),
    }
}

/// One ticket row. Status and priority are colored; id and issue carry the
/// keyword highlight.
pub(super) fn ticket_line<'a>(
    app: &App,
    ticket: &Ticket,
    columns: &[Column],
    total_width: usize,
    selected: bool,
    search_re: Option<&Regex>,
) -> Line<'a> {
    let bg = if selected { app.theme.selection_bg } else { app.theme.background };
    let base = Style::default().fg(app.theme.text).bg(bg);
    let highlight = Style::default().fg(app.theme.match_fg).bg(app.theme.match_bg);
    let marker = if selected { "\u{25B8} " } else { "  " };
    let mut spans = vec![Span::styled(marker, Style::default().fg(app.theme.accent).bg(bg))];

    for (column, width) in columns.iter().zip(column_widths(columns, total_width)) {
        let cell = pad_to_width(&ticket_cell(ticket, column.title), width);
        match column.title {
            "ID" | "Issue" => push_highlighted_spans(&mut spans, &cell, base, highlight, search_re),
            "Status" => spans.push(Span::styled(cell, base.fg(app.theme.status_color(ticket.status)))),
            "Priority" => {
                spans.push(Span::styled(cell, base.fg(app.theme.priority_color(ticket.priority))))
            }
            _ => spans.push(Span::styled(cell, base)),
        }
    }
    Line::from(spans)
}

pub(super) fn plain_line<'a>(text: impl Into<String>, fg: Color, bg: Color) -> Line<'a> {
    Line::from(Span::styled(text.into(), Style::default().fg(fg).bg(bg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    fn texts(spans: &[Span]) -> Vec<String> {
        spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn highlight_splits_on_matches() {
        let re = keyword_regex("LAB").unwrap();
        let mut spans = Vec::new();
        push_highlighted_spans(&mut spans, "Wifi down in lab 3", Style::default(), Style::default(), Some(&re));
        assert_eq!(texts(&spans), vec!["Wifi down in ", "lab", " 3"]);
    }

    #[test]
    fn highlight_without_match_is_one_span() {
        let re = keyword_regex("printer").unwrap();
        let mut spans = Vec::new();
        push_highlighted_spans(&mut spans, "Wifi", Style::default(), Style::default(), Some(&re));
        assert_eq!(texts(&spans), vec!["Wifi"]);
    }

    #[test]
    fn keyword_is_literal() {
        assert!(keyword_regex("   ").is_none());
        let re = keyword_regex("a.b").unwrap();
        assert!(re.is_match("A.B"));
        assert!(!re.is_match("axb"));
    }

    #[test]
    fn flexible_column_takes_remainder() {
        let columns = [
            Column { title: "ID", width: Some(12) },
            Column { title: "Issue", width: None },
        ];
        assert_eq!(column_widths(&columns, 40), vec![12, 26]);
        assert_eq!(column_widths(&columns, 10), vec![12, 8]);
    }

    #[test]
    fn full_screen_shows_tabs_and_hints() {
        let app = app_with_tickets(SAMPLE_TICKETS);
        let output = render_to_string(TERM_W, TERM_H, |frame, _| render(frame, &app));
        let first = output.lines().next().unwrap();
        assert!(first.contains("Submit"));
        assert!(first.contains("Support Tickets"));
        assert!(output.lines().last().unwrap().contains("q quit"));
    }
}
