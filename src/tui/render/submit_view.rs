use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, EditTarget, SubmitField};

use super::{
    Column, form_line, header_line, is_editing, keyword_regex, place_field_cursor, plain_line,
    text_value, ticket_line,
};

const RESULT_COLUMNS: [Column; 5] = [
    Column { title: "ID", width: Some(13) },
    Column { title: "Status", width: Some(13) },
    Column { title: "Priority", width: Some(10) },
    Column { title: "Department", width: Some(12) },
    Column { title: "Issue", width: None },
];

/// Form row for a text field and the edit target it types into
fn text_row(field: SubmitField) -> Option<EditTarget> {
    match field {
        SubmitField::Name => Some(EditTarget::Name),
        SubmitField::Phone => Some(EditTarget::Phone),
        SubmitField::Issue => Some(EditTarget::Issue),
        SubmitField::Search => Some(EditTarget::Search),
        _ => None,
    }
}

/// Submission form, search box with results, and the last submission
pub fn render_submit_view(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_row: Option<(usize, EditTarget)> = None;

    for field in SubmitField::ALL {
        let focused = app.submit.field == field;
        if field == SubmitField::Search {
            lines.push(Line::default());
        }
        let line = match field {
            SubmitField::Department => form_line(
                app,
                "Department",
                choice_value(app, app.submit.department.name(), focused),
                focused,
            ),
            SubmitField::Priority => form_line(
                app,
                "Priority",
                choice_value(app, app.submit.priority.name(), focused),
                focused,
            ),
            SubmitField::Send => {
                let style = if focused {
                    Style::default()
                        .fg(app.theme.background)
                        .bg(app.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(app.theme.accent).bg(bg)
                };
                form_line(app, "", vec![Span::styled("[ Submit Ticket ]", style)], focused)
            }
            _ => {
                let Some(target) = text_row(field) else {
                    continue;
                };
                let editing = is_editing(app, &target);
                if editing {
                    cursor_row = Some((lines.len(), target.clone()));
                }
                let label = match field {
                    SubmitField::Name => "Full Name",
                    SubmitField::Phone => "Mobile No",
                    SubmitField::Issue => "Issue",
                    _ => "Search",
                };
                form_line(app, label, text_value(app, app.field(&target), editing, false), focused)
            }
        };
        lines.push(line);
    }

    let search = app.submit.search.text();
    if !search.trim().is_empty() {
        let results = app.search_results();
        let re = keyword_regex(search);
        lines.push(plain_line(
            format!("  Found {} matching tickets:", results.len()),
            app.theme.dim,
            bg,
        ));
        if !results.is_empty() {
            lines.push(header_line(app, &RESULT_COLUMNS, width));
            for t in &results {
                lines.push(ticket_line(app, t, &RESULT_COLUMNS, width, false, re.as_ref()));
            }
        }
    }

    if let Some(sub) = &app.submit.last {
        lines.push(Line::default());
        lines.push(plain_line(
            format!("  Ticket submitted! {}", sub.ticket.id),
            app.theme.green,
            bg,
        ));
        lines.push(plain_line(
            format!(
                "  Contact POC for {} department: {} ({})",
                sub.ticket.department, sub.contact.name, sub.contact.phone
            ),
            app.theme.text,
            bg,
        ));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);

    if let Some((row, target)) = cursor_row {
        place_field_cursor(frame, area, row, app.field(&target));
    }
}

fn choice_value<'a>(app: &App, value: &str, focused: bool) -> Vec<Span<'a>> {
    let bg = app.theme.background;
    let arrow = Style::default().fg(if focused { app.theme.accent } else { app.theme.dim }).bg(bg);
    vec![
        Span::styled("\u{2039} ", arrow),
        Span::styled(value.to_string(), Style::default().fg(app.theme.text).bg(bg)),
        Span::styled(" \u{203A}", arrow),
    ]
}
