use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::cli::output::{format_poc_table, format_summary_table, format_ticket_detail};
use crate::model::PocDirectory;
use crate::ops::chat::{ChatTable, Speaker};
use crate::tui::app::{App, EditTarget};

use super::{is_editing, plain_line};

const PROMPT: &str = "  > ";

/// Conversation history, the last result table, and the input line
pub fn render_chat_view(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(session) = app.session() {
        for entry in session.chat_history().entries() {
            let (who, color) = match entry.speaker {
                Speaker::User => ("you ", app.theme.accent),
                Speaker::Assistant => ("desk", app.theme.green),
            };
            for (i, text) in entry.message.lines().enumerate() {
                let prefix = if i == 0 { format!("  {} \u{2502} ", who) } else { "       \u{2502} ".to_string() };
                lines.push(Line::from(vec![
                    Span::styled(prefix, Style::default().fg(color).bg(bg)),
                    Span::styled(text.to_string(), Style::default().fg(app.theme.text).bg(bg)),
                ]));
            }
        }
    }
    if lines.is_empty() {
        lines.push(plain_line(
            "  Ask about tickets or contacts, e.g. \"list all tickets\" or \"status of TICKET-1102\"",
            app.theme.dim,
            bg,
        ));
    }

    if let Some(response) = &app.chat.last {
        let table = match &response.table {
            ChatTable::Empty => Vec::new(),
            ChatTable::Tickets(rows) => format_summary_table(rows),
            ChatTable::Poc(records) => {
                format_poc_table(&PocDirectory::from_records(records.iter().cloned()))
            }
            ChatTable::Detail(ticket) => format_ticket_detail(ticket),
        };
        if !table.is_empty() {
            lines.push(Line::default());
            lines.extend(
                table
                    .into_iter()
                    .map(|l| plain_line(format!("         {}", l), app.theme.dim, bg)),
            );
        }
    }

    // Keep the newest lines in view
    let height = chunks[0].height as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();
    frame.render_widget(Paragraph::new(visible).style(Style::default().bg(bg)), chunks[0]);

    let editing = is_editing(app, &EditTarget::Chat);
    let input_style = Style::default()
        .fg(if editing { app.theme.text_bright } else { app.theme.dim })
        .bg(bg);
    let input = Line::from(vec![
        Span::styled(PROMPT, Style::default().fg(app.theme.accent).bg(bg)),
        Span::styled(app.chat.input.text().to_string(), input_style),
    ]);
    frame.render_widget(Paragraph::new(input), chunks[1]);
    if editing {
        let x = chunks[1].x as usize + PROMPT.len() + app.chat.input.cursor_col();
        if x < (chunks[1].x + chunks[1].width) as usize {
            frame.set_cursor_position((x as u16, chunks[1].y));
        }
    }
}
