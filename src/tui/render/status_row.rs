use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{AdminFocus, App, EditTarget, Mode, Panel};
use crate::util::unicode::display_width;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (left, left_style, hint) = match app.mode {
        Mode::Edit => {
            let label = app.edit.as_ref().map(EditTarget::label).unwrap_or_default();
            let hint = if app.edit == Some(EditTarget::Chat) {
                "Enter send  Esc done"
            } else {
                "Enter save  Esc cancel"
            };
            (
                format!(" editing {}", label),
                Style::default().fg(app.theme.accent).bg(bg),
                hint,
            )
        }
        Mode::Confirm => {
            let id = app
                .admin
                .pending_delete
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            (
                format!(" Delete {}? It will be kept in the recovery log.", id),
                Style::default().fg(app.theme.red).bg(bg),
                "y delete  any other key cancel",
            )
        }
        Mode::Navigate => {
            let (text, style) = match &app.status {
                Some(msg) => (
                    format!(" {}", msg.text),
                    Style::default()
                        .fg(if msg.is_error { app.theme.red } else { app.theme.green })
                        .bg(bg),
                ),
                None => (String::new(), Style::default().bg(bg)),
            };
            let hint = if app.show_key_hints { navigate_hint(app) } else { "" };
            (text, style, hint)
        }
    };

    let mut spans = vec![Span::styled(left.clone(), left_style)];
    let used = display_width(&left);
    let hint_w = display_width(hint);
    if !hint.is_empty() && used + hint_w + 1 < width {
        spans.push(Span::styled(
            " ".repeat(width - used - hint_w - 1),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn navigate_hint(app: &App) -> &'static str {
    match app.panel {
        Panel::Submit => "j/k move  Enter edit  \u{2190}/\u{2192} choose  / search  Tab panel  q quit",
        Panel::Admin if app.role().is_none() => {
            "\u{2190}/\u{2192} role  Enter password  Tab panel  q quit"
        }
        Panel::Admin if app.admin.focus == AdminFocus::Poc => {
            "n name  m phone  o tickets  L logout  q quit"
        }
        Panel::Admin => "s status  p priority  r resolve  D delete  / search  o POC  L logout  q quit",
        Panel::Chat => "Enter type  c clear  Tab panel  q quit",
    }
}
