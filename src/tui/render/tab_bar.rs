use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Panel};
use crate::util::unicode::display_width;

/// Render the panel tabs with the desk name on the right, separator below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    frame.render_widget(Paragraph::new(tabs_line(app, area.width as usize)), chunks[0]);

    let sep = Span::styled(
        "\u{2500}".repeat(area.width as usize),
        Style::default().fg(app.theme.dim).bg(app.theme.background),
    );
    frame.render_widget(Paragraph::new(Line::from(sep)), chunks[1]);
}

fn tabs_line(app: &App, width: usize) -> Line<'static> {
    let bg = app.theme.background;
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));
    let mut spans = vec![Span::styled(" ", Style::default().bg(bg))];

    for (i, panel) in Panel::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(sep.clone());
        }
        let style = if *panel == app.panel {
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.dim).bg(bg)
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, panel.title()), style));
    }

    let right = match app.role() {
        Some(role) => format!("{} \u{00B7} {} ", app.desk_name, role),
        None => format!("{} ", app.desk_name),
    };
    let used: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let right_w = display_width(&right);
    if used + right_w < width {
        spans.push(Span::styled(" ".repeat(width - used - right_w), Style::default().bg(bg)));
        spans.push(Span::styled(right, Style::default().fg(app.theme.accent).bg(bg)));
    }
    Line::from(spans)
}
