use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::Department;
use crate::ops::session::Session;
use crate::ops::ticket_ops::Role;
use crate::tui::app::{AdminFocus, App, EditTarget, LoginField};
use crate::util::unicode::pad_to_width;

use super::{
    Column, LABEL_W, form_line, header_line, is_editing, keyword_regex, place_field_cursor,
    plain_line, text_value, ticket_line,
};

const TICKET_COLUMNS: [Column; 7] = [
    Column { title: "ID", width: Some(13) },
    Column { title: "Status", width: Some(13) },
    Column { title: "Priority", width: Some(10) },
    Column { title: "Department", width: Some(12) },
    Column { title: "Name", width: Some(14) },
    Column { title: "Issue", width: None },
    Column { title: "Resolution", width: Some(18) },
];

/// Rows above the ticket list: title, counts, search, blank, header
const LIST_TOP: usize = 5;
/// Rows below the ticket list: blank, detail
const LIST_BOTTOM: usize = 2;

pub fn render_admin_view(frame: &mut Frame, app: &App, area: Rect) {
    match (app.session(), app.role()) {
        (Some(session), Some(role)) => match app.admin.focus {
            AdminFocus::Tickets => render_tickets(frame, app, session, role, area),
            AdminFocus::Poc => render_poc(frame, app, session, area),
        },
        _ => render_login(frame, app, area),
    }
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let role_focused = app.admin.login_field == LoginField::Role;
    let arrow = Style::default()
        .fg(if role_focused { app.theme.accent } else { app.theme.dim })
        .bg(bg);
    let editing = is_editing(app, &EditTarget::Password);

    let lines = vec![
        plain_line("  Admin login", app.theme.text_bright, bg),
        Line::default(),
        form_line(
            app,
            "Role",
            vec![
                Span::styled("\u{2039} ", arrow),
                Span::styled(
                    app.admin.login_role.to_string(),
                    Style::default().fg(app.theme.text).bg(bg),
                ),
                Span::styled(" \u{203A}", arrow),
            ],
            role_focused,
        ),
        form_line(
            app,
            "Password",
            text_value(app, &app.admin.password, editing, true),
            !role_focused,
        ),
    ];
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
    if editing {
        place_field_cursor(frame, area, 3, &app.admin.password);
    }
}

fn render_tickets(frame: &mut Frame, app: &App, session: &Session, role: Role, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let rows = app.admin_rows();
    let stats = session.stats(role.scope());
    let re = keyword_regex(app.admin.search.text());

    let counts = stats
        .by_status
        .iter()
        .map(|(s, n)| format!("{} {}", s, n))
        .chain(stats.by_priority.iter().map(|(p, n)| format!("{} {}", p, n)))
        .collect::<Vec<_>>()
        .join("  ");

    let search_editing = is_editing(app, &EditTarget::AdminSearch);
    let mut lines = vec![
        plain_line(
            format!("  Tickets for {} \u{00B7} Total Tickets: {}", role, stats.total),
            app.theme.text_bright,
            bg,
        ),
        plain_line(format!("  {}", counts), app.theme.dim, bg),
        form_line(
            app,
            "Search",
            text_value(app, &app.admin.search, search_editing, false),
            search_editing,
        ),
        Line::default(),
        header_line(app, &TICKET_COLUMNS, width),
    ];

    let visible = (area.height as usize).saturating_sub(LIST_TOP + LIST_BOTTOM).max(1);
    let cursor = app.admin.cursor.min(rows.len().saturating_sub(1));
    let offset = cursor.saturating_sub(visible - 1);
    if rows.is_empty() {
        lines.push(plain_line("  No tickets found.", app.theme.dim, bg));
    }
    for (i, t) in rows.iter().enumerate().skip(offset).take(visible) {
        lines.push(ticket_line(app, t, &TICKET_COLUMNS, width, i == cursor, re.as_ref()));
    }

    if let Some(selected) = rows.get(cursor) {
        lines.push(Line::default());
        let detail = match &app.edit {
            Some(target @ EditTarget::Resolution(id)) if is_editing(app, target) && *id == selected.id => {
                let mut spans = vec![Span::styled(
                    format!("  Resolution for {}: ", id),
                    Style::default().fg(app.theme.accent).bg(bg),
                )];
                spans.extend(text_value(app, &app.admin.buffer, true, false));
                Line::from(spans)
            }
            _ => plain_line(
                format!(
                    "  {} submitted {} by {} ({})",
                    selected.id, selected.date_submitted, selected.full_name, selected.mobile_no
                ),
                app.theme.dim,
                bg,
            ),
        };
        lines.push(detail);
    }

    let list_rows = lines.len();
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);

    if search_editing {
        place_field_cursor(frame, area, 2, &app.admin.search);
    } else if let Some(EditTarget::Resolution(id)) = &app.edit
        && is_editing(app, &EditTarget::Resolution(id.clone()))
    {
        let prefix = format!("  Resolution for {}: ", id).chars().count();
        let x = area.x as usize + prefix + app.admin.buffer.cursor_col();
        let y = area.y as usize + list_rows - 1;
        if x < (area.x + area.width) as usize && y < (area.y + area.height) as usize {
            frame.set_cursor_position((x as u16, y as u16));
        }
    }
}

fn render_poc(frame: &mut Frame, app: &App, session: &Session, area: Rect) {
    let bg = app.theme.background;
    let mut lines = vec![
        plain_line("  POC directory", app.theme.text_bright, bg),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "  {}{}{}",
                pad_to_width("Department", LABEL_W),
                pad_to_width("POC Name", 24),
                "POC Phone"
            ),
            Style::default()
                .fg(app.theme.dim)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let mut cursor_pos = None;
    for (i, dept) in Department::ALL.into_iter().enumerate() {
        let contact = session.poc().contact(dept);
        let selected = i == app.admin.poc_cursor;
        let row_bg = if selected { app.theme.selection_bg } else { bg };
        let style = Style::default().fg(app.theme.text).bg(row_bg);

        let editing_name = is_editing(app, &EditTarget::PocName(dept));
        let editing_phone = is_editing(app, &EditTarget::PocPhone(dept));
        let name = if editing_name { app.admin.buffer.text() } else { contact.name.as_str() };
        let phone = if editing_phone { app.admin.buffer.text() } else { contact.phone.as_str() };
        if editing_name {
            cursor_pos = Some((2 + LABEL_W, lines.len()));
        } else if editing_phone {
            cursor_pos = Some((2 + LABEL_W + 24, lines.len()));
        }

        let marker = if selected { "\u{25B8} " } else { "  " };
        let edit_style = style.add_modifier(Modifier::UNDERLINED);
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(app.theme.accent).bg(row_bg)),
            Span::styled(pad_to_width(dept.name(), LABEL_W), style),
            Span::styled(pad_to_width(name, 24), if editing_name { edit_style } else { style }),
            Span::styled(phone.to_string(), if editing_phone { edit_style } else { style }),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
    if let Some((col, row)) = cursor_pos {
        let x = area.x as usize + col + app.admin.buffer.cursor_col();
        let y = area.y as usize + row;
        if x < (area.x + area.width) as usize && y < (area.y + area.height) as usize {
            frame.set_cursor_position((x as u16, y as u16));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::Panel;
    use crate::tui::render::test_helpers::*;
    use insta::assert_snapshot;

    #[test]
    fn login_form() {
        let mut app = app_with_tickets(SAMPLE_TICKETS);
        app.panel = Panel::Admin;
        app.admin.password.set("abc");
        let output = render_to_string(60, 8, |frame, area| render_admin_view(frame, &app, area));
        assert_snapshot!(output, @r"
          Admin login

        ▸ Role         ‹ Super Admin ›
          Password     ***
        ");
    }

    #[test]
    fn super_admin_sees_every_ticket() {
        let mut app = app_with_tickets(SAMPLE_TICKETS);
        logged_in_super(&mut app);
        let output = render_to_string(120, 16, |frame, area| render_admin_view(frame, &app, area));
        assert!(output.contains("Tickets for Super Admin · Total Tickets: 3"));
        assert!(output.contains("Open 1  In Progress 1  Closed 1"));
        for id in ["TICKET-1103", "TICKET-1102", "TICKET-1101"] {
            assert!(output.contains(id), "missing {id}");
        }
        assert!(output.contains("Cleared tray"));
        assert!(output.contains("TICKET-1103 submitted 2026-03-01 by Ravi Kumar (9820011111)"));
    }

    #[test]
    fn scoped_admin_sees_only_department() {
        let mut app = app_with_tickets(SAMPLE_TICKETS);
        app.admin.login_role = Role::Scoped(Department::It);
        app.admin.password.set("admin123");
        app.login();
        let output = render_to_string(120, 16, |frame, area| render_admin_view(frame, &app, area));
        assert!(output.contains("Tickets for IT · Total Tickets: 1"));
        assert!(output.contains("TICKET-1102"));
        assert!(!output.contains("TICKET-1103"));
    }

    #[test]
    fn list_scrolls_to_cursor() {
        let mut app = app_with_tickets(SAMPLE_TICKETS);
        logged_in_super(&mut app);
        app.admin.cursor = 2;
        // Room for a single row
        let output = render_to_string(120, 8, |frame, area| render_admin_view(frame, &app, area));
        assert!(output.contains("▸ TICKET-1101"));
        assert!(!output.contains("TICKET-1103  "));
    }

    #[test]
    fn poc_directory_lists_all_departments() {
        let mut app = app_with_tickets(SAMPLE_TICKETS);
        logged_in_super(&mut app);
        app.toggle_poc_focus();
        let output = render_to_string(80, 12, |frame, area| render_admin_view(frame, &app, area));
        assert!(output.contains("POC directory"));
        assert!(output.contains("▸ Comp"));
        assert!(output.contains("Exam Cell"));
        assert_eq!(output.matches("0000000000").count(), 6);
    }
}
