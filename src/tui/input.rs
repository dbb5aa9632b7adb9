use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{AdminFocus, App, EditTarget, LoginField, Mode, Panel, SubmitField};

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    // Any key counts as activity; an expired session is reopened here
    if let Err(e) = app.open_session(Utc::now()) {
        app.set_error(e.to_string());
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Edit => handle_edit(app, key),
        Mode::Confirm => handle_confirm(app, key),
    }
}

fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => app.switch_panel(app.panel.next()),
        KeyCode::BackTab => app.switch_panel(app.panel.prev()),
        KeyCode::Char('1') => app.switch_panel(Panel::Submit),
        KeyCode::Char('2') => app.switch_panel(Panel::Admin),
        KeyCode::Char('3') => app.switch_panel(Panel::Chat),
        _ => match app.panel {
            Panel::Submit => navigate_submit(app, key),
            Panel::Admin if app.role().is_none() => navigate_login(app, key),
            Panel::Admin => navigate_admin(app, key),
            Panel::Chat => navigate_chat(app, key),
        },
    }
}

fn navigate_submit(app: &mut App, key: KeyEvent) {
    let field = app.submit.field;
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.submit.field = field.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.submit.field = field.next(),
        KeyCode::Char('/') => {
            app.submit.field = SubmitField::Search;
            app.begin_edit(EditTarget::Search);
        }
        KeyCode::Left | KeyCode::Char('h') => cycle_choice(app, field, false),
        KeyCode::Right | KeyCode::Char('l') => cycle_choice(app, field, true),
        KeyCode::Enter => match field {
            SubmitField::Name => app.begin_edit(EditTarget::Name),
            SubmitField::Phone => app.begin_edit(EditTarget::Phone),
            SubmitField::Issue => app.begin_edit(EditTarget::Issue),
            SubmitField::Search => app.begin_edit(EditTarget::Search),
            SubmitField::Department | SubmitField::Priority => cycle_choice(app, field, true),
            SubmitField::Send => app.submit_ticket(),
        },
        _ => {}
    }
}

fn cycle_choice(app: &mut App, field: SubmitField, forward: bool) {
    match field {
        SubmitField::Department => {
            app.submit.department = step(&crate::model::Department::ALL, app.submit.department, forward)
        }
        SubmitField::Priority => {
            app.submit.priority = step(&crate::model::Priority::ALL, app.submit.priority, forward)
        }
        _ => {}
    }
}

/// Neighbor of `current` in `all`, wrapping at both ends
fn step<T: Copy + PartialEq>(all: &[T], current: T, forward: bool) -> T {
    let n = all.len();
    let i = all.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
    all[next]
}

fn navigate_login(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.admin.login_field = LoginField::Role,
        KeyCode::Down | KeyCode::Char('j') => app.admin.login_field = LoginField::Password,
        KeyCode::Left | KeyCode::Char('h') if app.admin.login_field == LoginField::Role => {
            app.cycle_login_role(false)
        }
        KeyCode::Right | KeyCode::Char('l') if app.admin.login_field == LoginField::Role => {
            app.cycle_login_role(true)
        }
        KeyCode::Enter => {
            app.admin.login_field = LoginField::Password;
            app.begin_edit(EditTarget::Password);
        }
        _ => {}
    }
}

fn navigate_admin(app: &mut App, key: KeyEvent) {
    if app.admin.focus == AdminFocus::Poc {
        navigate_poc(app, key);
        return;
    }
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Char('g') | KeyCode::Home => app.admin.cursor = 0,
        KeyCode::Char('s') => app.cycle_status(),
        KeyCode::Char('p') => app.cycle_priority(),
        KeyCode::Char('r') => {
            if let Some(ticket) = app.selected_ticket() {
                app.begin_edit(EditTarget::Resolution(ticket.id));
            }
        }
        KeyCode::Char('D') => app.request_delete(),
        KeyCode::Char('/') => app.begin_edit(EditTarget::AdminSearch),
        KeyCode::Esc => {
            app.admin.search.clear();
            app.admin.cursor = 0;
        }
        KeyCode::Char('o') => app.toggle_poc_focus(),
        KeyCode::Char('L') => app.logout(),
        _ => {}
    }
}

fn navigate_poc(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Char('n') | KeyCode::Enter => {
            app.begin_edit(EditTarget::PocName(app.selected_department()))
        }
        KeyCode::Char('m') => app.begin_edit(EditTarget::PocPhone(app.selected_department())),
        KeyCode::Char('o') | KeyCode::Esc => app.toggle_poc_focus(),
        KeyCode::Char('L') => app.logout(),
        _ => {}
    }
}

fn navigate_chat(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('i') => app.begin_edit(EditTarget::Chat),
        KeyCode::Char('c') => app.clear_chat(),
        _ => {}
    }
}

fn handle_edit(app: &mut App, key: KeyEvent) {
    let Some(target) = app.edit.clone() else {
        app.mode = Mode::Navigate;
        return;
    };
    match key.code {
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Enter => app.commit_edit(),
        code => {
            let field = app.field_mut(&target);
            match code {
                KeyCode::Backspace => field.backspace(),
                KeyCode::Delete => field.delete(),
                KeyCode::Left => field.left(),
                KeyCode::Right => field.right(),
                KeyCode::Home => field.home(),
                KeyCode::End => field.end(),
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    field.insert(c)
                }
                _ => {}
            }
            if target == EditTarget::AdminSearch {
                app.admin.cursor = 0;
            }
        }
    }
}

fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        _ => app.cancel_delete(),
    }
}
