use std::io;
use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::cli::handlers::resolve_start;
use crate::io::desk_io::{discover_desk, file_store, load_desk};
use crate::io::store::{StoreError, TableStore};
use crate::model::{AdminConfig, Department, DeskConfig, PocContact, Priority, Ticket, TicketId};
use crate::ops::chat::ChatResponse;
use crate::ops::session::{DeskError, Session, SessionId, SessionRegistry, Submission};
use crate::ops::ticket_ops::{NewTicket, Role};

use super::field::TextField;
use super::input;
use super::render;
use super::theme::Theme;

/// Top-level panels, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Submit,
    Admin,
    Chat,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Submit, Panel::Admin, Panel::Chat];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Submit => "Submit",
            Panel::Admin => "Admin",
            Panel::Chat => "Chat",
        }
    }

    pub fn next(self) -> Panel {
        match self {
            Panel::Submit => Panel::Admin,
            Panel::Admin => Panel::Chat,
            Panel::Chat => Panel::Submit,
        }
    }

    pub fn prev(self) -> Panel {
        match self {
            Panel::Submit => Panel::Chat,
            Panel::Admin => Panel::Submit,
            Panel::Chat => Panel::Admin,
        }
    }
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing into the field named by `App::edit`
    Edit,
    /// Waiting for y/n on a pending delete
    Confirm,
}

/// Rows of the submission form, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitField {
    Name,
    Phone,
    Department,
    Priority,
    Issue,
    Send,
    Search,
}

impl SubmitField {
    pub const ALL: [SubmitField; 7] = [
        SubmitField::Name,
        SubmitField::Phone,
        SubmitField::Department,
        SubmitField::Priority,
        SubmitField::Issue,
        SubmitField::Send,
        SubmitField::Search,
    ];

    fn index(self) -> usize {
        SubmitField::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> SubmitField {
        SubmitField::ALL[(self.index() + 1).min(SubmitField::ALL.len() - 1)]
    }

    pub fn prev(self) -> SubmitField {
        SubmitField::ALL[self.index().saturating_sub(1)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Role,
    Password,
}

/// Which list the logged-in admin panel is working on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminFocus {
    Tickets,
    Poc,
}

/// Where an in-progress text edit is written back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    Name,
    Phone,
    Issue,
    Search,
    Password,
    AdminSearch,
    Resolution(TicketId),
    PocName(Department),
    PocPhone(Department),
    Chat,
}

impl EditTarget {
    pub fn label(&self) -> String {
        match self {
            EditTarget::Name => "full name".into(),
            EditTarget::Phone => "mobile no".into(),
            EditTarget::Issue => "issue".into(),
            EditTarget::Search | EditTarget::AdminSearch => "search".into(),
            EditTarget::Password => "password".into(),
            EditTarget::Resolution(id) => format!("resolution for {}", id),
            EditTarget::PocName(d) => format!("{} POC name", d),
            EditTarget::PocPhone(d) => format!("{} POC phone", d),
            EditTarget::Chat => "message".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Clone)]
pub struct SubmitState {
    pub field: SubmitField,
    pub name: TextField,
    pub phone: TextField,
    pub department: Department,
    pub priority: Priority,
    pub issue: TextField,
    pub search: TextField,
    /// Most recent successful submission, shown under the form
    pub last: Option<Submission>,
}

impl Default for SubmitState {
    fn default() -> Self {
        SubmitState {
            field: SubmitField::Name,
            name: TextField::default(),
            phone: TextField::default(),
            department: Department::Comp,
            priority: Priority::Medium,
            issue: TextField::default(),
            search: TextField::default(),
            last: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminState {
    pub login_field: LoginField,
    pub login_role: Role,
    pub password: TextField,
    pub search: TextField,
    pub focus: AdminFocus,
    pub cursor: usize,
    pub poc_cursor: usize,
    /// Scratch buffer for resolution and POC edits
    pub buffer: TextField,
    pub pending_delete: Option<TicketId>,
}

impl Default for AdminState {
    fn default() -> Self {
        AdminState {
            login_field: LoginField::Role,
            login_role: Role::Super,
            password: TextField::default(),
            search: TextField::default(),
            focus: AdminFocus::Tickets,
            cursor: 0,
            poc_cursor: 0,
            buffer: TextField::default(),
            pending_delete: None,
        }
    }
}

/// Every role offered at login, super first
pub fn role_choices() -> Vec<Role> {
    std::iter::once(Role::Super)
        .chain(Department::ALL.into_iter().map(Role::Scoped))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub input: TextField,
    pub last: Option<ChatResponse>,
}

/// Main application state
pub struct App {
    pub desk_name: String,
    pub theme: Theme,
    pub show_key_hints: bool,
    pub panel: Panel,
    pub mode: Mode,
    pub edit: Option<EditTarget>,
    edit_original: String,
    pub should_quit: bool,
    pub status: Option<StatusMessage>,
    pub submit: SubmitState,
    pub admin: AdminState,
    pub chat: ChatState,
    registry: SessionRegistry,
    store: Rc<dyn TableStore>,
    session_id: SessionId,
    admin_config: AdminConfig,
    idle_timeout_mins: u64,
}

impl App {
    pub fn new(config: &DeskConfig, store: Rc<dyn TableStore>) -> Self {
        App {
            desk_name: config.desk.name.clone(),
            theme: Theme::from_config(&config.ui),
            show_key_hints: config.ui.show_key_hints,
            panel: Panel::Submit,
            mode: Mode::Navigate,
            edit: None,
            edit_original: String::new(),
            should_quit: false,
            status: None,
            submit: SubmitState::default(),
            admin: AdminState::default(),
            chat: ChatState::default(),
            registry: SessionRegistry::new(config.session.idle_timeout_mins, config.ids.seed),
            store,
            session_id: SessionId::new("tui"),
            admin_config: config.admin.clone(),
            idle_timeout_mins: config.session.idle_timeout_mins,
        }
    }

    // -- session ------------------------------------------------------------

    /// Open (or touch) the session, loading the tables on first use
    pub fn open_session(&mut self, now: DateTime<Utc>) -> Result<&mut Session, StoreError> {
        self.registry.get_or_create(&self.session_id, &self.store, now)
    }

    /// The live session, if it has not expired
    pub fn session(&self) -> Option<&Session> {
        self.registry.get(&self.session_id)
    }

    /// Run an operation against the session and report any failure in the
    /// status row
    fn with_session<T>(
        &mut self,
        f: impl FnOnce(&mut Session) -> Result<T, DeskError>,
    ) -> Option<T> {
        let result = match self.open_session(Utc::now()) {
            Ok(session) => f(session),
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.set_error(e.to_string());
                None
            }
        }
    }

    /// Drop the session once it has sat idle past the timeout. The next key
    /// press opens a fresh one, logged out, with the tables reloaded.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let expired = self.registry.expire_idle(now);
        if expired.contains(&self.session_id) {
            self.admin = AdminState::default();
            self.chat.last = None;
            self.submit.last = None;
            if self.mode != Mode::Navigate {
                self.mode = Mode::Navigate;
                self.edit = None;
            }
            self.set_status(format!(
                "Session expired after {} idle minutes; tables reload on the next key",
                self.idle_timeout_mins
            ));
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn switch_panel(&mut self, panel: Panel) {
        self.panel = panel;
        self.status = None;
    }

    // -- editing ------------------------------------------------------------

    pub fn begin_edit(&mut self, target: EditTarget) {
        match &target {
            EditTarget::Resolution(id) => {
                let current = self
                    .session()
                    .and_then(|s| s.tickets().iter().find(|t| &t.id == id))
                    .map(|t| t.resolution.clone())
                    .unwrap_or_default();
                self.admin.buffer.set(current);
            }
            EditTarget::PocName(d) | EditTarget::PocPhone(d) => {
                let contact = self
                    .session()
                    .map(|s| s.poc().contact(*d))
                    .unwrap_or_else(PocContact::placeholder);
                let is_name = matches!(target, EditTarget::PocName(_));
                self.admin
                    .buffer
                    .set(if is_name { contact.name } else { contact.phone });
            }
            _ => {}
        }
        self.edit_original = self.field_mut(&target).text().to_string();
        self.edit = Some(target);
        self.mode = Mode::Edit;
    }

    /// The text field an edit target types into
    pub fn field_mut(&mut self, target: &EditTarget) -> &mut TextField {
        match target {
            EditTarget::Name => &mut self.submit.name,
            EditTarget::Phone => &mut self.submit.phone,
            EditTarget::Issue => &mut self.submit.issue,
            EditTarget::Search => &mut self.submit.search,
            EditTarget::Password => &mut self.admin.password,
            EditTarget::AdminSearch => &mut self.admin.search,
            EditTarget::Resolution(_) | EditTarget::PocName(_) | EditTarget::PocPhone(_) => {
                &mut self.admin.buffer
            }
            EditTarget::Chat => &mut self.chat.input,
        }
    }

    pub fn field(&self, target: &EditTarget) -> &TextField {
        match target {
            EditTarget::Name => &self.submit.name,
            EditTarget::Phone => &self.submit.phone,
            EditTarget::Issue => &self.submit.issue,
            EditTarget::Search => &self.submit.search,
            EditTarget::Password => &self.admin.password,
            EditTarget::AdminSearch => &self.admin.search,
            EditTarget::Resolution(_) | EditTarget::PocName(_) | EditTarget::PocPhone(_) => {
                &self.admin.buffer
            }
            EditTarget::Chat => &self.chat.input,
        }
    }

    /// Finish the current edit and apply it
    pub fn commit_edit(&mut self) {
        let Some(target) = self.edit.clone() else {
            self.mode = Mode::Navigate;
            return;
        };
        if target == EditTarget::Chat {
            // Stay in the input for the next message
            self.send_chat();
            return;
        }
        self.edit = None;
        self.mode = Mode::Navigate;
        match target {
            EditTarget::Password => self.login(),
            EditTarget::AdminSearch => self.admin.cursor = 0,
            EditTarget::Resolution(id) => {
                let text = self.admin.buffer.take();
                if let Some(true) = self.with_session(|s| s.set_resolution(&id, &text)) {
                    self.set_status(format!("Resolution saved for {}", id));
                }
            }
            EditTarget::PocName(d) => {
                let name = self.admin.buffer.take();
                self.save_poc(d, Some(&name), None);
            }
            EditTarget::PocPhone(d) => {
                let phone = self.admin.buffer.take();
                self.save_poc(d, None, Some(&phone));
            }
            EditTarget::Name | EditTarget::Phone | EditTarget::Issue => {
                self.submit.field = self.submit.field.next();
            }
            EditTarget::Search | EditTarget::Chat => {}
        }
    }

    /// Abandon the current edit, restoring the field
    pub fn cancel_edit(&mut self) {
        if let Some(target) = self.edit.take() {
            let original = std::mem::take(&mut self.edit_original);
            self.field_mut(&target).set(original);
        }
        self.mode = Mode::Navigate;
    }

    // -- submit panel -------------------------------------------------------

    pub fn submit_ticket(&mut self) {
        let form = NewTicket {
            full_name: self.submit.name.text().to_string(),
            mobile_no: self.submit.phone.text().to_string(),
            department: self.submit.department,
            priority: self.submit.priority,
            issue: self.submit.issue.text().to_string(),
        };
        let today = Local::now().date_naive();
        if let Some(submission) = self.with_session(|s| s.submit(form, today)) {
            self.set_status(format!(
                "Ticket submitted! {}  Contact POC for {} department",
                submission.ticket.id, submission.ticket.department
            ));
            self.submit.name.clear();
            self.submit.phone.clear();
            self.submit.issue.clear();
            self.submit.field = SubmitField::Name;
            self.submit.last = Some(submission);
        }
    }

    /// Tickets matching the user search box, across every department
    pub fn search_results(&self) -> Vec<Ticket> {
        let keyword = self.submit.search.text();
        if keyword.trim().is_empty() {
            return Vec::new();
        }
        self.session().map(|s| s.search(keyword)).unwrap_or_default()
    }

    // -- admin panel --------------------------------------------------------

    pub fn role(&self) -> Option<Role> {
        self.session().and_then(Session::role)
    }

    pub fn cycle_login_role(&mut self, forward: bool) {
        let choices = role_choices();
        let i = choices
            .iter()
            .position(|r| *r == self.admin.login_role)
            .unwrap_or(0);
        let n = choices.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        self.admin.login_role = choices[next];
    }

    pub fn login(&mut self) {
        let role = self.admin.login_role;
        let password = self.admin.password.take();
        let admin = self.admin_config.clone();
        if self
            .with_session(|s| s.login(role, &password, &admin))
            .is_some()
        {
            self.admin.cursor = 0;
            self.admin.focus = AdminFocus::Tickets;
            self.set_status(format!("Logged in as {}", role));
        }
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.registry.get_mut(&self.session_id) {
            session.logout();
        }
        self.admin = AdminState::default();
        self.set_status("Logged out");
    }

    /// Rows shown in the admin ticket list
    pub fn admin_rows(&self) -> Vec<Ticket> {
        self.session()
            .and_then(|s| s.admin_view(self.admin.search.text()).ok())
            .unwrap_or_default()
    }

    pub fn selected_ticket(&self) -> Option<Ticket> {
        self.admin_rows().into_iter().nth(self.admin.cursor)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = match self.admin.focus {
            AdminFocus::Tickets => self.admin_rows().len(),
            AdminFocus::Poc => Department::ALL.len(),
        };
        let cursor = match self.admin.focus {
            AdminFocus::Tickets => &mut self.admin.cursor,
            AdminFocus::Poc => &mut self.admin.poc_cursor,
        };
        *cursor = cursor.saturating_add_signed(delta).min(len.saturating_sub(1));
    }

    fn clamp_cursor(&mut self) {
        let len = self.admin_rows().len();
        self.admin.cursor = self.admin.cursor.min(len.saturating_sub(1));
    }

    pub fn cycle_status(&mut self) {
        let Some(ticket) = self.selected_ticket() else {
            return;
        };
        let next = ticket.status.cycle();
        if let Some(true) = self.with_session(|s| s.set_status(&ticket.id, next)) {
            self.set_status(format!("{} is now {}", ticket.id, next));
        }
    }

    pub fn cycle_priority(&mut self) {
        let Some(ticket) = self.selected_ticket() else {
            return;
        };
        let next = ticket.priority.cycle();
        if let Some(true) = self.with_session(|s| s.set_priority(&ticket.id, next)) {
            self.set_status(format!("{} priority {}", ticket.id, next));
        }
    }

    pub fn request_delete(&mut self) {
        if !self.role().is_some_and(Role::is_super) {
            self.set_error(DeskError::SuperOnly.to_string());
            return;
        }
        if let Some(ticket) = self.selected_ticket() {
            self.admin.pending_delete = Some(ticket.id);
            self.mode = Mode::Confirm;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.mode = Mode::Navigate;
        let Some(id) = self.admin.pending_delete.take() else {
            return;
        };
        if let Some(removed) = self.with_session(|s| s.delete(&id)) {
            self.set_status(format!("Deleted {} (kept in the recovery log)", removed.id));
            self.clamp_cursor();
        }
    }

    pub fn cancel_delete(&mut self) {
        self.admin.pending_delete = None;
        self.mode = Mode::Navigate;
        self.set_status("Delete cancelled");
    }

    pub fn toggle_poc_focus(&mut self) {
        if self.admin.focus == AdminFocus::Poc {
            self.admin.focus = AdminFocus::Tickets;
            return;
        }
        if self.role().is_some_and(Role::is_super) {
            self.admin.focus = AdminFocus::Poc;
        } else {
            self.set_error(DeskError::SuperOnly.to_string());
        }
    }

    pub fn selected_department(&self) -> Department {
        Department::ALL[self.admin.poc_cursor.min(Department::ALL.len() - 1)]
    }

    fn save_poc(&mut self, department: Department, name: Option<&str>, phone: Option<&str>) {
        match self.with_session(|s| s.edit_poc(department, name, phone)) {
            Some(true) => self.set_status(format!("POC for {} updated", department)),
            Some(false) => self.set_status("No changes"),
            None => {}
        }
    }

    // -- chat panel ---------------------------------------------------------

    pub fn send_chat(&mut self) {
        let query = self.chat.input.take();
        if query.trim().is_empty() {
            return;
        }
        if query.trim().eq_ignore_ascii_case("clear") {
            self.clear_chat();
            return;
        }
        self.chat.last = self.with_session(|s| Ok(s.chat(&query)));
    }

    pub fn clear_chat(&mut self) {
        self.with_session(|s| {
            s.clear_chat();
            Ok(())
        });
        self.chat.last = None;
        self.set_status("Chat cleared");
    }
}

pub fn run(desk_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let start = resolve_start(desk_dir)?;
    let root = discover_desk(&start)?;
    let desk = load_desk(&root)?;
    let store: Rc<dyn TableStore> = Rc::new(file_store(&desk));

    let mut app = App::new(&desk.config, store);
    app.open_session(Utc::now())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal if anything panics
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }
        app.tick(Utc::now());

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
