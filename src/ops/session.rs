use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry};
use crate::io::store::{self, StoreError, TableStore};
use crate::model::config::AdminConfig;
use crate::model::poc::{PocContact, PocDirectory, PocRecord};
use crate::model::ticket::{Department, Priority, Ticket, TicketId, TicketStatus};
use crate::ops::allocator::IdAllocator;
use crate::ops::chat::{self, ChatHistory, ChatResponse, Speaker};
use crate::ops::filter::{Scope, filter_tickets};
use crate::ops::poc_ops::{self, PocError};
use crate::ops::stats::{TicketStats, ticket_stats};
use crate::ops::ticket_ops::{self, NewTicket, ReconcileReport, Role, TicketError};
use crate::parse::serialize_tickets;

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("access denied: incorrect password")]
    AccessDenied,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("super admin only")]
    SuperOnly,
    #[error(transparent)]
    Ticket(#[from] TicketError),
    #[error(transparent)]
    Poc(#[from] PocError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted ticket and who to contact about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: Ticket,
    pub contact: PocContact,
}

/// Per-session state: both tables, the admin login and the chat history.
///
/// Tables are read from the store once, when the session opens. Every
/// mutation is applied to a copy of the table, the whole copy is written
/// through the store, and only then does it replace the in-memory table.
/// A failed write leaves the session as it was.
pub struct Session {
    id: SessionId,
    store: Rc<dyn TableStore>,
    tickets: Vec<Ticket>,
    poc: PocDirectory,
    role: Option<Role>,
    ids: IdAllocator,
    chat: ChatHistory,
    last_active: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("tickets", &self.tickets.len())
            .field("role", &self.role)
            .field("last_active", &self.last_active)
            .finish()
    }
}

impl Session {
    /// Open a session, loading (and if needed creating) both tables
    pub fn open(
        id: SessionId,
        store: Rc<dyn TableStore>,
        seed: u64,
        now: DateTime<Utc>,
    ) -> Result<Session, StoreError> {
        let loaded = store::load_tickets(store.as_ref())?;
        let poc = store::load_or_init_poc(store.as_ref())?;
        let mut ids = IdAllocator::new(seed);
        if let Some(n) = loaded.dropped_max {
            ids.reserve(n);
        }
        Ok(Session {
            id,
            store,
            tickets: loaded.rows,
            poc,
            role: None,
            ids,
            chat: ChatHistory::default(),
            last_active: now,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn poc(&self) -> &PocDirectory {
        &self.poc
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn chat_history(&self) -> &ChatHistory {
        &self.chat
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }

    // -- submission ---------------------------------------------------------

    /// Submit a new ticket: allocate an id, prepend it and persist
    pub fn submit(&mut self, form: NewTicket, today: NaiveDate) -> Result<Submission, DeskError> {
        form.validate()?;
        let ticket = self.commit_tickets(|tickets, ids| {
            let ticket = form.into_ticket(ids.next(tickets), today)?;
            tickets.insert(0, ticket.clone());
            Ok((ticket, true))
        })?;
        let contact = self.poc.contact(ticket.department);
        Ok(Submission { ticket, contact })
    }

    /// User-side search across every department
    pub fn search(&self, keyword: &str) -> Vec<Ticket> {
        filter_tickets(&self.tickets, Scope::All, keyword)
    }

    pub fn stats(&self, scope: Scope) -> TicketStats {
        ticket_stats(&self.tickets, scope)
    }

    // -- admin --------------------------------------------------------------

    /// Check the admin password and record the role. A wrong password
    /// leaves the session logged out.
    pub fn login(&mut self, role: Role, password: &str, admin: &AdminConfig) -> Result<(), DeskError> {
        if password != admin.password {
            self.role = None;
            return Err(DeskError::AccessDenied);
        }
        self.role = Some(role);
        Ok(())
    }

    pub fn logout(&mut self) {
        self.role = None;
    }

    fn current_role(&self) -> Result<Role, DeskError> {
        self.role.ok_or(DeskError::NotLoggedIn)
    }

    fn require_super(&self) -> Result<(), DeskError> {
        if self.current_role()?.is_super() {
            Ok(())
        } else {
            Err(DeskError::SuperOnly)
        }
    }

    /// Tickets visible to the logged-in role, filtered by keyword
    pub fn admin_view(&self, keyword: &str) -> Result<Vec<Ticket>, DeskError> {
        let role = self.current_role()?;
        Ok(filter_tickets(&self.tickets, role.scope(), keyword))
    }

    pub fn set_status(&mut self, id: &TicketId, status: TicketStatus) -> Result<bool, DeskError> {
        let scope = self.current_role()?.scope();
        self.commit_tickets(|tickets, _| {
            let changed = ticket_ops::set_status(tickets, scope, id, status)?;
            Ok((changed, changed))
        })
    }

    pub fn set_priority(&mut self, id: &TicketId, priority: Priority) -> Result<bool, DeskError> {
        let scope = self.current_role()?.scope();
        self.commit_tickets(|tickets, _| {
            let changed = ticket_ops::set_priority(tickets, scope, id, priority)?;
            Ok((changed, changed))
        })
    }

    pub fn set_resolution(&mut self, id: &TicketId, resolution: &str) -> Result<bool, DeskError> {
        let scope = self.current_role()?.scope();
        self.commit_tickets(|tickets, _| {
            let changed = ticket_ops::set_resolution(tickets, scope, id, resolution)?;
            Ok((changed, changed))
        })
    }

    /// Merge an edited admin view back into the table by id
    pub fn apply_edits(
        &mut self,
        view_ids: &[TicketId],
        edited: Vec<Ticket>,
    ) -> Result<ReconcileReport, DeskError> {
        let role = self.current_role()?;
        self.commit_tickets(|tickets, ids| {
            let report = ticket_ops::reconcile(tickets, role, view_ids, edited, ids);
            let changed = report.changed();
            Ok((report, changed))
        })
    }

    /// Delete a ticket. The removed row is kept in the recovery log.
    pub fn delete(&mut self, id: &TicketId) -> Result<Ticket, DeskError> {
        self.require_super()?;
        let removed = self.commit_tickets(|tickets, _| {
            let removed = ticket_ops::delete_ticket(tickets, id)?;
            Ok((removed, true))
        })?;
        self.store.log(
            RecoveryEntry::new(RecoveryCategory::Delete, format!("ticket {} deleted", removed.id))
                .field("Department", removed.department.name())
                .body(serialize_tickets(std::slice::from_ref(&removed))),
        );
        Ok(removed)
    }

    pub fn edit_poc(
        &mut self,
        department: Department,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<bool, DeskError> {
        self.require_super()?;
        self.commit_poc(|poc| {
            let changed = poc_ops::update_contact(poc, department, name, phone)?;
            Ok((changed, changed))
        })
    }

    /// Apply an edited copy of the POC directory
    pub fn apply_poc_edit(&mut self, edited: &[PocRecord]) -> Result<Vec<Department>, DeskError> {
        self.require_super()?;
        self.commit_poc(|poc| {
            let changed = poc_ops::apply_directory_edit(poc, edited);
            let any = !changed.is_empty();
            Ok((changed, any))
        })
    }

    // -- chat ---------------------------------------------------------------

    /// Answer a chat query and record both sides in the history
    pub fn chat(&mut self, query: &str) -> ChatResponse {
        let response = chat::respond(query, &self.tickets, &self.poc);
        self.chat.push(Speaker::User, query);
        self.chat.push(Speaker::Assistant, response.message.clone());
        response
    }

    pub fn clear_chat(&mut self) {
        self.chat.clear();
    }

    // -- persistence --------------------------------------------------------

    /// Run `edit` against copies of the ticket table and id allocator. The
    /// closure reports whether anything changed; changed copies are saved
    /// and kept only if the write succeeds.
    fn commit_tickets<T>(
        &mut self,
        edit: impl FnOnce(&mut Vec<Ticket>, &mut IdAllocator) -> Result<(T, bool), DeskError>,
    ) -> Result<T, DeskError> {
        let mut tickets = self.tickets.clone();
        let mut ids = self.ids.clone();
        let (out, changed) = edit(&mut tickets, &mut ids)?;
        if changed {
            store::save_tickets(self.store.as_ref(), &tickets)?;
            self.tickets = tickets;
            self.ids = ids;
        }
        Ok(out)
    }

    fn commit_poc<T>(
        &mut self,
        edit: impl FnOnce(&mut PocDirectory) -> Result<(T, bool), DeskError>,
    ) -> Result<T, DeskError> {
        let mut poc = self.poc.clone();
        let (out, changed) = edit(&mut poc)?;
        if changed {
            store::save_poc(self.store.as_ref(), &poc)?;
            self.poc = poc;
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Live sessions keyed by id, dropped after sitting idle
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    idle_timeout: Duration,
    seed: u64,
}

impl SessionRegistry {
    pub fn new(idle_timeout_mins: u64, seed: u64) -> Self {
        let mins = i64::try_from(idle_timeout_mins).unwrap_or(i64::MAX / 60_000);
        SessionRegistry {
            sessions: HashMap::new(),
            idle_timeout: Duration::minutes(mins),
            seed,
        }
    }

    /// Session for `id`, opening it (and loading the tables) on first use.
    /// Marks the session active at `now`.
    pub fn get_or_create(
        &mut self,
        id: &SessionId,
        store: &Rc<dyn TableStore>,
        now: DateTime<Utc>,
    ) -> Result<&mut Session, StoreError> {
        let session = match self.sessions.entry(id.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                e.insert(Session::open(id.clone(), Rc::clone(store), self.seed, now)?)
            }
        };
        session.touch(now);
        Ok(session)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Drop sessions idle for longer than the timeout; returns their ids
    pub fn expire_idle(&mut self, now: DateTime<Utc>) -> Vec<SessionId> {
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| now - s.last_active() > self.idle_timeout)
            .map(|s| s.id().clone())
            .collect();
        for id in &expired {
            self.sessions.remove(id);
        }
        expired
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::{MemoryStore, TableKind};
    use crate::ops::chat::ChatTable;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn open(store: &Rc<MemoryStore>) -> Session {
        let dyn_store: Rc<dyn TableStore> = store.clone();
        Session::open(SessionId::new("s1"), dyn_store, 1101, now()).unwrap()
    }

    fn form(dept: Department, issue: &str) -> NewTicket {
        NewTicket {
            full_name: "Anu".into(),
            mobile_no: "9800011122".into(),
            department: dept,
            priority: Priority::Medium,
            issue: issue.into(),
        }
    }

    fn admin() -> AdminConfig {
        AdminConfig::default()
    }

    #[test]
    fn first_submission_on_empty_table() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        let sub = session.submit(form(Department::Comp, "Keyboard dead"), today()).unwrap();
        assert_eq!(sub.ticket.id.as_str(), "TICKET-1102");
        assert_eq!(sub.ticket.status, TicketStatus::Open);
        assert_eq!(sub.contact, PocContact::placeholder());
        let saved = store.contents(TableKind::Tickets).unwrap();
        assert!(saved.contains("TICKET-1102,Keyboard dead,Open,Medium,2026-03-02,Anu"));
    }

    #[test]
    fn submissions_are_prepended() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.submit(form(Department::Comp, "first"), today()).unwrap();
        session.submit(form(Department::It, "second"), today()).unwrap();
        let ids: Vec<&str> = session.tickets().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["TICKET-1103", "TICKET-1102"]);
    }

    #[test]
    fn blank_form_is_rejected_without_writing() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        let before = store.contents(TableKind::Tickets);
        let err = session.submit(form(Department::Comp, "  "), today()).unwrap_err();
        assert!(matches!(err, DeskError::Ticket(TicketError::InvalidForm(_))));
        assert!(session.tickets().is_empty());
        assert_eq!(store.contents(TableKind::Tickets), before);
    }

    #[test]
    fn wrong_password_denies_access() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        let err = session.login(Role::Super, "guess", &admin()).unwrap_err();
        assert_eq!(err.to_string(), "access denied: incorrect password");
        assert!(session.role().is_none());
        assert!(matches!(session.admin_view(""), Err(DeskError::NotLoggedIn)));
    }

    #[test]
    fn scoped_admin_cannot_delete() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.submit(form(Department::Comp, "x"), today()).unwrap();
        session
            .login(Role::Scoped(Department::Comp), "admin123", &admin())
            .unwrap();
        let err = session.delete(&TicketId::new("TICKET-1102")).unwrap_err();
        assert!(matches!(err, DeskError::SuperOnly));
        assert!(matches!(
            session.edit_poc(Department::Comp, Some("x"), None),
            Err(DeskError::SuperOnly)
        ));
    }

    #[test]
    fn delete_then_status_is_not_found() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.submit(form(Department::Civil, "Leaking roof"), today()).unwrap();
        session.login(Role::Super, "admin123", &admin()).unwrap();
        let removed = session.delete(&TicketId::new("TICKET-1102")).unwrap();
        assert_eq!(removed.issue, "Leaking roof");

        let r = session.chat("status of ticket-1102");
        assert_eq!(r.message, "Ticket TICKET-1102 not found.");
        assert!(r.table.is_empty());

        let logged = store.logged();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].category, RecoveryCategory::Delete);
        assert!(logged[0].body.contains("Leaking roof"));
    }

    #[test]
    fn deleted_id_is_not_reissued_in_session() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.submit(form(Department::Comp, "a"), today()).unwrap();
        session.submit(form(Department::Comp, "b"), today()).unwrap();
        session.login(Role::Super, "admin123", &admin()).unwrap();
        session.delete(&TicketId::new("TICKET-1103")).unwrap();
        let sub = session.submit(form(Department::Comp, "c"), today()).unwrap();
        assert_eq!(sub.ticket.id.as_str(), "TICKET-1104");
    }

    #[test]
    fn scoped_view_and_edit() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.submit(form(Department::Comp, "comp issue"), today()).unwrap();
        session.submit(form(Department::It, "it issue"), today()).unwrap();
        session
            .login(Role::Scoped(Department::It), "admin123", &admin())
            .unwrap();

        let view = session.admin_view("").unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].department, Department::It);

        let id = view[0].id.clone();
        assert!(session.set_status(&id, TicketStatus::InProgress).unwrap());
        let saved = store.contents(TableKind::Tickets).unwrap();
        assert!(saved.contains("it issue,In Progress"));

        let err = session
            .set_status(&TicketId::new("TICKET-1102"), TicketStatus::Closed)
            .unwrap_err();
        assert!(matches!(err, DeskError::Ticket(TicketError::OutOfScope { .. })));
    }

    #[test]
    fn apply_edits_persists_changes() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.submit(form(Department::Mech, "belt slipping"), today()).unwrap();
        session.login(Role::Super, "admin123", &admin()).unwrap();
        let view = session.admin_view("").unwrap();
        let ids: Vec<TicketId> = view.iter().map(|t| t.id.clone()).collect();
        let mut edited = view;
        edited[0].resolution = "Belt replaced".into();
        let report = session.apply_edits(&ids, edited).unwrap();
        assert_eq!(report.updated.len(), 1);
        assert!(store.contents(TableKind::Tickets).unwrap().contains("Belt replaced"));
    }

    #[test]
    fn poc_edit_survives_reload() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.login(Role::Super, "admin123", &admin()).unwrap();
        assert!(session.edit_poc(Department::It, None, Some("0447654321")).unwrap());

        let reloaded = open(&store);
        assert_eq!(reloaded.poc().get(Department::It).unwrap().phone, "0447654321");
    }

    #[test]
    fn submission_returns_department_contact() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.login(Role::Super, "admin123", &admin()).unwrap();
        session.edit_poc(Department::ExamCell, Some("Latha"), Some("0401112222")).unwrap();
        let sub = session.submit(form(Department::ExamCell, "Hall ticket"), today()).unwrap();
        assert_eq!(sub.contact.name, "Latha");
    }

    #[test]
    fn chat_records_history_and_clears() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        let r = session.chat("list all the tickets");
        assert_eq!(r.message, "No tickets found.");
        assert_eq!(r.table, ChatTable::Empty);
        assert_eq!(session.chat_history().len(), 2);
        session.clear_chat();
        assert!(session.chat_history().is_empty());
    }

    #[test]
    fn failed_persist_reports_store_error() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        store.set_fail_writes(true);
        let err = session.submit(form(Department::Comp, "x"), today()).unwrap_err();
        assert!(matches!(err, DeskError::Store(StoreError::WriteError { .. })));
        assert_eq!(store.logged()[0].category, RecoveryCategory::Write);
    }

    #[test]
    fn failed_write_leaves_session_unchanged() {
        let store = Rc::new(MemoryStore::new());
        let mut session = open(&store);
        session.submit(form(Department::Comp, "Keyboard dead"), today()).unwrap();
        session.login(Role::Super, "admin123", &admin()).unwrap();
        let saved = store.contents(TableKind::Tickets);
        let poc = session.poc().clone();
        store.set_fail_writes(true);

        assert!(session.submit(form(Department::It, "Projector"), today()).is_err());
        assert_eq!(session.tickets().len(), 1);

        let id = TicketId::new("TICKET-1102");
        assert!(session.set_status(&id, TicketStatus::Closed).is_err());
        assert_eq!(session.tickets()[0].status, TicketStatus::Open);

        assert!(session.delete(&id).is_err());
        assert_eq!(session.tickets()[0].id, id);
        assert!(store.logged().iter().all(|e| e.category == RecoveryCategory::Write));

        assert!(session.edit_poc(Department::Comp, Some("Ravi"), None).is_err());
        assert_eq!(session.poc(), &poc);
        assert_eq!(store.contents(TableKind::Tickets), saved);

        // The failed submit did not use up an id
        store.set_fail_writes(false);
        let sub = session.submit(form(Department::It, "Projector"), today()).unwrap();
        assert_eq!(sub.ticket.id.as_str(), "TICKET-1103");
        let ids: Vec<&str> = session.tickets().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["TICKET-1103", "TICKET-1102"]);
    }

    #[test]
    fn ids_on_unreadable_rows_are_not_reissued() {
        let store = Rc::new(MemoryStore::new().with_table(
            TableKind::Tickets,
            "ID,Issue,Status,Priority,Date Submitted,Full Name,Mobile No,Department,Resolution\n\
             TICKET-1200,bad,Waiting,Low,2024-01-01,A,1,Comp,\n\
             TICKET-1101,ok,Open,Low,2024-01-01,A,1,Comp,\n",
        ));
        let mut session = open(&store);
        assert_eq!(session.tickets().len(), 1);
        let sub = session.submit(form(Department::Comp, "Mouse"), today()).unwrap();
        assert_eq!(sub.ticket.id.as_str(), "TICKET-1201");
    }

    #[test]
    fn registry_creates_once_and_expires_idle() {
        let store = Rc::new(MemoryStore::new());
        let dyn_store: Rc<dyn TableStore> = store.clone();
        let mut registry = SessionRegistry::new(30, 1101);
        let a = SessionId::new("a");
        let b = SessionId::new("b");

        registry
            .get_or_create(&a, &dyn_store, now())
            .unwrap()
            .submit(form(Department::Comp, "x"), today())
            .unwrap();
        // same id returns the same in-memory session
        assert_eq!(registry.get_or_create(&a, &dyn_store, now()).unwrap().tickets().len(), 1);

        let later = now() + Duration::minutes(20);
        registry.get_or_create(&b, &dyn_store, later).unwrap();
        assert_eq!(registry.len(), 2);

        let expired = registry.expire_idle(now() + Duration::minutes(40));
        assert_eq!(expired, vec![a.clone()]);
        assert!(registry.get(&a).is_none());
        assert!(registry.get(&b).is_some());
    }

    #[test]
    fn expired_session_reloads_from_store() {
        let store = Rc::new(MemoryStore::new());
        let dyn_store: Rc<dyn TableStore> = store.clone();
        let mut registry = SessionRegistry::new(1, 1101);
        let id = SessionId::new("tui");

        let session = registry.get_or_create(&id, &dyn_store, now()).unwrap();
        session.login(Role::Super, "admin123", &admin()).unwrap();
        session.submit(form(Department::Comp, "x"), today()).unwrap();

        registry.expire_idle(now() + Duration::minutes(5));
        let session = registry.get_or_create(&id, &dyn_store, now() + Duration::minutes(5)).unwrap();
        assert!(session.role().is_none());
        assert_eq!(session.tickets().len(), 1);
    }
}
