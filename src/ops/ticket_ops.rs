use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::ticket::{Department, Priority, Ticket, TicketId, TicketStatus, UnknownValue};
use crate::ops::allocator::IdAllocator;
use crate::ops::filter::Scope;

/// Error type for ticket operations
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("ticket not found: {0}")]
    NotFound(TicketId),
    #[error("ticket {id} belongs to {department}, outside {scope}")]
    OutOfScope {
        id: TicketId,
        department: Department,
        scope: Scope,
    },
    #[error("invalid ticket: {0}")]
    InvalidForm(String),
}

/// Admin role chosen at login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// All departments, deletion and the POC directory
    Super,
    /// One department's tickets; status, priority and resolution only
    Scoped(Department),
}

impl Role {
    pub fn scope(self) -> Scope {
        match self {
            Role::Super => Scope::All,
            Role::Scoped(d) => Scope::Department(d),
        }
    }

    pub fn is_super(self) -> bool {
        self == Role::Super
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Super => write!(f, "Super Admin"),
            Role::Scoped(d) => write!(f, "{}", d),
        }
    }
}

impl FromStr for Role {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if matches!(lowered.as_str(), "super" | "super admin" | "super-admin" | "superadmin") {
            return Ok(Role::Super);
        }
        s.parse::<Department>()
            .map(Role::Scoped)
            .map_err(|_| UnknownValue {
                kind: "role",
                value: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Fields entered on the submission form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub full_name: String,
    pub mobile_no: String,
    pub department: Department,
    pub priority: Priority,
    pub issue: String,
}

impl NewTicket {
    /// Reject blank required fields
    pub fn validate(&self) -> Result<(), TicketError> {
        let required = [
            ("name", &self.full_name),
            ("mobile number", &self.mobile_no),
            ("issue", &self.issue),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| *label)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TicketError::InvalidForm(format!(
                "{} must not be empty",
                missing.join(", ")
            )))
        }
    }

    /// Build an open ticket with the given id and submission date
    pub fn into_ticket(self, id: TicketId, today: NaiveDate) -> Result<Ticket, TicketError> {
        self.validate()?;
        Ok(Ticket {
            id,
            issue: self.issue.trim().to_string(),
            status: TicketStatus::Open,
            priority: self.priority,
            date_submitted: today,
            full_name: self.full_name.trim().to_string(),
            mobile_no: self.mobile_no.trim().to_string(),
            department: self.department,
            resolution: String::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Single-field edits
// ---------------------------------------------------------------------------

fn find_in_scope<'a>(
    tickets: &'a mut [Ticket],
    scope: Scope,
    id: &TicketId,
) -> Result<&'a mut Ticket, TicketError> {
    let ticket = tickets
        .iter_mut()
        .find(|t| &t.id == id)
        .ok_or_else(|| TicketError::NotFound(id.clone()))?;
    if !scope.contains(ticket.department) {
        return Err(TicketError::OutOfScope {
            id: id.clone(),
            department: ticket.department,
            scope,
        });
    }
    Ok(ticket)
}

/// Set a ticket's status. Returns true when the value changed.
pub fn set_status(
    tickets: &mut [Ticket],
    scope: Scope,
    id: &TicketId,
    status: TicketStatus,
) -> Result<bool, TicketError> {
    let ticket = find_in_scope(tickets, scope, id)?;
    let changed = ticket.status != status;
    ticket.status = status;
    Ok(changed)
}

/// Set a ticket's priority. Returns true when the value changed.
pub fn set_priority(
    tickets: &mut [Ticket],
    scope: Scope,
    id: &TicketId,
    priority: Priority,
) -> Result<bool, TicketError> {
    let ticket = find_in_scope(tickets, scope, id)?;
    let changed = ticket.priority != priority;
    ticket.priority = priority;
    Ok(changed)
}

/// Set a ticket's resolution text. Returns true when the value changed.
pub fn set_resolution(
    tickets: &mut [Ticket],
    scope: Scope,
    id: &TicketId,
    resolution: &str,
) -> Result<bool, TicketError> {
    let ticket = find_in_scope(tickets, scope, id)?;
    let changed = ticket.resolution != resolution;
    ticket.resolution = resolution.to_string();
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Remove a ticket by id, returning the removed row
pub fn delete_ticket(tickets: &mut Vec<Ticket>, id: &TicketId) -> Result<Ticket, TicketError> {
    let pos = tickets
        .iter()
        .position(|t| &t.id == id)
        .ok_or_else(|| TicketError::NotFound(id.clone()))?;
    Ok(tickets.remove(pos))
}

// ---------------------------------------------------------------------------
// Edit reconciliation
// ---------------------------------------------------------------------------

/// A row of an edited view that was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub id: TicketId,
    pub reason: String,
}

/// Outcome of merging an edited view back into the table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub updated: Vec<TicketId>,
    pub added: Vec<TicketId>,
    pub removed: Vec<TicketId>,
    pub skipped: Vec<SkippedRow>,
}

impl ReconcileReport {
    /// True when the table was modified
    pub fn changed(&self) -> bool {
        !(self.updated.is_empty() && self.added.is_empty() && self.removed.is_empty())
    }

    fn skip(&mut self, id: &TicketId, reason: impl Into<String>) {
        self.skipped.push(SkippedRow {
            id: id.clone(),
            reason: reason.into(),
        });
    }
}

/// Merge `edited` rows back into `tickets`, matching rows by id only.
///
/// `view_ids` are the ids the editor was shown. A scoped role may change
/// status, priority and resolution of its own department's rows and nothing
/// else. The super role replaces whole rows (except the id), appends rows
/// with a blank or unknown id under a fresh id, and removes rows that were
/// in the view but are absent from the edit.
pub fn reconcile(
    tickets: &mut Vec<Ticket>,
    role: Role,
    view_ids: &[TicketId],
    edited: Vec<Ticket>,
    ids: &mut IdAllocator,
) -> ReconcileReport {
    let scope = role.scope();
    let mut report = ReconcileReport::default();
    let mut seen: HashSet<TicketId> = HashSet::new();
    let mut additions = Vec::new();

    for row in edited {
        let blank = row.id.as_str().trim().is_empty();
        if !blank && !seen.insert(row.id.clone()) {
            report.skip(&row.id, "duplicate row in edit");
            continue;
        }

        let existing = if blank {
            None
        } else {
            tickets.iter_mut().find(|t| t.id == row.id)
        };

        let Some(current) = existing else {
            if role.is_super() {
                additions.push(row);
            } else {
                report.skip(&row.id, "unknown ticket");
            }
            continue;
        };

        if !scope.contains(current.department) {
            report.skip(&row.id, format!("ticket belongs to {}", current.department));
            continue;
        }

        match role {
            Role::Scoped(dept) => {
                if row.department != dept {
                    report.skip(&row.id, format!("cannot move ticket out of {}", dept));
                    continue;
                }
                let changed = current.status != row.status
                    || current.priority != row.priority
                    || current.resolution != row.resolution;
                if changed {
                    current.status = row.status;
                    current.priority = row.priority;
                    current.resolution = row.resolution;
                    report.updated.push(row.id);
                }
            }
            Role::Super => {
                if *current != row {
                    let id = current.id.clone();
                    *current = Ticket { id, ..row };
                    report.updated.push(current.id.clone());
                }
            }
        }
    }

    if role.is_super() {
        for id in view_ids {
            if seen.contains(id) {
                continue;
            }
            if let Some(pos) = tickets.iter().position(|t| &t.id == id) {
                tickets.remove(pos);
                report.removed.push(id.clone());
            }
        }

        for row in additions {
            let id = ids.next(tickets);
            report.added.push(id.clone());
            tickets.push(Ticket { id, ..row });
        }
    }

    report
}
