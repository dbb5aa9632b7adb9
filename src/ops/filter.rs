use std::fmt;

use crate::model::ticket::{Department, Ticket};

/// Which departments a view covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Department(Department),
}

impl Scope {
    pub fn contains(self, department: Department) -> bool {
        match self {
            Scope::All => true,
            Scope::Department(d) => d == department,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all departments"),
            Scope::Department(d) => write!(f, "{}", d),
        }
    }
}

/// Case-insensitive substring match against the ticket id or issue text.
/// An empty keyword matches everything; whitespace is searched like any
/// other text.
pub fn matches_keyword(ticket: &Ticket, keyword: &str) -> bool {
    if keyword.is_empty() {
        return true;
    }
    let needle = keyword.to_lowercase();
    ticket.id.as_str().to_lowercase().contains(&needle)
        || ticket.issue.to_lowercase().contains(&needle)
}

/// Tickets in `scope` that match `keyword`, in table order
pub fn filter_tickets(tickets: &[Ticket], scope: Scope, keyword: &str) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|t| scope.contains(t.department) && matches_keyword(t, keyword))
        .cloned()
        .collect()
}
