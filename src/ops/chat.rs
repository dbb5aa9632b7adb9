use serde::Serialize;

use crate::model::poc::{PocDirectory, PocRecord};
use crate::model::ticket::{Department, Priority, Ticket, TicketId, TicketStatus};

pub const POC_LIST_MESSAGE: &str = "Here is the POC directory:";
pub const TICKET_LIST_MESSAGE: &str = "Here are all the tickets:";
pub const NO_TICKETS_MESSAGE: &str = "No tickets found.";
pub const MISSING_ID_MESSAGE: &str = "Please specify a valid ticket ID (e.g. TICKET-1102).";

/// Shown when no intent matches
pub const HELP_MESSAGE: &str = "\
I can help with:
  - \"show poc list\" for the department contacts
  - \"list all tickets\" for every ticket
  - \"status of TICKET-1102\" for one ticket's status";

/// What a chat query is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ListPoc,
    ListTickets,
    TicketStatus,
    Help,
}

/// Classify a query by keyword presence, first match wins
pub fn classify(query: &str) -> Intent {
    let q = query.to_lowercase();
    let listing = q.contains("list") || q.contains("show");
    if q.contains("poc") && listing {
        Intent::ListPoc
    } else if q.contains("ticket") && listing {
        Intent::ListTickets
    } else if q.contains("status") && q.contains("ticket") {
        Intent::TicketStatus
    } else {
        Intent::Help
    }
}

/// Ticket columns shown in chat listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketSummary {
    pub id: TicketId,
    pub issue: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub department: Department,
}

impl From<&Ticket> for TicketSummary {
    fn from(t: &Ticket) -> Self {
        TicketSummary {
            id: t.id.clone(),
            issue: t.issue.clone(),
            status: t.status,
            priority: t.priority,
            department: t.department,
        }
    }
}

/// Result table attached to a chat response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum ChatTable {
    Empty,
    Poc(Vec<PocRecord>),
    Tickets(Vec<TicketSummary>),
    Detail(Box<Ticket>),
}

impl ChatTable {
    pub fn is_empty(&self) -> bool {
        match self {
            ChatTable::Empty => true,
            ChatTable::Poc(rows) => rows.is_empty(),
            ChatTable::Tickets(rows) => rows.is_empty(),
            ChatTable::Detail(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub table: ChatTable,
}

impl ChatResponse {
    fn text(message: impl Into<String>) -> Self {
        ChatResponse {
            message: message.into(),
            table: ChatTable::Empty,
        }
    }
}

/// Answer a query against the current tables
pub fn respond(query: &str, tickets: &[Ticket], poc: &PocDirectory) -> ChatResponse {
    match classify(query) {
        Intent::ListPoc => ChatResponse {
            message: POC_LIST_MESSAGE.to_string(),
            table: ChatTable::Poc(poc.records()),
        },
        Intent::ListTickets if tickets.is_empty() => ChatResponse::text(NO_TICKETS_MESSAGE),
        Intent::ListTickets => ChatResponse {
            message: TICKET_LIST_MESSAGE.to_string(),
            table: ChatTable::Tickets(tickets.iter().map(TicketSummary::from).collect()),
        },
        Intent::TicketStatus => ticket_status(query, tickets),
        Intent::Help => ChatResponse::text(HELP_MESSAGE),
    }
}

/// The first whitespace-delimited token starting with "ticket", trailing
/// punctuation stripped and uppercased
pub fn extract_ticket_token(query: &str) -> Option<String> {
    query
        .split_whitespace()
        .find(|tok| tok.to_lowercase().starts_with("ticket"))
        .map(|tok| {
            tok.trim_end_matches(['?', '.', ',', '!', ';', ':'])
                .to_uppercase()
        })
}

fn ticket_status(query: &str, tickets: &[Ticket]) -> ChatResponse {
    let Some(token) = extract_ticket_token(query) else {
        return ChatResponse::text(MISSING_ID_MESSAGE);
    };
    match tickets.iter().find(|t| t.id.as_str() == token) {
        Some(ticket) => ChatResponse {
            message: format!("Status of {} is {}.", token, ticket.status),
            table: ChatTable::Detail(Box::new(ticket.clone())),
        },
        None => ChatResponse::text(format!("Ticket {} not found.", token)),
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    pub speaker: Speaker,
    pub message: String,
}

/// Ordered conversation for one session
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    entries: Vec<ChatEntry>,
}

impl ChatHistory {
    pub fn push(&mut self, speaker: Speaker, message: impl Into<String>) {
        self.entries.push(ChatEntry {
            speaker,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
