use crate::model::ticket::{Ticket, TicketId};
use crate::parse::DroppedRow;

/// Highest numeric suffix among well-formed ticket ids, if any
pub fn max_ticket_number(tickets: &[Ticket]) -> Option<u64> {
    tickets.iter().filter_map(|t| t.id.number()).max()
}

/// Next ticket id: one past the highest `TICKET-<n>` in the table, or one
/// past `seed` when no id parses. Malformed ids are ignored.
pub fn next_ticket_id(tickets: &[Ticket], seed: u64) -> TicketId {
    let base = max_ticket_number(tickets).unwrap_or(seed);
    TicketId::from_number(base.saturating_add(1))
}

/// Highest ticket number on rows that were dropped at load. Those ids
/// still exist in the file, so they count as taken.
pub fn max_dropped_number(dropped: &[DroppedRow]) -> Option<u64> {
    dropped
        .iter()
        .filter_map(DroppedRow::first_field)
        .filter_map(|field| TicketId::new(field.trim()).number())
        .max()
}

/// Allocator for a session: recomputes from the table on every call and
/// never goes below a number it has already issued.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    seed: u64,
    high_water: Option<u64>,
}

impl IdAllocator {
    pub fn new(seed: u64) -> Self {
        IdAllocator {
            seed,
            high_water: None,
        }
    }

    /// Never issue `n` or anything below it
    pub fn reserve(&mut self, n: u64) {
        self.high_water = Some(self.high_water.map_or(n, |hw| hw.max(n)));
    }

    pub fn next(&mut self, tickets: &[Ticket]) -> TicketId {
        let from_table = max_ticket_number(tickets).unwrap_or(self.seed);
        let base = match self.high_water {
            Some(hw) => from_table.max(hw),
            None => from_table,
        };
        let n = base.saturating_add(1);
        self.high_water = Some(n);
        TicketId::from_number(n)
    }
}
