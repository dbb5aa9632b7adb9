use serde::Serialize;

use crate::model::ticket::{Department, Priority, Ticket, TicketStatus};
use crate::ops::filter::Scope;

/// Ticket counts within a scope. Every enum value appears, zero or not,
/// in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketStats {
    pub total: usize,
    pub by_status: Vec<(TicketStatus, usize)>,
    pub by_priority: Vec<(Priority, usize)>,
    pub by_department: Vec<(Department, usize)>,
}

impl TicketStats {
    pub fn status(&self, status: TicketStatus) -> usize {
        count_for(&self.by_status, status)
    }

    pub fn priority(&self, priority: Priority) -> usize {
        count_for(&self.by_priority, priority)
    }

    pub fn department(&self, department: Department) -> usize {
        count_for(&self.by_department, department)
    }
}

fn count_for<K: PartialEq>(counts: &[(K, usize)], key: K) -> usize {
    counts
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(0, |(_, n)| *n)
}

pub fn ticket_stats(tickets: &[Ticket], scope: Scope) -> TicketStats {
    let in_scope: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| scope.contains(t.department))
        .collect();

    let by_status = TicketStatus::ALL
        .iter()
        .map(|s| (*s, in_scope.iter().filter(|t| t.status == *s).count()))
        .collect();
    let by_priority = Priority::ALL
        .iter()
        .map(|p| (*p, in_scope.iter().filter(|t| t.priority == *p).count()))
        .collect();
    let by_department = Department::ALL
        .iter()
        .filter(|d| scope.contains(**d))
        .map(|d| (*d, in_scope.iter().filter(|t| t.department == *d).count()))
        .collect();

    TicketStats {
        total: in_scope.len(),
        by_status,
        by_priority,
        by_department,
    }
}
