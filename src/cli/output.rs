use serde::Serialize;

use crate::model::poc::{PocContact, PocDirectory};
use crate::model::ticket::Ticket;
use crate::ops::chat::{ChatResponse, ChatTable, TicketSummary};
use crate::ops::session::Submission;
use crate::ops::stats::TicketStats;
use crate::ops::ticket_ops::ReconcileReport;
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Widest an issue cell is allowed to get in table output
const ISSUE_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TicketListJson<'a> {
    pub scope: String,
    pub count: usize,
    pub tickets: &'a [Ticket],
}

#[derive(Serialize)]
pub struct PocEntryJson<'a> {
    pub department: &'a str,
    pub name: &'a str,
    pub phone: &'a str,
}

#[derive(Serialize)]
pub struct SubmissionJson<'a> {
    pub ticket: &'a Ticket,
    pub contact: &'a PocContact,
}

#[derive(Serialize)]
pub struct StatsJson<'a> {
    pub scope: String,
    #[serde(flatten)]
    pub stats: &'a TicketStats,
}

pub fn poc_to_json(directory: &PocDirectory) -> Vec<PocEntryJson<'_>> {
    directory
        .iter()
        .map(|(dept, contact)| PocEntryJson {
            department: dept.name(),
            name: &contact.name,
            phone: &contact.phone,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Lay out rows as left-aligned columns separated by two spaces
fn format_columns(header: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = header.iter().map(|h| display_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(display_width(cell));
            }
        }
    }

    let render = |cells: Vec<&str>| -> String {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == last {
                    c.to_string()
                } else {
                    pad_to_width(c, widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render(header.to_vec()));
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

fn issue_cell(issue: &str) -> String {
    let single_line = issue.replace(['\n', '\r'], " ");
    truncate_to_width(&single_line, ISSUE_WIDTH)
}

/// Ticket table: id, status, priority, department, date, issue
pub fn format_ticket_table(tickets: &[Ticket]) -> Vec<String> {
    let rows: Vec<Vec<String>> = tickets
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.status.to_string(),
                t.priority.to_string(),
                t.department.to_string(),
                t.date_submitted.to_string(),
                issue_cell(&t.issue),
            ]
        })
        .collect();
    format_columns(
        &["ID", "Status", "Priority", "Department", "Date", "Issue"],
        &rows,
    )
}

/// Chat listing: id, issue, status, priority, department
pub fn format_summary_table(rows: &[TicketSummary]) -> Vec<String> {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                issue_cell(&t.issue),
                t.status.to_string(),
                t.priority.to_string(),
                t.department.to_string(),
            ]
        })
        .collect();
    format_columns(&["ID", "Issue", "Status", "Priority", "Department"], &rows)
}

pub fn format_poc_table(directory: &PocDirectory) -> Vec<String> {
    let rows: Vec<Vec<String>> = directory
        .iter()
        .map(|(dept, c)| vec![dept.to_string(), c.name.clone(), c.phone.clone()])
        .collect();
    format_columns(&["Department", "POC Name", "POC Phone"], &rows)
}

/// Every field of one ticket, one per line
pub fn format_ticket_detail(t: &Ticket) -> Vec<String> {
    let mut lines = vec![
        format!("{}  {}", t.id, t.issue),
        format!("status: {}", t.status),
        format!("priority: {}", t.priority),
        format!("department: {}", t.department),
        format!("submitted: {}", t.date_submitted),
        format!("by: {} ({})", t.full_name, t.mobile_no),
    ];
    if !t.resolution.is_empty() {
        lines.push(format!("resolution: {}", t.resolution));
    }
    lines
}

pub fn format_submission(sub: &Submission) -> Vec<String> {
    let mut lines = vec!["Ticket submitted!".to_string()];
    lines.extend(format_ticket_table(std::slice::from_ref(&sub.ticket)));
    lines.push(String::new());
    lines.push(format!("Contact POC for {} department", sub.ticket.department));
    lines.push(format!("  name:  {}", sub.contact.name));
    lines.push(format!("  phone: {}", sub.contact.phone));
    lines
}

pub fn format_chat_response(response: &ChatResponse) -> Vec<String> {
    let mut lines: Vec<String> = response.message.lines().map(str::to_string).collect();
    match &response.table {
        ChatTable::Empty => {}
        ChatTable::Tickets(rows) => lines.extend(format_summary_table(rows)),
        ChatTable::Poc(records) => {
            let dir = PocDirectory::from_records(records.iter().cloned());
            lines.extend(format_poc_table(&dir));
        }
        ChatTable::Detail(ticket) => lines.extend(format_ticket_detail(ticket)),
    }
    lines
}

pub fn format_stats(stats: &TicketStats, scope: &str) -> Vec<String> {
    let mut lines = vec![format!("{} tickets in {}", stats.total, scope)];
    lines.push(String::new());
    let status: Vec<String> = stats
        .by_status
        .iter()
        .map(|(s, n)| format!("{} {}", n, s))
        .collect();
    lines.push(format!("status:      {}", status.join(" / ")));
    let priority: Vec<String> = stats
        .by_priority
        .iter()
        .map(|(p, n)| format!("{} {}", n, p))
        .collect();
    lines.push(format!("priority:    {}", priority.join(" / ")));
    if stats.by_department.len() > 1 {
        lines.push("departments:".to_string());
        let name_w = stats
            .by_department
            .iter()
            .map(|(d, _)| display_width(d.name()))
            .max()
            .unwrap_or(0);
        for (dept, n) in &stats.by_department {
            lines.push(format!("  {}  {}", pad_to_width(dept.name(), name_w), n));
        }
    }
    lines
}

pub fn format_reconcile_report(report: &ReconcileReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} updated, {} added, {} removed, {} skipped",
        report.updated.len(),
        report.added.len(),
        report.removed.len(),
        report.skipped.len()
    )];
    for id in &report.added {
        lines.push(format!("  added {}", id));
    }
    for id in &report.removed {
        lines.push(format!("  removed {}", id));
    }
    for skip in &report.skipped {
        let id = if skip.id.as_str().is_empty() {
            "(no id)"
        } else {
            skip.id.as_str()
        };
        lines.push(format!("  skipped {}: {}", id, skip.reason));
    }
    lines
}
