use chrono::NaiveDate;

use crate::model::ticket::{Department, Priority, Ticket, TicketId, TicketStatus};
use crate::parse::csv::write_record;
use crate::parse::{ParsedTable, parse_table};

/// Column headers of the ticket table, in file order
pub const TICKET_HEADER: [&str; 9] = [
    "ID",
    "Issue",
    "Status",
    "Priority",
    "Date Submitted",
    "Full Name",
    "Mobile No",
    "Department",
    "Resolution",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse the ticket table from CSV text.
///
/// Rows that cannot be turned into a [`Ticket`] are returned in `dropped`
/// instead of failing the whole table. A header that does not match
/// [`TICKET_HEADER`] drops every row.
pub fn parse_tickets(source: &str) -> ParsedTable<Ticket> {
    parse_table(source, &TICKET_HEADER, |fields| ticket_from_fields(fields, false))
}

/// Parse an exported admin view after editing. Same schema as the ticket
/// table, except that the ID column may be blank for rows being added.
pub fn parse_edited_view(source: &str) -> ParsedTable<Ticket> {
    parse_table(source, &TICKET_HEADER, |fields| ticket_from_fields(fields, true))
}

fn ticket_from_fields(fields: &[String], allow_blank_id: bool) -> Result<Ticket, String> {
    let [id, issue, status, priority, date, full_name, mobile_no, department, resolution] =
        fields
    else {
        return Err(format!(
            "expected {} columns, found {}",
            TICKET_HEADER.len(),
            fields.len()
        ));
    };

    let id = id.trim();
    if id.is_empty() && !allow_blank_id {
        return Err("empty ID".to_string());
    }

    Ok(Ticket {
        id: TicketId::new(id),
        issue: issue.clone(),
        status: status
            .trim()
            .parse::<TicketStatus>()
            .map_err(|e| e.to_string())?,
        priority: priority
            .trim()
            .parse::<Priority>()
            .map_err(|e| e.to_string())?,
        date_submitted: parse_date(date)?,
        full_name: full_name.clone(),
        mobile_no: mobile_no.clone(),
        department: department
            .trim()
            .parse::<Department>()
            .map_err(|e| e.to_string())?,
        resolution: resolution.clone(),
    })
}

/// Accepts `YYYY-MM-DD`, or a timestamp that starts with one.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|_| format!("invalid date: {:?}", s))
}

/// Serialize the ticket table to CSV, header first.
pub fn serialize_tickets(tickets: &[Ticket]) -> String {
    let mut out = String::new();
    write_record(&mut out, &TICKET_HEADER);
    for t in tickets {
        let date = t.date_submitted.format(DATE_FORMAT).to_string();
        write_record(
            &mut out,
            &[
                t.id.as_str(),
                t.issue.as_str(),
                t.status.name(),
                t.priority.name(),
                date.as_str(),
                t.full_name.as_str(),
                t.mobile_no.as_str(),
                t.department.name(),
                t.resolution.as_str(),
            ],
        );
    }
    out
}
