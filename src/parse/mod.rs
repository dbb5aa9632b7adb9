pub mod csv;
pub mod poc_table;
pub mod ticket_table;

use csv::parse_records;

pub use poc_table::{POC_HEADER, parse_poc, serialize_poc};
pub use ticket_table::{TICKET_HEADER, parse_edited_view, parse_tickets, serialize_tickets};

/// A table row that could not be parsed, kept for the recovery log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub reason: String,
    /// The row's source text
    pub raw: String,
}

impl DroppedRow {
    /// The row's first field, split the way the table reader splits it
    pub fn first_field(&self) -> Option<String> {
        let record = parse_records(&self.raw).into_iter().next()?;
        record.fields.into_iter().next()
    }
}

/// Result of parsing a table: the rows that parsed plus the ones that didn't
#[derive(Debug, Clone)]
pub struct ParsedTable<T> {
    pub rows: Vec<T>,
    pub dropped: Vec<DroppedRow>,
}

/// Parse a CSV table whose first record must equal `header`, converting each
/// following record with `row`. Conversion failures become [`DroppedRow`]s.
pub(crate) fn parse_table<T>(
    source: &str,
    header: &[&str],
    mut row: impl FnMut(&[String]) -> Result<T, String>,
) -> ParsedTable<T> {
    let mut records = parse_records(source).into_iter();
    let mut table = ParsedTable {
        rows: Vec::new(),
        dropped: Vec::new(),
    };

    let Some(first) = records.next() else {
        return table;
    };
    let header_ok = first.fields.len() == header.len()
        && first
            .fields
            .iter()
            .zip(header)
            .all(|(found, expected)| found.trim() == *expected);
    if !header_ok {
        table.dropped.push(DroppedRow {
            line: first.line,
            reason: format!("unexpected header, expected {}", header.join(",")),
            raw: first.raw,
        });
    }

    for record in records {
        if !header_ok {
            table.dropped.push(DroppedRow {
                line: record.line,
                reason: "row under unexpected header".to_string(),
                raw: record.raw,
            });
            continue;
        }
        match row(&record.fields) {
            Ok(value) => table.rows.push(value),
            Err(reason) => table.dropped.push(DroppedRow {
                line: record.line,
                reason,
                raw: record.raw,
            }),
        }
    }

    table
}
