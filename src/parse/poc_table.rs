use std::collections::HashSet;

use crate::model::poc::{PocDirectory, PocRecord};
use crate::model::ticket::Department;
use crate::parse::csv::write_record;
use crate::parse::{ParsedTable, parse_table};

/// Column headers of the POC table, in file order
pub const POC_HEADER: [&str; 3] = ["Department", "POC Name", "POC Phone"];

/// Parse the POC table from CSV text.
///
/// Unknown departments and repeated departments are dropped (the first row
/// for a department wins). Missing departments are not filled in here; see
/// [`PocDirectory::backfill`].
pub fn parse_poc(source: &str) -> ParsedTable<PocRecord> {
    let mut seen = HashSet::new();
    parse_table(source, &POC_HEADER, |fields| {
        let record = poc_from_fields(fields)?;
        if !seen.insert(record.department) {
            return Err(format!("duplicate department {}", record.department));
        }
        Ok(record)
    })
}

fn poc_from_fields(fields: &[String]) -> Result<PocRecord, String> {
    let [department, name, phone] = fields else {
        return Err(format!(
            "expected {} columns, found {}",
            POC_HEADER.len(),
            fields.len()
        ));
    };
    Ok(PocRecord {
        department: department
            .trim()
            .parse::<Department>()
            .map_err(|e| e.to_string())?,
        name: name.clone(),
        phone: phone.trim().to_string(),
    })
}

/// Serialize the POC directory to CSV, header first.
pub fn serialize_poc(directory: &PocDirectory) -> String {
    let mut out = String::new();
    write_record(&mut out, &POC_HEADER);
    for (department, contact) in directory.iter() {
        write_record(
            &mut out,
            &[department.name(), contact.name.as_str(), contact.phone.as_str()],
        );
    }
    out
}
