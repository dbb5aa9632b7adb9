use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ticket::Department;

/// Name written for a department that has no contact yet
pub const PLACEHOLDER_NAME: &str = "No Name";
/// Phone written for a department that has no contact yet
pub const PLACEHOLDER_PHONE: &str = "0000000000";

/// One row of the POC table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocRecord {
    pub department: Department,
    pub name: String,
    /// Kept as text: leading zeros and `+` prefixes must survive
    pub phone: String,
}

/// Contact details for a department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PocContact {
    pub name: String,
    pub phone: String,
}

impl PocContact {
    pub fn placeholder() -> Self {
        PocContact {
            name: PLACEHOLDER_NAME.to_string(),
            phone: PLACEHOLDER_PHONE.to_string(),
        }
    }
}

/// The POC directory: one contact per department, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PocDirectory {
    entries: IndexMap<Department, PocContact>,
}

impl PocDirectory {
    /// Directory with a placeholder row for every department
    pub fn placeholder() -> Self {
        let mut dir = PocDirectory::default();
        dir.backfill();
        dir
    }

    /// Build from rows in table order. Later rows for a department already
    /// present are ignored.
    pub fn from_records(records: impl IntoIterator<Item = PocRecord>) -> Self {
        let mut entries = IndexMap::new();
        for record in records {
            entries.entry(record.department).or_insert(PocContact {
                name: record.name,
                phone: record.phone,
            });
        }
        PocDirectory { entries }
    }

    /// Append a placeholder row for every department that has none.
    /// Returns the departments that were added.
    pub fn backfill(&mut self) -> Vec<Department> {
        let mut added = Vec::new();
        for dept in Department::ALL {
            if !self.entries.contains_key(&dept) {
                self.entries.insert(dept, PocContact::placeholder());
                added.push(dept);
            }
        }
        added
    }

    pub fn get(&self, dept: Department) -> Option<&PocContact> {
        self.entries.get(&dept)
    }

    /// Contact for a department, falling back to the placeholder
    pub fn contact(&self, dept: Department) -> PocContact {
        self.get(dept).cloned().unwrap_or_else(PocContact::placeholder)
    }

    /// Update the name and/or phone for a department, inserting the row if
    /// missing. Returns true when anything changed.
    pub fn upsert(&mut self, dept: Department, name: Option<&str>, phone: Option<&str>) -> bool {
        let contact = self
            .entries
            .entry(dept)
            .or_insert_with(PocContact::placeholder);
        let mut changed = false;
        if let Some(name) = name
            && contact.name != name
        {
            contact.name = name.to_string();
            changed = true;
        }
        if let Some(phone) = phone
            && contact.phone != phone
        {
            contact.phone = phone.to_string();
            changed = true;
        }
        changed
    }

    pub fn iter(&self) -> impl Iterator<Item = (Department, &PocContact)> {
        self.entries.iter().map(|(d, c)| (*d, c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows in table order
    pub fn records(&self) -> Vec<PocRecord> {
        self.iter()
            .map(|(department, c)| PocRecord {
                department,
                name: c.name.clone(),
                phone: c.phone.clone(),
            })
            .collect()
    }
}
