use crate::model::poc::{PocDirectory, PocRecord};
use crate::model::ticket::Department;

/// Error type for POC directory edits
#[derive(Debug, thiserror::Error)]
pub enum PocError {
    #[error("nothing to update for {0}: give a name or a phone")]
    NothingToUpdate(Department),
}

/// Change the name and/or phone of one department's contact. The department
/// itself is the key and never changes. Returns true when anything changed.
pub fn update_contact(
    directory: &mut PocDirectory,
    department: Department,
    name: Option<&str>,
    phone: Option<&str>,
) -> Result<bool, PocError> {
    let name = name.map(str::trim);
    let phone = phone.map(str::trim);
    if name.is_none() && phone.is_none() {
        return Err(PocError::NothingToUpdate(department));
    }
    Ok(directory.upsert(department, name, phone))
}

/// Apply an edited copy of the whole directory, keyed by department.
/// Returns the departments whose contact changed.
pub fn apply_directory_edit(directory: &mut PocDirectory, edited: &[PocRecord]) -> Vec<Department> {
    let mut changed = Vec::new();
    for record in edited {
        if directory.upsert(
            record.department,
            Some(record.name.trim()),
            Some(record.phone.trim()),
        ) && !changed.contains(&record.department)
        {
            changed.push(record.department);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::poc::PLACEHOLDER_NAME;

    #[test]
    fn update_phone_only() {
        let mut dir = PocDirectory::placeholder();
        assert!(update_contact(&mut dir, Department::It, None, Some(" 044-2345 ")).unwrap());
        let contact = dir.get(Department::It).unwrap();
        assert_eq!(contact.phone, "044-2345");
        assert_eq!(contact.name, PLACEHOLDER_NAME);
    }

    #[test]
    fn update_requires_a_field() {
        let mut dir = PocDirectory::placeholder();
        let err = update_contact(&mut dir, Department::Civil, None, None).unwrap_err();
        assert_eq!(err.to_string(), "nothing to update for Civil: give a name or a phone");
    }

    #[test]
    fn phone_is_not_validated() {
        let mut dir = PocDirectory::placeholder();
        assert!(update_contact(&mut dir, Department::Mech, Some("Ravi"), Some("ext. 12")).unwrap());
        assert_eq!(dir.get(Department::Mech).unwrap().phone, "ext. 12");
    }

    #[test]
    fn directory_edit_reports_changed_departments() {
        let mut dir = PocDirectory::placeholder();
        let mut edited = dir.records();
        edited[1].name = "Kavya".into();
        edited[4].phone = "0123456789".into();
        let changed = apply_directory_edit(&mut dir, &edited);
        assert_eq!(changed, vec![Department::Mech, Department::It]);
        assert_eq!(dir.len(), Department::ALL.len());
    }
}
