use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Prefix shared by every allocated ticket identifier
pub const TICKET_PREFIX: &str = "TICKET";

/// A value that does not belong to one of the closed enumerations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    fn new(kind: &'static str, value: &str) -> Self {
        UnknownValue {
            kind,
            value: value.to_string(),
        }
    }
}

/// Lowercase and strip separators so `In Progress`, `in-progress` and
/// `in_progress` all compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Department that owns a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Department {
    Comp,
    Mech,
    Electronic,
    Civil,
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "Exam Cell")]
    ExamCell,
}

impl Department {
    /// Every department, in display order
    pub const ALL: [Department; 6] = [
        Department::Comp,
        Department::Mech,
        Department::Electronic,
        Department::Civil,
        Department::It,
        Department::ExamCell,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Department::Comp => "Comp",
            Department::Mech => "Mech",
            Department::Electronic => "Electronic",
            Department::Civil => "Civil",
            Department::It => "IT",
            Department::ExamCell => "Exam Cell",
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Department {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "comp" => Ok(Department::Comp),
            "mech" => Ok(Department::Mech),
            "electronic" => Ok(Department::Electronic),
            "civil" => Ok(Department::Civil),
            "it" => Ok(Department::It),
            "examcell" => Ok(Department::ExamCell),
            _ => Err(UnknownValue::new("department", s)),
        }
    }
}

/// Lifecycle status of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Closed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Closed => "Closed",
        }
    }

    /// Next status in the Open → In Progress → Closed → Open cycle
    pub fn cycle(self) -> TicketStatus {
        match self {
            TicketStatus::Open => TicketStatus::InProgress,
            TicketStatus::InProgress => TicketStatus::Closed,
            TicketStatus::Closed => TicketStatus::Open,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TicketStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "open" => Ok(TicketStatus::Open),
            "inprogress" => Ok(TicketStatus::InProgress),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(UnknownValue::new("status", s)),
        }
    }
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn name(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Next priority in the High → Medium → Low → High cycle
    pub fn cycle(self) -> Priority {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::High,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Priority {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(UnknownValue::new("priority", s)),
        }
    }
}

/// Ticket identifier such as `TICKET-1102`.
///
/// Stored as text so identifiers that do not follow the `TICKET-<n>` shape
/// (hand-edited files, older exports) still load and save unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        TicketId(id.into())
    }

    pub fn from_number(n: u64) -> Self {
        TicketId(format!("{}-{}", TICKET_PREFIX, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric suffix, only when the id is exactly `TICKET-<digits>`
    pub fn number(&self) -> Option<u64> {
        let (prefix, rest) = self.0.split_once('-')?;
        if !prefix.eq_ignore_ascii_case(TICKET_PREFIX)
            || rest.is_empty()
            || !rest.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        rest.parse().ok()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(s: &str) -> Self {
        TicketId(s.to_string())
    }
}

/// A support ticket row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub issue: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub date_submitted: NaiveDate,
    pub full_name: String,
    pub mobile_no: String,
    pub department: Department,
    /// Free-text resolution, empty until an admin fills it in
    #[serde(default)]
    pub resolution: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_parses_display_and_loose_forms() {
        for dept in Department::ALL {
            assert_eq!(dept.name().parse::<Department>().unwrap(), dept);
        }
        assert_eq!("exam-cell".parse::<Department>().unwrap(), Department::ExamCell);
        assert_eq!("it".parse::<Department>().unwrap(), Department::It);
        assert!("Chemistry".parse::<Department>().is_err());
    }

    #[test]
    fn status_parses_variants() {
        assert_eq!("In Progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
        assert_eq!("in_progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
        assert_eq!("CLOSED".parse::<TicketStatus>().unwrap(), TicketStatus::Closed);
        let err = "pending".parse::<TicketStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown status: \"pending\"");
    }

    #[test]
    fn priority_cycle_wraps() {
        assert_eq!(Priority::Low.cycle(), Priority::High);
        assert_eq!(TicketStatus::Closed.cycle(), TicketStatus::Open);
    }

    #[test]
    fn ticket_id_number() {
        assert_eq!(TicketId::new("TICKET-1101").number(), Some(1101));
        assert_eq!(TicketId::new("ticket-7").number(), Some(7));
        assert_eq!(TicketId::new("TICKET-abc").number(), None);
        assert_eq!(TicketId::new("TICKET-").number(), None);
        assert_eq!(TicketId::new("BUG-12").number(), None);
        assert_eq!(TicketId::new("TICKET-1-2").number(), None);
        assert_eq!(TicketId::from_number(1102).as_str(), "TICKET-1102");
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Department::ExamCell).unwrap();
        assert_eq!(json, "\"Exam Cell\"");
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }
}
