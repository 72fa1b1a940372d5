use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Identifier handed back by a store after a successful append.
pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// One attendance record for one employee on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl AttendanceEntry {
    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

/// Raw `attendance` row; `status` is kept as text and decoded by the store.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: String,
}

/// Wire shape of a stored entry, as returned by `GET /attendance/{employee_id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "employee_id": "42",
        "date": "2024-03-01",
        "status": "Present"
    })
)]
pub struct AttendanceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 7)]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "42")]
    pub employee_id: Option<String>,

    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "Present", value_type = String)]
    pub status: String,
}

impl From<&AttendanceEntry> for AttendanceRecord {
    fn from(entry: &AttendanceEntry) -> Self {
        Self {
            id: None,
            employee_id: Some(entry.employee_id.clone()),
            date: entry.date,
            status: entry.status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_parses_exact_spelling_only() {
        assert_eq!(AttendanceStatus::from_str("Present").ok(), Some(AttendanceStatus::Present));
        assert_eq!(AttendanceStatus::from_str("Absent").ok(), Some(AttendanceStatus::Absent));
        assert!(AttendanceStatus::from_str("present").is_err());
        assert!(AttendanceStatus::from_str("Late").is_err());
    }

    #[test]
    fn status_displays_as_wire_value() {
        assert_eq!(AttendanceStatus::Present.to_string(), "Present");
        assert_eq!(AttendanceStatus::Absent.to_string(), "Absent");
    }
}
