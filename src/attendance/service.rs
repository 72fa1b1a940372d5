use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error};

use super::error::{AttendanceError, Field};
use super::store::AttendanceStore;
use crate::model::attendance::{AttendanceEntry, AttendanceStatus, EntryId};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Records matching a query plus the number of them marked Present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub records: Vec<AttendanceEntry>,
    pub present_count: usize,
}

impl AggregateResult {
    pub fn from_records(records: Vec<AttendanceEntry>) -> Self {
        let present_count = records.iter().filter(|e| e.is_present()).count();
        Self {
            records,
            present_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses a `YYYY-MM-DD` day key.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AttendanceError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AttendanceError::validation(Field::Date, "expected a YYYY-MM-DD calendar date"))
}

#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    /// Validates and appends one entry. Never touches any query selection.
    pub async fn mark_attendance(
        &self,
        employee_id: &str,
        date: &str,
        status: &str,
    ) -> Result<EntryId, AttendanceError> {
        let employee_id = employee_id.trim();
        if employee_id.is_empty() {
            return Err(AttendanceError::validation(Field::EmployeeId, "must not be empty"));
        }
        let date = parse_date(date)?;
        let status = AttendanceStatus::from_str(status.trim())
            .map_err(|_| AttendanceError::validation(Field::Status, "must be Present or Absent"))?;

        let entry = AttendanceEntry {
            employee_id: employee_id.to_string(),
            date,
            status,
        };

        let id = self.store.append(entry).await.map_err(|e| {
            error!(error = %e, employee_id, %date, "Failed to record attendance");
            AttendanceError::WriteFailed(e)
        })?;

        debug!(id, employee_id, %date, %status, "Attendance recorded");
        Ok(id)
    }

    /// Fetches the employee's entries (optionally for one day) and folds
    /// them into an aggregate. An empty `employee_id` short-circuits to an
    /// empty aggregate without reaching the store.
    pub async fn query_attendance(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<AggregateResult, AttendanceError> {
        let employee_id = employee_id.trim();
        if employee_id.is_empty() {
            return Ok(AggregateResult::default());
        }

        let records = self
            .store
            .query_by_employee(employee_id, date)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id, ?date, "Failed to fetch attendance");
                AttendanceError::QueryFailed(e)
            })?;

        Ok(AggregateResult::from_records(records))
    }
}
