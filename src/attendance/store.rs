use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::StorageFailure;
use crate::model::attendance::{AttendanceEntry, EntryId};

/// Append-only keyed collection of attendance entries.
///
/// Duplicate `(employee_id, date)` pairs are accepted. A completed `append`
/// must be visible to every `query_by_employee` that starts after it returns;
/// no ordering is promised between concurrent appends.
#[async_trait]
pub trait AttendanceStore: Send + Sync + 'static {
    async fn append(&self, entry: AttendanceEntry) -> Result<EntryId, StorageFailure>;

    /// Entries of `employee_id` in insertion order, restricted to `date` when
    /// given. No match is an empty vec, not an error.
    async fn query_by_employee(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceEntry>, StorageFailure>;
}

/// Process-local store keeping entries in a single ordered log.
#[derive(Default)]
pub struct InMemoryAttendanceStore {
    entries: Mutex<Vec<AttendanceEntry>>,
}

impl InMemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttendanceStore for InMemoryAttendanceStore {
    async fn append(&self, entry: AttendanceEntry) -> Result<EntryId, StorageFailure> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.push(entry);
        Ok(entries.len() as EntryId)
    }

    async fn query_by_employee(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceEntry>, StorageFailure> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .filter(|e| date.is_none_or(|d| e.date == d))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;

    fn entry(employee_id: &str, date: &str, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry {
            employee_id: employee_id.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("date"),
            status,
        }
    }

    #[actix_web::test]
    async fn keeps_duplicates_in_insertion_order() {
        let store = InMemoryAttendanceStore::new();
        store
            .append(entry("7", "2024-01-02", AttendanceStatus::Absent))
            .await
            .expect("append");
        store
            .append(entry("7", "2024-01-01", AttendanceStatus::Present))
            .await
            .expect("append");
        store
            .append(entry("7", "2024-01-02", AttendanceStatus::Present))
            .await
            .expect("append");

        let all = store.query_by_employee("7", None).await.expect("query");
        let dates: Vec<_> = all.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-01", "2024-01-02"]);

        let day = NaiveDate::from_ymd_opt(2024, 1, 2);
        let same_day = store.query_by_employee("7", day).await.expect("query");
        assert_eq!(same_day.len(), 2);
    }

    #[actix_web::test]
    async fn unknown_employee_yields_empty_vec() {
        let store = InMemoryAttendanceStore::new();
        store
            .append(entry("1", "2024-01-01", AttendanceStatus::Present))
            .await
            .expect("append");

        let rows = store.query_by_employee("2", None).await.expect("query");
        assert!(rows.is_empty());
    }
}
