use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use super::error::StorageFailure;
use super::store::AttendanceStore;
use crate::model::attendance::{AttendanceEntry, AttendanceRow, AttendanceStatus, EntryId};

pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn decode_row(row: AttendanceRow) -> Result<AttendanceEntry, StorageFailure> {
    let status = AttendanceStatus::from_str(&row.status).map_err(|_| {
        StorageFailure::Corrupt(format!("row {} has status {:?}", row.id, row.status))
    })?;

    Ok(AttendanceEntry {
        employee_id: row.employee_id,
        date: row.date,
        status,
    })
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn append(&self, entry: AttendanceEntry) -> Result<EntryId, StorageFailure> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&entry.employee_id)
        .bind(entry.date)
        .bind(entry.status.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn query_by_employee(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceEntry>, StorageFailure> {
        let mut sql =
            String::from("SELECT id, employee_id, date, status FROM attendance WHERE employee_id = ?");
        if date.is_some() {
            sql.push_str(" AND date = ?");
        }
        sql.push_str(" ORDER BY id ASC");
        debug!(sql = %sql, employee_id, ?date, "Fetching attendance");

        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql).bind(employee_id);
        if let Some(date) = date {
            query = query.bind(date);
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(decode_row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_status() {
        let entry = decode_row(AttendanceRow {
            id: 1,
            employee_id: "42".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
            status: "Absent".into(),
        })
        .expect("decode");
        assert_eq!(entry.status, AttendanceStatus::Absent);
        assert_eq!(entry.employee_id, "42");
    }

    #[test]
    fn rejects_unknown_status() {
        let err = decode_row(AttendanceRow {
            id: 9,
            employee_id: "42".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"),
            status: "Late".into(),
        })
        .expect_err("unknown status");
        assert!(matches!(err, StorageFailure::Corrupt(_)));
    }
}
