use std::str::FromStr;

use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::json;

use super::error::StorageFailure;
use super::store::AttendanceStore;
use crate::model::attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus, EntryId};

/// Store backed by the attendance HTTP backend.
pub struct HttpAttendanceStore {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ErrorPayload {
    detail: Option<String>,
}

#[derive(Deserialize)]
struct RecordedPayload {
    #[serde(default)]
    id: EntryId,
}

impl HttpAttendanceStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid backend url {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("backend url {base_url} cannot carry a path");
        }
        Ok(Self { client, base_url })
    }

    /// Base url plus `segments`, each percent-encoded as a single path
    /// segment so ids containing `/`, `?` or `#` stay inside their segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Turns a non-success response into `Rejected`, keeping the backend's
/// `detail` message if the body carries one.
async fn reject(response: Response) -> StorageFailure {
    let status = response.status().as_u16();
    let detail = response
        .json::<ErrorPayload>()
        .await
        .ok()
        .and_then(|p| p.detail);
    StorageFailure::Rejected { status, detail }
}

fn into_entry(employee_id: &str, record: AttendanceRecord) -> Result<AttendanceEntry, StorageFailure> {
    let status = AttendanceStatus::from_str(&record.status)
        .map_err(|_| StorageFailure::Corrupt(format!("backend sent status {:?}", record.status)))?;

    Ok(AttendanceEntry {
        employee_id: record
            .employee_id
            .unwrap_or_else(|| employee_id.to_string()),
        date: record.date,
        status,
    })
}

#[async_trait]
impl AttendanceStore for HttpAttendanceStore {
    async fn append(&self, entry: AttendanceEntry) -> Result<EntryId, StorageFailure> {
        let response = self
            .client
            .post(self.url(&["attendance"]))
            .json(&json!({
                "employee_id": entry.employee_id,
                "date": entry.date.format("%Y-%m-%d").to_string(),
                "status": entry.status.to_string(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        // A success body is optional; an empty one still means the entry exists.
        let id = response
            .json::<RecordedPayload>()
            .await
            .map(|p| p.id)
            .unwrap_or_default();
        Ok(id)
    }

    async fn query_by_employee(
        &self,
        employee_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceEntry>, StorageFailure> {
        let mut request = self.client.get(self.url(&["attendance", employee_id]));
        if let Some(date) = date {
            request = request.query(&[("date", date.format("%Y-%m-%d").to_string())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(reject(response).await);
        }

        response
            .json::<Vec<AttendanceRecord>>()
            .await?
            .into_iter()
            .map(|record| into_entry(employee_id, record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::api::attendance::get_attendance;
    use crate::attendance::{AttendanceService, InMemoryAttendanceStore};
    use actix_web::{App, HttpServer, web};
    use std::sync::Arc;

    #[test]
    fn joins_segments_onto_base_path() {
        let store = HttpAttendanceStore::new("http://localhost:8000/api/").expect("url");
        assert_eq!(
            store.url(&["attendance"]).as_str(),
            "http://localhost:8000/api/attendance"
        );

        let store = HttpAttendanceStore::new("http://localhost:8000/api").expect("url");
        assert_eq!(
            store.url(&["attendance", "E?x=1"]).as_str(),
            "http://localhost:8000/api/attendance/E%3Fx=1"
        );
        assert_eq!(
            store.url(&["attendance", "EMP/1"]).as_str(),
            "http://localhost:8000/api/attendance/EMP%2F1"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(HttpAttendanceStore::new("not a url").is_err());
        assert!(HttpAttendanceStore::new("mailto:ops@example.com").is_err());
    }

    #[actix_web::test]
    async fn ids_with_reserved_characters_only_see_their_own_entries() {
        let service = AttendanceService::new(Arc::new(InMemoryAttendanceStore::new()));
        for (id, date, status) in [
            ("E", "2024-03-01", "Present"),
            ("E/1", "2024-03-02", "Absent"),
            ("E?x=1", "2024-03-03", "Present"),
            ("E?x=1", "2024-03-04", "Present"),
        ] {
            service.mark_attendance(id, date, status).await.expect("mark");
        }

        let data = web::Data::new(service);
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/api/attendance/{employee_id}", web::get().to(get_attendance))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let store = HttpAttendanceStore::new(&format!("http://{addr}/api")).expect("url");

        let rows = store.query_by_employee("E?x=1", None).await.expect("query");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|e| e.employee_id == "E?x=1"));

        let rows = store.query_by_employee("E/1", None).await.expect("query");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "E/1");
        assert_eq!(rows[0].status, AttendanceStatus::Absent);

        let day = NaiveDate::from_ymd_opt(2024, 3, 4);
        let rows = store.query_by_employee("E?x=1", day).await.expect("query");
        assert_eq!(rows.len(), 1);

        let rows = store.query_by_employee("E", None).await.expect("query");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].employee_id, "E");

        handle.stop(true).await;
    }

    #[test]
    fn record_without_employee_id_takes_the_requested_one() {
        let record: AttendanceRecord =
            serde_json::from_str(r#"{"date":"2024-03-01","status":"Present"}"#).expect("json");
        let entry = into_entry("42", record).expect("entry");
        assert_eq!(entry.employee_id, "42");
        assert!(entry.is_present());
    }

    #[test]
    fn record_with_unknown_status_is_corrupt() {
        let record: AttendanceRecord =
            serde_json::from_str(r#"{"date":"2024-03-01","status":"Late"}"#).expect("json");
        assert!(matches!(into_entry("42", record), Err(StorageFailure::Corrupt(_))));
    }
}
