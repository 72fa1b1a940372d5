use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::attendance::service::parse_date;
use crate::attendance::{AggregateResult, AttendanceService};
use crate::model::attendance::AttendanceRecord;
use crate::utils::employee_cache::EmployeeCache;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = "42")]
    pub employee_id: String,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub date: String,
    #[schema(example = "Present", value_type = String)]
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DateFilter {
    /// Restrict results to one day (YYYY-MM-DD)
    #[schema(example = "2024-03-01")]
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "records": [
        { "employee_id": "42", "date": "2024-03-01", "status": "Present" },
        { "employee_id": "42", "date": "2024-03-02", "status": "Absent" }
    ],
    "total_present": 1
}))]
pub struct AttendanceSummary {
    pub records: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub total_present: usize,
}

impl From<AggregateResult> for AttendanceSummary {
    fn from(aggregate: AggregateResult) -> Self {
        Self {
            records: aggregate.records.iter().map(AttendanceRecord::from).collect(),
            total_present: aggregate.present_count,
        }
    }
}

fn bad_request(detail: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "detail": detail }))
}

/// Empty means "no filter"; anything else must be a calendar date.
fn date_filter(filter: &DateFilter) -> Result<Option<chrono::NaiveDate>, HttpResponse> {
    match filter.date.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .map_err(|_| bad_request("Invalid date format. Use YYYY-MM-DD")),
    }
}

/// Mark attendance
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance recorded",
            "id": 7
        })),
        (status = 400, description = "Invalid field", body = Object, example = json!({
            "detail": "invalid status: must be Present or Absent"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    pool: web::Data<MySqlPool>,
    cache: web::Data<EmployeeCache>,
    service: web::Data<AttendanceService>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = payload.employee_id.trim();

    if !employee_id.is_empty() {
        let exists = cache
            .exists(pool.get_ref(), employee_id)
            .await
            .map_err(|e| {
                error!(error = %e, employee_id, "Employee lookup failed");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

        if !exists {
            return Ok(HttpResponse::NotFound().json(json!({
                "detail": "Employee not found"
            })));
        }
    }

    let id = service
        .mark_attendance(employee_id, &payload.date, &payload.status)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Attendance recorded",
        "id": id
    })))
}

/// List attendance of one employee
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID"),
        DateFilter
    ),
    responses(
        (status = 200, description = "Entries in the order they were recorded", body = [AttendanceRecord]),
        (status = 400, description = "Invalid date", body = Object, example = json!({
            "detail": "Invalid date format. Use YYYY-MM-DD"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    service: web::Data<AttendanceService>,
    path: web::Path<String>,
    query: web::Query<DateFilter>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    let date = match date_filter(&query) {
        Ok(date) => date,
        Err(resp) => return Ok(resp),
    };

    let aggregate = service.query_attendance(&employee_id, date).await?;
    let records: Vec<AttendanceRecord> = aggregate.records.iter().map(AttendanceRecord::from).collect();

    Ok(HttpResponse::Ok().json(records))
}

/// Attendance with total present days
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}/summary",
    params(
        ("employee_id", Path, description = "Employee ID"),
        DateFilter
    ),
    responses(
        (status = 200, description = "Entries and number of Present days", body = AttendanceSummary),
        (status = 400, description = "Invalid date"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    service: web::Data<AttendanceService>,
    path: web::Path<String>,
    query: web::Query<DateFilter>,
) -> actix_web::Result<HttpResponse> {
    let employee_id = path.into_inner();
    let date = match date_filter(&query) {
        Ok(date) => date,
        Err(resp) => return Ok(resp),
    };

    let aggregate = service.query_attendance(&employee_id, date).await?;
    Ok(HttpResponse::Ok().json(AttendanceSummary::from(aggregate)))
}
