use crate::api::attendance::{AttendanceSummary, DateFilter, MarkAttendance};
use crate::api::employee::CreateEmployee;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::Employee;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee roster and daily attendance

- **Employees**: create, list and delete employee records
- **Attendance**: mark a day as `Present` or `Absent`, list an employee's
  entries (optionally for one day) and read the total of present days

Errors carry a human-readable `detail` field.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::delete_employee,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::attendance_summary
    ),
    components(
        schemas(
            CreateEmployee,
            Employee,
            MarkAttendance,
            DateFilter,
            AttendanceRecord,
            AttendanceSummary
        )
    ),
    tags(
        (name = "Employee", description = "Employee directory APIs"),
        (name = "Attendance", description = "Attendance tracking APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for path in [
            "/api/employees",
            "/api/employees/{employee_id}",
            "/api/attendance",
            "/api/attendance/{employee_id}",
            "/api/attendance/{employee_id}/summary",
        ] {
            assert!(paths.iter().any(|p| p == path), "missing {path}");
        }
    }
}
