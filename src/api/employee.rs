use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::model::employee::Employee;
use crate::utils::email_filter::EmailFilter;
use crate::utils::employee_cache::EmployeeCache;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-001", value_type = String)]
    pub id: String,
    #[schema(example = "John Doe", value_type = String)]
    pub full_name: String,
    #[schema(example = "john@email.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "Engineering", value_type = String)]
    pub department: String,
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

impl CreateEmployee {
    /// Trimmed copy, or the message to send back as `detail`.
    fn validated(&self) -> Result<CreateEmployee, &'static str> {
        let employee = CreateEmployee {
            id: self.id.trim().to_string(),
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: self.department.trim().to_string(),
        };

        if employee.id.is_empty() {
            return Err("Employee ID is required");
        }
        if employee.full_name.is_empty() {
            return Err("Full name is required");
        }
        if employee.department.is_empty() {
            return Err("Department is required");
        }
        if !looks_like_email(&employee.email) {
            return Err("Invalid email address");
        }
        Ok(employee)
    }
}

fn detail(status: actix_web::http::StatusCode, detail: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "detail": detail }))
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({
        "detail": "Something went wrong, Contact with system admin"
    }))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully"
        })),
        (status = 400, description = "Duplicate id or email, or invalid field", body = Object, example = json!({
            "detail": "Employee ID already exists"
        })),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "detail": "Something went wrong, Contact with system admin"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    cache: web::Data<EmployeeCache>,
    emails: web::Data<EmailFilter>,
    payload: web::Json<CreateEmployee>,
) -> HttpResponse {
    let employee = match payload.validated() {
        Ok(e) => e,
        Err(msg) => return detail(actix_web::http::StatusCode::BAD_REQUEST, msg),
    };

    match cache.exists(pool.get_ref(), &employee.id).await {
        Ok(true) => {
            return detail(
                actix_web::http::StatusCode::BAD_REQUEST,
                "Employee ID already exists",
            );
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, employee_id = %employee.id, "Failed to check employee id");
            return internal_error();
        }
    }

    match emails.is_taken(pool.get_ref(), &employee.email).await {
        Ok(true) => {
            return detail(actix_web::http::StatusCode::BAD_REQUEST, "Email already exists");
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Failed to check employee email");
            return internal_error();
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees (id, full_name, email, department)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&employee.id)
    .bind(&employee.full_name)
    .bind(&employee.email)
    .bind(&employee.department)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            emails.insert(&employee.email);
            cache.mark_known(&employee.id).await;
            info!(employee_id = %employee.id, "Employee created");

            HttpResponse::Created().json(json!({
                "message": "Employee created successfully"
            }))
        }
        Err(e) => {
            // Lost a race with a concurrent create of the same id or email.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return detail(
                        actix_web::http::StatusCode::BAD_REQUEST,
                        "Employee ID or email already exists",
                    );
                }
            }

            error!(error = %e, employee_id = %employee.id, "Failed to Create Employee");
            internal_error()
        }
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employees", body = [Employee]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<MySqlPool>) -> actix_web::Result<HttpResponse> {
    let sql = "SELECT id, full_name, email, department FROM employees ORDER BY id";
    debug!(sql = %sql, "Fetching employees");

    let employees = sqlx::query_as::<_, Employee>(sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, sql = %sql, "Failed to fetch employees");
            actix_web::error::ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(employees))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deleted successfully", body = Object, example = json!({
            "message": "Employee deleted successfully"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "detail": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    pool: web::Data<MySqlPool>,
    cache: web::Data<EmployeeCache>,
    emails: web::Data<EmailFilter>,
    path: web::Path<String>,
) -> HttpResponse {
    let employee_id = path.into_inner();

    let email = match sqlx::query_scalar::<_, String>("SELECT email FROM employees WHERE id = ?")
        .bind(&employee_id)
        .fetch_optional(pool.get_ref())
        .await
    {
        Ok(Some(email)) => email,
        Ok(None) => {
            return detail(actix_web::http::StatusCode::NOT_FOUND, "Employee not found");
        }
        Err(e) => {
            error!(error = %e, employee_id = %employee_id, "Failed to fetch employee");
            return internal_error();
        }
    };

    // Attendance rows go with it (ON DELETE CASCADE).
    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(&employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            cache.forget(&employee_id).await;
            if res.rows_affected() == 0 {
                return detail(actix_web::http::StatusCode::NOT_FOUND, "Employee not found");
            }
            emails.remove(&email);
            info!(employee_id = %employee_id, "Employee deleted");

            HttpResponse::Ok().json(json!({
                "message": "Employee deleted successfully"
            }))
        }
        Err(e) => {
            error!(error = %e, employee_id = %employee_id, "Failed to delete employee");
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: &str, name: &str, email: &str, department: &str) -> CreateEmployee {
        CreateEmployee {
            id: id.into(),
            full_name: name.into(),
            email: email.into(),
            department: department.into(),
        }
    }

    #[test]
    fn trims_and_accepts_complete_payload() {
        let employee = payload(" E1 ", " Ada ", " ada@example.com ", "R&D")
            .validated()
            .expect("valid");
        assert_eq!(employee.id, "E1");
        assert_eq!(employee.full_name, "Ada");
        assert_eq!(employee.email, "ada@example.com");
    }

    #[test]
    fn reports_first_missing_field() {
        assert_eq!(
            payload("", "Ada", "ada@example.com", "R&D").validated().err(),
            Some("Employee ID is required")
        );
        assert_eq!(
            payload("E1", "Ada", "ada@example.com", "  ").validated().err(),
            Some("Department is required")
        );
    }

    #[test]
    fn rejects_malformed_email() {
        for email in ["ada", "ada@", "@example.com", "ada@example", "ada@@example.com", "a da@example.com"] {
            assert!(!looks_like_email(email), "{email} should be rejected");
        }
        assert!(looks_like_email("ada.lovelace@example.co.uk"));
    }
}
