use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

pub const GENERIC_WRITE_MESSAGE: &str = "Error adding attendance";
pub const GENERIC_QUERY_MESSAGE: &str = "Error fetching attendance";

/// Fault raised by an [`AttendanceStore`](super::AttendanceStore) backend.
#[derive(Debug, Display)]
pub enum StorageFailure {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "transport error: {}", _0)]
    Transport(reqwest::Error),

    /// The backend answered but refused the request. `detail` is the
    /// human-readable message from its error payload, when it sent one.
    #[display(fmt = "backend rejected request with status {}", status)]
    Rejected { status: u16, detail: Option<String> },

    #[display(fmt = "undecodable stored entry: {}", _0)]
    Corrupt(String),

    #[display(fmt = "storage unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StorageFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageFailure::Database(e) => Some(e),
            StorageFailure::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StorageFailure {
    fn from(e: sqlx::Error) -> Self {
        StorageFailure::Database(e)
    }
}

impl From<reqwest::Error> for StorageFailure {
    fn from(e: reqwest::Error) -> Self {
        StorageFailure::Transport(e)
    }
}

impl StorageFailure {
    pub fn backend_detail(&self) -> Option<&str> {
        match self {
            StorageFailure::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Field {
    #[display(fmt = "employee_id")]
    EmployeeId,
    #[display(fmt = "date")]
    Date,
    #[display(fmt = "status")]
    Status,
}

#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "invalid {}: {}", field, reason)]
    Validation { field: Field, reason: String },

    #[display(fmt = "attendance write failed: {}", _0)]
    WriteFailed(StorageFailure),

    #[display(fmt = "attendance query failed: {}", _0)]
    QueryFailed(StorageFailure),
}

impl std::error::Error for AttendanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttendanceError::Validation { .. } => None,
            AttendanceError::WriteFailed(e) | AttendanceError::QueryFailed(e) => Some(e),
        }
    }
}

impl AttendanceError {
    pub(crate) fn validation(field: Field, reason: impl Into<String>) -> Self {
        AttendanceError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Message an operator should see. Write failures prefer the backend's own
    /// `detail`; query failures are always generic.
    pub fn user_message(&self) -> String {
        match self {
            AttendanceError::Validation { .. } => self.to_string(),
            AttendanceError::WriteFailed(cause) => cause
                .backend_detail()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_WRITE_MESSAGE.to_string()),
            AttendanceError::QueryFailed(_) => GENERIC_QUERY_MESSAGE.to_string(),
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation { .. } => StatusCode::BAD_REQUEST,
            AttendanceError::WriteFailed(_) | AttendanceError::QueryFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "detail": self.user_message()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_failure_surfaces_backend_detail() {
        let err = AttendanceError::WriteFailed(StorageFailure::Rejected {
            status: 404,
            detail: Some("Employee not found".into()),
        });
        assert_eq!(err.user_message(), "Employee not found");
    }

    #[test]
    fn write_failure_without_detail_is_generic() {
        let err = AttendanceError::WriteFailed(StorageFailure::Unavailable("down".into()));
        assert_eq!(err.user_message(), GENERIC_WRITE_MESSAGE);
    }

    #[test]
    fn query_failure_is_always_generic() {
        let err = AttendanceError::QueryFailed(StorageFailure::Rejected {
            status: 500,
            detail: Some("boom".into()),
        });
        assert_eq!(err.user_message(), GENERIC_QUERY_MESSAGE);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_names_the_field() {
        let err = AttendanceError::validation(Field::Status, "must be Present or Absent");
        assert_eq!(err.to_string(), "invalid status: must be Present or Absent");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
