use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::info;

const CREATE_EMPLOYEES: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id          VARCHAR(64)  NOT NULL PRIMARY KEY,
    full_name   VARCHAR(255) NOT NULL,
    email       VARCHAR(255) NOT NULL UNIQUE,
    department  VARCHAR(255) NOT NULL
)
"#;

const CREATE_ATTENDANCE: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id           BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    employee_id  VARCHAR(64) NOT NULL,
    date         DATE        NOT NULL,
    status       VARCHAR(16) NOT NULL,
    INDEX idx_attendance_employee_date (employee_id, date),
    CONSTRAINT fk_attendance_employee
        FOREIGN KEY (employee_id) REFERENCES employees (id) ON DELETE CASCADE
)
"#;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Creates the tables on first boot. Attendance has no uniqueness on
/// `(employee_id, date)`; repeated marks for a day are kept.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<()> {
    for ddl in [CREATE_EMPLOYEES, CREATE_ATTENDANCE] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .context("Failed to apply schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
