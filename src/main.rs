use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use attendance_tracker::attendance::{AttendanceService, MySqlAttendanceStore};
use attendance_tracker::config::Config;
use attendance_tracker::db::{ensure_schema, init_db};
use attendance_tracker::docs::ApiDoc;
use attendance_tracker::routes;
use attendance_tracker::utils::email_filter::EmailFilter;
use attendance_tracker::utils::employee_cache::EmployeeCache;
use attendance_tracker::utils::logging;
use tracing::{error, info};
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Hello World" }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let _guard = logging::init(&config.log_dir, "app.log");

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    ensure_schema(&pool).await?;

    let email_filter = EmailFilter::new();
    let employee_cache = EmployeeCache::new(Duration::from_secs(config.employee_cache_ttl_secs));
    let service = AttendanceService::new(Arc::new(MySqlAttendanceStore::new(pool.clone())));

    let pool_for_filter_warmup = pool.clone();
    let filter_for_warmup = email_filter.clone();
    let pool_for_cache_warmup = pool.clone();
    let cache_for_warmup = employee_cache.clone();
    let server_addr = config.server_addr.clone();

    actix_web::rt::spawn(async move {
        if let Err(e) = filter_for_warmup.warmup(&pool_for_filter_warmup, 100).await {
            error!(error = ?e, "Failed to warmup email filter");
        }
    });

    actix_web::rt::spawn(async move {
        if let Err(e) = cache_for_warmup.warmup(&pool_for_cache_warmup, 250).await {
            error!(error = ?e, "Failed to warmup employee cache");
        }
    });

    HttpServer::new(move || {
        let config = config.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(employee_cache.clone()))
            .app_data(Data::new(email_filter.clone()))
            .app_data(Data::new(service.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await
    .context("Server terminated with an error")
}
