use crate::{
    api::{attendance, employee},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, guard, web};
use serde_json::json;
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(|| {
            tracing::warn!(requests_per_min, "Rejected rate limit settings, using defaults");
            GovernorConfig::default()
        });
    Governor::new(&cfg)
}

/// Malformed JSON bodies get the same `{"detail": ...}` shape as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = err.to_string();
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "detail": detail })),
        )
        .into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let write_limiter = Arc::new(build_limiter(config.rate_write_per_min));
    let read_limiter = Arc::new(build_limiter(config.rate_read_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .app_data(json_config())
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(write_limiter.clone())
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("")
                            .guard(guard::Get())
                            .wrap(read_limiter.clone())
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .wrap(write_limiter.clone())
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .wrap(write_limiter)
                            .route(web::post().to(attendance::mark_attendance)),
                    )
                    // /attendance/{employee_id}/summary
                    .service(
                        web::resource("/{employee_id}/summary")
                            .wrap(read_limiter.clone())
                            .route(web::get().to(attendance::attendance_summary)),
                    )
                    // /attendance/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .wrap(read_limiter)
                            .route(web::get().to(attendance::get_attendance)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, dev::ServiceResponse, http::StatusCode, test};
    use std::net::SocketAddr;

    fn config(write: u32, read: u32) -> Config {
        Config {
            database_url: "mysql://unused".into(),
            server_addr: "127.0.0.1:0".into(),
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            rate_write_per_min: write,
            rate_read_per_min: read,
            employee_cache_ttl_secs: 60,
        }
    }

    fn peer() -> SocketAddr {
        "10.0.0.7:4000".parse().expect("addr")
    }

    // The limiter answers with an error rather than a response.
    fn status(result: Result<ServiceResponse, actix_web::Error>) -> StatusCode {
        match result {
            Ok(resp) => resp.status(),
            Err(e) => e.as_response_error().status_code(),
        }
    }

    #[actix_web::test]
    async fn listing_employees_uses_the_read_budget() {
        let config = config(1, 1000);
        let app = test::init_service(App::new().configure(|cfg| configure(cfg, config))).await;

        for _ in 0..3 {
            let req = test::TestRequest::get()
                .uri("/api/employees")
                .peer_addr(peer())
                .to_request();
            let code = status(test::try_call_service(&app, req).await);
            assert_ne!(code, StatusCode::TOO_MANY_REQUESTS);
        }

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .peer_addr(peer())
            .to_request();
        let code = status(test::try_call_service(&app, req).await);
        assert_ne!(code, StatusCode::TOO_MANY_REQUESTS);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .peer_addr(peer())
            .to_request();
        let code = status(test::try_call_service(&app, req).await);
        assert_eq!(code, StatusCode::TOO_MANY_REQUESTS);

        // Delete draws on the same write budget.
        let req = test::TestRequest::delete()
            .uri("/api/employees/E1")
            .peer_addr(peer())
            .to_request();
        let code = status(test::try_call_service(&app, req).await);
        assert_eq!(code, StatusCode::TOO_MANY_REQUESTS);
    }
}
