use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

/// Liveness: the process is up and serving requests
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "post-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: the database answers a trivial query
pub async fn readiness(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(json!({"status": "ready"})),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(json!({"status": "unavailable"}))
        }
    }
}
