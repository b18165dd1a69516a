//! Service health reporting.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::cache::CacheHealth;
use crate::infra::http::state::ApiState;

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    database: &'static str,
    cache: &'static str,
}

pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let database = match state.db.as_ref() {
        None => "unconfigured",
        Some(db) => match db.health_check().await {
            Ok(()) => "ok",
            Err(_) => "error",
        },
    };

    let cache = match state.cache.health().await {
        CacheHealth::Ok => "ok",
        // A degraded cache is not an outage: reads fall back to Postgres.
        CacheHealth::Degraded => "degraded",
        CacheHealth::Disabled => "disabled",
    };

    let status = if database == "error" { "unhealthy" } else { "ok" };
    let code = if status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthReport {
            status,
            database,
            cache,
        }),
    )
}
