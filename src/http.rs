//! HTTP surface: health check and the job search endpoint.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::core::errors::{FailureKind, ScrapeError};
use crate::scraping::browser_manager::resolve_chrome_executable;
use crate::tools::jobs::normalize;
use crate::types::{ErrorResponse, JobsResponse, RawJobQuery};
use crate::AppState;

pub const JOBS_ROUTE: &str = "/api/v1/jobs/getLinkedInJobs";

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.resolve_body_limit();
    let cors = cors_layer(state.config.server.resolve_cors_origin());

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route(JOBS_ROUTE, get(get_linkedin_jobs))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origin: Option<String>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(&origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(e) => {
            warn!("invalid CORS origin '{}': {}; falling back to permissive", origin, e);
            CorsLayer::permissive()
        }
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let browser = resolve_chrome_executable(state.scout.settings().executable.as_deref());
    Json(serde_json::json!({
        "status": "healthy",
        "service": "job-scout",
        "version": env!("CARGO_PKG_VERSION"),
        "browser": browser.to_string_lossy(),
        "available_sessions": state.session_limit.available_permits(),
    }))
}

async fn get_linkedin_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RawJobQuery>,
) -> Response {
    // Reject bad input before queueing for a browser slot.
    if let Err(e) = normalize(&query) {
        return error_response(&e);
    }

    let Ok(_permit) = state.session_limit.acquire().await else {
        return error_response(&ScrapeError::Launch("session limiter closed".into()));
    };

    match state.scout.search(&query).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(JobsResponse {
                success: true,
                status: StatusCode::OK.as_u16(),
                count: outcome.count,
                jobs: outcome.jobs,
                warnings: outcome.warnings,
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(e: &ScrapeError) -> Response {
    let (status, message) = match e.kind() {
        FailureKind::BadInput => (StatusCode::BAD_REQUEST, e.to_string()),
        FailureKind::ScrapeFailed => {
            error!("Error during scraping: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        }
    };
    (
        status,
        Json(ErrorResponse {
            success: false,
            status: status.as_u16(),
            message,
        }),
    )
        .into_response()
}
