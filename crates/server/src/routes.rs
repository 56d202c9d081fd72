use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{metrics, types::Health};
use service::AppServices;

use crate::errors::JsonApiError;
use crate::openapi::ApiDoc;

pub mod barcode;
pub mod consumption;
pub mod inventory;
pub mod meal_ai;
pub mod meal_plans;
pub mod nutrition;
pub mod ocr;
pub mod recipes;
pub mod shopping;
pub mod shopping_ai;
pub mod summary;

pub type AppState = Arc<AppServices>;

/// Receipt photos can be large.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Calendar day used for expiry math.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok("pantry"))
}

#[utoipa::path(get, path = "/metrics", tag = "health", responses((status = 200, description = "Prometheus text format")))]
pub async fn metrics_text() -> Result<Response, JsonApiError> {
    let body = metrics::encode_metrics()
        .map_err(|e| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Metrics Error", Some(e.to_string())))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

async fn count_requests(State(group): State<&'static str>, req: Request, next: Next) -> Response {
    metrics::record_request(group);
    next.run(req).await
}

fn counted(router: Router<AppState>, group: &'static str) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(group, count_requests))
}

/// Build the full application router: JSON API, docs, metrics and the dashboard bundle.
pub fn build_router(services: AppState, frontend_dir: &str) -> Router {
    let static_dir = ServeDir::new(frontend_dir).fallback(ServeFile::new(format!("{frontend_dir}/index.html")));

    let api = Router::new()
        .merge(counted(inventory::router(), "inventory"))
        .merge(counted(recipes::router(), "recipes"))
        .merge(counted(shopping::router(), "shopping"))
        .merge(counted(shopping_ai::router(), "shopping_ai"))
        .merge(counted(meal_plans::router(), "meal_plans"))
        .merge(counted(consumption::router(), "consumption"))
        .merge(counted(ocr::router(), "ocr"))
        .merge(counted(barcode::router(), "barcode"))
        .merge(counted(nutrition::router(), "nutrition"))
        .merge(counted(meal_ai::router(), "meal_ai"))
        .merge(counted(summary::router(), "dashboard"));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_dir)
        .with_state(services)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
