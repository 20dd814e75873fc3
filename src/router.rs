use axum::{
    Router,
    extract::Request,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info_span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{admin, app_state::AppState, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        admin::handlers::aggregate_news,
        admin::handlers::verify_source
    ),
    components(schemas(
        health::HealthResponse,
        crate::aggregator::NormalizedNewsItem,
        admin::dtos::AggregateNewsResponse,
        admin::dtos::ErrorResponse,
        admin::dtos::VerifySourceRequest,
        admin::dtos::VerifySourceResponse,
        admin::dtos::Reputation
    )),
    tags(
        (name = "admin", description = "News aggregation controls"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/api/admin/aggregate-news", get(admin::aggregate_news))
        .route("/api/admin/verify-source", post(admin::verify_source))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
