use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::{
    admin::dtos::{
        AggregateNewsResponse, ErrorResponse, Reputation, VerifySourceRequest,
        VerifySourceResponse, is_trusted_domain,
    },
    app_state::AppState,
};

/// Run an aggregation pass (or join the one in progress) and return its items.
#[utoipa::path(
    get,
    path = "/api/admin/aggregate-news",
    tag = "admin",
    responses(
        (status = 200, description = "Aggregated items, newest first", body = AggregateNewsResponse),
        (status = 500, description = "The run could not complete", body = ErrorResponse)
    )
)]
pub async fn aggregate_news(State(state): State<AppState>) -> Response {
    match state.runner.trigger().await {
        Ok(outcome) => {
            let data = outcome.report.items.clone();
            info!(
                count = data.len(),
                inserted = outcome.inserted,
                "Manual aggregation complete"
            );
            (
                StatusCode::OK,
                Json(AggregateNewsResponse {
                    success: true,
                    count: data.len(),
                    data,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Manual aggregation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Probe a candidate feed URL.
#[utoipa::path(
    post,
    path = "/api/admin/verify-source",
    tag = "admin",
    request_body = VerifySourceRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifySourceResponse),
        (status = 400, description = "Missing or invalid URL", body = ErrorResponse)
    )
)]
pub async fn verify_source(
    State(state): State<AppState>,
    payload: Result<Json<VerifySourceRequest>, JsonRejection>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let url = match payload.validate() {
        Ok(url) => url,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(error))).into_response();
        }
    };

    let domain = url.host_str().unwrap_or_default().to_string();
    let ssl_valid = url.scheme() == "https";

    let response = match state.verifier.fetch_url(url.as_str()).await {
        Ok(feed) => VerifySourceResponse {
            success: true,
            verified: true,
            reputation: if is_trusted_domain(&domain) {
                Reputation::High
            } else {
                Reputation::Medium
            },
            domain,
            ssl_valid,
            item_count: Some(feed.items.len()),
            last_updated: feed.last_updated,
            error: None,
        },
        Err(e) => {
            warn!(url = %url, error = %e, "Source verification failed");
            VerifySourceResponse {
                success: true,
                verified: false,
                domain,
                reputation: Reputation::Low,
                ssl_valid,
                item_count: None,
                last_updated: None,
                error: Some(e.to_string()),
            }
        }
    };

    (StatusCode::OK, Json(response)).into_response()
}
