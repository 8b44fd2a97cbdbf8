use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/stock", post(stock_for_dates))
        .route("/candidates", post(candidates))
}

pub async fn stock_for_dates(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::StockRequest>,
) -> axum::response::Response {
    let sku = match dto::parse_code(&body.sku) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let dates = match dto::parse_dates(&body.dates) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.planner().stock_for_dates(&sku, &dates, services.now()) {
        Ok(snapshots) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "sku": sku,
                "snapshots": snapshots.iter().map(dto::snapshot_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn candidates(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CandidatesRequest>,
) -> axum::response::Response {
    let cart = match dto::parse_cart(&body.cart) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let query = dto::route_query(body.city, body.route);

    match services
        .planner()
        .candidates_with_feasibility(&query, &cart, services.now())
    {
        Ok(candidates) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "candidates": candidates.iter().map(dto::candidate_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
