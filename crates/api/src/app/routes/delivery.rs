use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::dto;
use crate::app::services::AppServices;

/// Upper bound on `count`; the horizon limits the answer anyway.
const MAX_COUNT: usize = 60;

pub async fn next_dates(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::DeliveryDatesQuery>,
) -> axum::response::Response {
    let planner = services.planner();
    let count = params
        .count
        .unwrap_or(planner.settings().candidate_count)
        .min(MAX_COUNT);
    let query = dto::route_query(params.city, params.route);

    let dates = planner.next_delivery_dates(&query, count, services.now());
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "count": dates.len(),
            "dates": dates,
        })),
    )
        .into_response()
}
