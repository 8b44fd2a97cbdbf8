use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_active(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ReservationsQuery>,
) -> axum::response::Response {
    let sku = match params.sku.as_deref().filter(|s| !s.trim().is_empty()).map(dto::parse_sku).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.controller().list_active(sku.as_ref(), services.now()) {
        Ok(reservations) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "count": reservations.len(),
                "reservations": reservations.iter().map(dto::reservation_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn sweep(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.controller().sweep(services.now()) {
        Ok(expired) => (StatusCode::OK, Json(serde_json::json!({ "expired": expired }))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
