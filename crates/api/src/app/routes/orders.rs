use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};

use larder_infra::SubmitRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let cart = match dto::parse_cart(&body.cart) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let delivery_date = match body.delivery_date.as_deref().map(dto::parse_date).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let request = SubmitRequest {
        query: dto::route_query(body.city, body.route),
        delivery_date,
        cart,
        client: body.client.unwrap_or_default(),
        total: body.total,
    };

    match services.controller().submit(&request, services.now()) {
        Ok(receipt) => (StatusCode::CREATED, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.controller().get(&order_id, services.now()) {
        Ok(summary) => (StatusCode::OK, Json(dto::summary_to_json(&summary))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn confirm_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.controller().confirm(&order_id, services.now()) {
        Ok(summary) => (StatusCode::OK, Json(dto::summary_to_json(&summary))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn cancel_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match dto::parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.controller().cancel(&order_id, services.now()) {
        Ok(summary) => (StatusCode::OK, Json(dto::summary_to_json(&summary))).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
