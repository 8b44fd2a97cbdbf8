use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use larder_infra::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        EngineError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        EngineError::StockConflict {
            ref sku,
            date,
            requested,
            available,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "stock_conflict",
                "message": err.to_string(),
                "retryable": true,
                "sku": sku,
                "date": date,
                "requested": requested,
                "available": available,
            })),
        )
            .into_response(),
        EngineError::OrderLapsed(msg) => json_error(StatusCode::CONFLICT, "order_lapsed", msg),
        EngineError::UpstreamUnavailable(msg) => {
            tracing::warn!(%msg, "upstream unavailable");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable", msg)
        }
        EngineError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
