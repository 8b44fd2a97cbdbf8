use axum::{
    Router,
    routing::{get, post},
};

pub mod availability;
pub mod delivery;
pub mod orders;
pub mod reservations;
pub mod system;

/// Router for every engine endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/delivery-dates", get(delivery::next_dates))
        .nest("/availability", availability::router())
        .route("/orders", post(orders::create_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/confirm", post(orders::confirm_order))
        .route("/orders/:id/cancel", post(orders::cancel_order))
        .route("/reservations", get(reservations::list_active))
        .route("/reservations/sweep", post(reservations::sweep))
}
