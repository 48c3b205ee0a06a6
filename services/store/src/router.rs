use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use vitrin_core::error::AppError;
use vitrin_core::health::{healthz, readyz};
use vitrin_core::middleware::request_id_layer;

use crate::gate::{GateState, session_gate};
use crate::handlers::cart::{add_item, clear_cart, list_cart, remove_item, update_item};
use crate::infra::db::DbProfileRepository;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let gate = GateState {
        profiles: state.profile_repo(),
        jwt_secret: state.jwt_secret.clone(),
        cookie_domain: state.cookie_domain.clone(),
    };

    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Cart
        .route("/cart", get(list_cart))
        .route("/cart", post(add_item))
        .route("/cart", delete(clear_cart))
        .route("/cart/items/{id}", patch(update_item))
        .route("/cart/items/{id}", delete(remove_item))
        // Page rendering lives in a separate layer; unknown paths still pass
        // through the gate so redirects fire before this 404.
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            gate,
            session_gate::<DbProfileRepository>,
        ))
        .layer(request_id_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}
