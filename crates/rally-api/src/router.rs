use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{interests, notifications};

/// All routes. Everything but `/health` needs a bearer token.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/interests", get(interests::get_buckets).post(interests::send_interest))
        .route("/interests/pending-count", get(interests::pending_count))
        .route("/interests/with/{user_id}", get(interests::relationship))
        .route("/interests/{interest_id}/respond", post(interests::respond_to_interest))
        .route("/interests/{interest_id}/withdraw", post(interests::withdraw_interest))
        .route("/notifications/badges", get(notifications::badges))
        .route("/notifications/{bucket}/visit", post(notifications::mark_bucket_visited))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .merge(protected_routes)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
