use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use rally_types::api::{Ack, Claims, PendingCountResponse, RespondInterestRequest, SendInterestRequest};
use rally_types::{InterestId, UserId};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, run_blocking};

/// POST /interests — express interest in another user.
pub async fn send_interest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendInterestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sender_id = claims.sub;
    let record = run_blocking(&state, move |service| {
        service.send_interest(sender_id, req.receiver_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /interests/{id}/respond — receiver accepts or declines.
pub async fn respond_to_interest(
    State(state): State<AppState>,
    ApiPath(interest_id): ApiPath<InterestId>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<RespondInterestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receiver_id = claims.sub;
    let record = run_blocking(&state, move |service| {
        service.respond_to_interest(receiver_id, interest_id, req.decision)
    })
    .await?;

    Ok(Json(record))
}

/// POST /interests/{id}/withdraw — sender takes back a pending interest.
pub async fn withdraw_interest(
    State(state): State<AppState>,
    ApiPath(interest_id): ApiPath<InterestId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let sender_id = claims.sub;
    run_blocking(&state, move |service| {
        service.withdraw_interest(sender_id, interest_id)
    })
    .await?;

    Ok(Json(Ack::ok()))
}

/// GET /interests — the caller's received, sent, accepted and declined views.
pub async fn get_buckets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let buckets = run_blocking(&state, move |service| service.get_buckets(user_id)).await?;
    Ok(Json(buckets))
}

/// GET /interests/pending-count — cheap poll for the received badge count.
pub async fn pending_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let count = run_blocking(&state, move |service| service.pending_count(user_id)).await?;
    Ok(Json(PendingCountResponse { count }))
}

/// GET /interests/with/{user_id} — the interest between the caller and
/// another user, or `null`.
pub async fn relationship(
    State(state): State<AppState>,
    ApiPath(other_id): ApiPath<UserId>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = claims.sub;
    let record = run_blocking(&state, move |service| service.relationship(viewer, other_id)).await?;
    Ok(Json(record))
}
