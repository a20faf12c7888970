use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};

use rally_types::Bucket;
use rally_types::api::{BucketVisitedResponse, Claims};

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::{AppState, run_blocking};

/// GET /notifications/badges
pub async fn badges(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub;
    let badges = run_blocking(&state, move |service| service.badges(user_id)).await?;
    Ok(Json(badges))
}

/// POST /notifications/{bucket}/visit — the user opened that view.
pub async fn mark_bucket_visited(
    State(state): State<AppState>,
    ApiPath(bucket): ApiPath<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let bucket: Bucket = bucket
        .parse()
        .map_err(|e: rally_types::models::UnknownBucket| ApiError::BadRequest(e.to_string()))?;

    let user_id = claims.sub;
    let last_visit_at =
        run_blocking(&state, move |service| service.mark_bucket_visited(user_id, bucket)).await?;

    Ok(Json(BucketVisitedResponse {
        ok: true,
        bucket,
        last_visit_at,
    }))
}
