use std::sync::Arc;

use tracing::error;

use rally_core::InterestService;
use rally_types::InterestError;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: InterestService,
    pub jwt_secret: String,
}

/// Run a service call on the blocking pool; every service call hits SQLite.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&InterestService) -> Result<T, InterestError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.service))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
        .map_err(ApiError::from)
}
