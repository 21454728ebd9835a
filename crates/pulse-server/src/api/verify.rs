use axum::{extract::State, Extension, Json};
use pulse_core::InstagramCredentials;
use pulse_sentiment::{CredentialCheck, FetchError};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn verify_instagram(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(creds): Json<InstagramCredentials>,
) -> Result<Json<ApiResponse<CredentialCheck>>, ApiError> {
    if !creds.is_complete() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "user_id and access_token are required",
        ));
    }

    let check = state
        .aggregator
        .instagram()
        .verify(&creds)
        .await
        .map_err(|e| map_fetch_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: check,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_fetch_error(request_id: String, error: &FetchError) -> ApiError {
    match error {
        FetchError::Auth(message) => {
            ApiError::new(request_id, "invalid_credentials", message.clone())
        }
        other => {
            tracing::warn!(error = %other, "instagram verification failed upstream");
            ApiError::new(request_id, "upstream_error", other.to_string())
        }
    }
}
