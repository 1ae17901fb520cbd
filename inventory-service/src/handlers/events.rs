use crate::models::UserCreatedEvent;
use crate::services::metrics::record_user_created_event;
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode};
use service_core::error::AppError;

/// Hook the identity provider calls when an account is created.
///
/// Answers `202 Accepted` as soon as the event is queued; the provisioning
/// outcome is only visible in logs and in the store.
pub async fn user_created(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let event: UserCreatedEvent = serde_json::from_slice(&body).map_err(|e| {
        record_user_created_event("invalid");
        tracing::warn!(error = %e, "Unparseable user-created event");
        AppError::BadRequest("Invalid user-created event payload".to_string())
    })?;

    if event.uid.trim().is_empty() {
        record_user_created_event("invalid");
        return Err(AppError::BadRequest("uid is required".to_string()));
    }

    tracing::info!(uid = %event.uid, "Received user-created event");
    state.events.enqueue(event)?;

    Ok(StatusCode::ACCEPTED)
}
