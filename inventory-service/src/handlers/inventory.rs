use crate::middleware::BearerToken;
use crate::models::Card;
use crate::services::metrics::record_inventory_read;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// Returns the caller's cards as a JSON array.
///
/// A user without an inventory document gets `[]`. Verification and store
/// failures are logged here and surface as a bare `Internal` error.
pub async fn get_inventory(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Vec<Card>>, AppError> {
    let identity = state.verifier.verify(&token).await.map_err(|e| {
        record_inventory_read("verify_failed");
        tracing::error!(error = %e, "Token verification failed");
        AppError::Internal(anyhow::Error::new(e))
    })?;

    tracing::Span::current().record("user_id", identity.user_id.as_str());

    let inventory = state
        .store
        .get_inventory(&identity.user_id)
        .await
        .map_err(|e| {
            record_inventory_read("store_failed");
            tracing::error!(user_id = %identity.user_id, error = %e, "Failed to load inventory");
            AppError::Internal(anyhow::Error::new(e))
        })?;

    let cards = inventory.map(|inv| inv.into_cards()).unwrap_or_default();

    record_inventory_read("success");
    tracing::debug!(user_id = %identity.user_id, count = cards.len(), "Served inventory");

    Ok(Json(cards))
}
