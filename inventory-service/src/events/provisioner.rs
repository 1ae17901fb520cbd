use crate::models::{Inventory, Profile, UserCreatedEvent};
use crate::services::metrics::record_provisioning;
use crate::services::{DocumentStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Event has an empty uid")]
    MissingUid,

    #[error("Failed to write profile: {0}")]
    Profile(#[source] StoreError),

    #[error("Failed to write inventory: {0}")]
    Inventory(#[source] StoreError),
}

/// Writes the profile and empty inventory for a newly created account.
///
/// Both writes overwrite whatever is stored under the uid. They are not
/// transactional: a failed inventory write leaves the profile in place.
#[derive(Clone)]
pub struct ProfileProvisioner {
    store: Arc<dyn DocumentStore>,
}

impl ProfileProvisioner {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn provision(&self, event: &UserCreatedEvent) -> Result<(), ProvisionError> {
        if event.uid.is_empty() {
            return Err(ProvisionError::MissingUid);
        }

        tracing::info!(uid = %event.uid, "New user signed up, creating profile");

        let profile = Profile::from_event(event, Utc::now());
        self.store
            .put_profile(&profile)
            .await
            .map_err(ProvisionError::Profile)?;

        self.store
            .put_inventory(&Inventory::empty(event.uid.as_str()))
            .await
            .map_err(ProvisionError::Inventory)?;

        Ok(())
    }

    /// Runs [`Self::provision`] and swallows the outcome.
    ///
    /// Failures are logged and counted, never retried or propagated.
    pub async fn handle(&self, event: UserCreatedEvent) {
        match self.provision(&event).await {
            Ok(()) => {
                record_provisioning("success");
                tracing::info!(uid = %event.uid, "Created profile and inventory");
            }
            Err(e) => {
                record_provisioning("failure");
                tracing::error!(uid = %event.uid, error = %e, "Error creating user profile");
            }
        }
    }
}
