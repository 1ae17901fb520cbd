use crate::models::UserCreatedEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name given to accounts created without one.
pub const DEFAULT_DISPLAY_NAME: &str = "New User";

/// A user's profile document in the `users` collection, keyed by uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Profile for a freshly created account, stamped with `created_at`.
    ///
    /// A missing or blank display name falls back to [`DEFAULT_DISPLAY_NAME`].
    pub fn from_event(event: &UserCreatedEvent, created_at: DateTime<Utc>) -> Self {
        let display_name = event
            .display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string();

        Self {
            user_id: event.uid.clone(),
            display_name,
            email: event.email.clone(),
            created_at,
        }
    }
}
