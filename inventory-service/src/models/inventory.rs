use serde::{Deserialize, Deserializer, Serialize};

/// A card record. Its shape belongs to the client, so it is kept opaque.
pub type Card = serde_json::Value;

/// A user's inventory document in the `inventories` collection, keyed by uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    /// Documents written without a `cards` field, or with `cards: null`,
    /// read as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cards: Vec<Card>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Card>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Card>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Inventory {
    pub fn empty(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            id: user_id.clone(),
            user_id,
            cards: Vec::new(),
        }
    }

    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}
