use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Item listing owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub price: i32,
    pub description: Option<String>,
    pub sold_out: bool,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated fields for a new item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub price: i32,
    pub description: Option<String>,
}

/// Validated partial update; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub price: Option<i32>,
    pub description: Option<String>,
    pub sold_out: Option<bool>,
}
