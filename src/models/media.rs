// src/models/media.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::page::Order;
use crate::models::portfolio::{default_page, default_take};

/// Represents the 'media' table in the database.
///
/// The byte content lives in external storage; `path` is an opaque locator
/// assigned by whatever uploaded the file.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub portfolio_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub path: String,
    pub is_public: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for a media listing entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MediaView {
    pub id: i64,
    pub portfolio_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for registering a new media item.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMediaRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Name length must be between 1 and 255 characters."
    ))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 1024, message = "A storage path is required."))]
    pub path: String,

    pub portfolio_id: i64,

    #[serde(default = "media_default_public")]
    pub is_public: bool,
}

/// Query parameters for the public media listing.
#[derive(Debug, Deserialize, Validate)]
pub struct MediaListParams {
    #[validate(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: i64,

    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_take")]
    pub take: i64,

    #[serde(default)]
    pub order: Order,

    /// Matches against name and description.
    #[validate(length(min = 1, max = 100))]
    pub search: Option<String>,

    pub portfolio_id: Option<i64>,
}

fn media_default_public() -> bool {
    true
}
