// src/models/portfolio.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::page::Order;

/// Represents the 'portfolios' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for a portfolio listing entry, including the owner's name.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PortfolioView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub owner_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new portfolio.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePortfolioRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 characters."
    ))]
    pub title: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters."))]
    pub description: Option<String>,

    #[serde(default = "default_true")]
    pub is_public: bool,
}

/// DTO for updating an existing portfolio. Absent fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePortfolioRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub is_public: Option<bool>,
}

/// Query parameters for the public portfolio listing.
#[derive(Debug, Deserialize, Validate)]
pub struct PortfolioListParams {
    #[validate(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: i64,

    #[validate(range(min = 1, max = 50))]
    #[serde(default = "default_take")]
    pub take: i64,

    #[serde(default)]
    pub order: Order,

    /// Matches against title and description.
    #[validate(length(min = 1, max = 100))]
    pub search: Option<String>,
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_page() -> i64 {
    1
}

pub(crate) fn default_take() -> i64 {
    10
}
