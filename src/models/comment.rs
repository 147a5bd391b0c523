// src/models/comment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::page::Order;
use crate::models::portfolio::default_page;

/// Represents the 'comments' table in the database.
///
/// Exactly one of `media_id` (root comment) or `parent_id` (reply) is set;
/// the schema enforces this with a CHECK constraint. `children_count` is
/// maintained incrementally alongside reply creation and deletion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub media_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub text: String,
    pub children_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for a comment listing entry, including the author's name.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub user_id: i64,
    pub author_name: String,
    pub text: String,
    pub children_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Comment must be between 1 and 500 characters"
    ))]
    pub text: String,

    /// Root comments attach to a media item.
    pub media_id: Option<i64>,

    /// Replies attach to an existing root comment.
    pub parent_comment_id: Option<i64>,
}

impl CreateCommentRequest {
    /// A comment targets exactly one of a media item or a parent comment.
    pub fn has_single_target(&self) -> bool {
        self.media_id.is_some() != self.parent_comment_id.is_some()
    }
}

/// Query parameters for the root comment listing of a media item.
#[derive(Debug, Deserialize, Validate)]
pub struct RootCommentsParams {
    pub media_id: i64,

    #[validate(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: i64,

    #[validate(range(min = 1, max = 50))]
    #[serde(default = "roots_default_take")]
    pub take: i64,

    #[serde(default)]
    pub order: Order,
}

/// Query parameters for the reply listing of a root comment.
/// Replies are always served oldest first.
#[derive(Debug, Deserialize, Validate)]
pub struct ChildCommentsParams {
    #[validate(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: i64,

    #[validate(range(min = 1, max = 50))]
    #[serde(default = "children_default_take")]
    pub take: i64,
}

fn roots_default_take() -> i64 {
    10
}

fn children_default_take() -> i64 {
    5
}
