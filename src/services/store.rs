// src/services/store.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::{
    error::AppError,
    models::{
        comment::{Comment, CommentView},
        page::Order,
    },
};

/// Row data for a comment about to be persisted.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: i64,
    pub media_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub text: String,
}

/// Persistence port for the comments subsystem.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create(&self, new: NewComment) -> Result<Comment, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError>;

    /// Root comments of a public media item plus the total match count.
    /// A private media item yields no rows, whoever asks.
    async fn find_roots(
        &self,
        media_id: i64,
        order: Order,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<CommentView>, i64), AppError>;

    /// Direct replies of a root comment whose media is public, oldest first,
    /// plus the total match count.
    async fn find_children(
        &self,
        parent_id: i64,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<CommentView>, i64), AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Single-statement atomic counter update; never read-modify-write.
    async fn increment_children_count(&self, id: i64) -> Result<(), AppError>;

    /// Counterpart of `increment_children_count`, floored at zero.
    async fn decrement_children_count(&self, id: i64) -> Result<(), AppError>;
}

/// Minimal author projection the comments subsystem needs.
#[derive(Debug, Clone, FromRow)]
pub struct AuthorRef {
    pub id: i64,
    pub name: String,
}

/// Lookup port for comment authors.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_one(&self, id: i64) -> Result<AuthorRef, AppError>;
}

/// Minimal media projection the comments subsystem needs.
#[derive(Debug, Clone, FromRow)]
pub struct MediaRef {
    pub id: i64,
    pub is_public: bool,
}

/// Lookup port for the media items comments attach to.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    async fn find_one(&self, id: i64) -> Result<MediaRef, AppError>;
}

pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn create(&self, new: NewComment) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (user_id, media_id, parent_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, media_id, parent_id, text, children_count, created_at
            "#,
        )
        .bind(new.user_id)
        .bind(new.media_id)
        .bind(new.parent_id)
        .bind(&new.text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {:?}", e);
            AppError::from(e)
        })?;

        Ok(comment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, media_id, parent_id, text, children_count, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn find_roots(
        &self,
        media_id: i64,
        order: Order,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<CommentView>, i64), AppError> {
        // Order comes from a two-variant enum, not user input.
        let query = format!(
            r#"
            SELECT c.id, c.user_id, u.name AS author_name, c.text, c.children_count, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            JOIN media m ON m.id = c.media_id
            WHERE c.media_id = $1 AND c.parent_id IS NULL AND m.is_public = TRUE
            ORDER BY c.created_at {}
            OFFSET $2 LIMIT $3
            "#,
            order.sql()
        );

        let comments = sqlx::query_as::<_, CommentView>(&query)
            .bind(media_id)
            .bind(skip)
            .bind(take)
            .fetch_all(&self.pool)
            .await?;

        let item_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM comments c
            JOIN media m ON m.id = c.media_id
            WHERE c.media_id = $1 AND c.parent_id IS NULL AND m.is_public = TRUE
            "#,
        )
        .bind(media_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((comments, item_count))
    }

    async fn find_children(
        &self,
        parent_id: i64,
        skip: i64,
        take: i64,
    ) -> Result<(Vec<CommentView>, i64), AppError> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.user_id, u.name AS author_name, c.text, c.children_count, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            JOIN comments p ON p.id = c.parent_id
            JOIN media m ON m.id = p.media_id
            WHERE c.parent_id = $1 AND m.is_public = TRUE
            ORDER BY c.created_at ASC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(parent_id)
        .bind(skip)
        .bind(take)
        .fetch_all(&self.pool)
        .await?;

        let item_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM comments c
            JOIN comments p ON p.id = c.parent_id
            JOIN media m ON m.id = p.media_id
            WHERE c.parent_id = $1 AND m.is_public = TRUE
            "#,
        )
        .bind(parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((comments, item_count))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        // Replies go with their root via ON DELETE CASCADE.
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete comment {}: {:?}", id, e);
                AppError::from(e)
            })?;

        Ok(())
    }

    async fn increment_children_count(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE comments SET children_count = children_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn decrement_children_count(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE comments SET children_count = GREATEST(0, children_count - 1) WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_one(&self, id: i64) -> Result<AuthorRef, AppError> {
        sqlx::query_as::<_, AuthorRef>("SELECT id, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }
}

pub struct PgMediaCatalog {
    pool: PgPool,
}

impl PgMediaCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MediaCatalog for PgMediaCatalog {
    async fn find_one(&self, id: i64) -> Result<MediaRef, AppError> {
        sqlx::query_as::<_, MediaRef>("SELECT id, is_public FROM media WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Media not found".to_string()))
    }
}
