// src/services/comments.rs

use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::AppError,
    models::{
        comment::{Comment, CommentView, CreateCommentRequest, RootCommentsParams},
        page::Page,
    },
    services::{
        cache::ResultCache,
        events::{CommentEvent, EventSink},
        store::{CommentStore, MediaCatalog, NewComment, UserDirectory},
    },
    utils::html::clean_html,
};

/// Orchestrates the threaded-comment subsystem: creation, ownership-checked
/// deletion and the two paginated read paths (roots of a media item, replies
/// of a root comment).
///
/// Every collaborator is injected, so tests run against in-memory ports.
/// Mutations keep the parent's `children_count` in step via atomic store
/// updates, wipe the whole result cache and emit exactly one event.
pub struct CommentsService {
    store: Arc<dyn CommentStore>,
    users: Arc<dyn UserDirectory>,
    media: Arc<dyn MediaCatalog>,
    cache: Arc<dyn ResultCache>,
    events: Arc<dyn EventSink>,
    cache_ttl: Duration,
}

impl CommentsService {
    pub fn new(
        store: Arc<dyn CommentStore>,
        users: Arc<dyn UserDirectory>,
        media: Arc<dyn MediaCatalog>,
        cache: Arc<dyn ResultCache>,
        events: Arc<dyn EventSink>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            users,
            media,
            cache,
            events,
            cache_ttl,
        }
    }

    /// Creates a root comment on a media item or a reply to a root comment.
    pub async fn create(
        &self,
        dto: CreateCommentRequest,
        user_id: i64,
    ) -> Result<Comment, AppError> {
        // The edge validates too, but a malformed target combination must
        // never reach the store.
        if !dto.has_single_target() {
            return Err(AppError::BadRequest(
                "Exactly one of media_id or parent_comment_id must be provided".to_string(),
            ));
        }

        let user = self.users.find_one(user_id).await?;

        let parent = match dto.parent_comment_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .find_by_id(parent_id)
                    .await?
                    .ok_or(AppError::NotFound("Parent comment not found".to_string()))?;

                // Only one level of nesting: the read model has no place for
                // replies to replies, so they are rejected up front.
                if parent.parent_id.is_some() {
                    return Err(AppError::BadRequest(
                        "Replies can only be added to root comments".to_string(),
                    ));
                }

                Some(parent)
            }
            None => None,
        };

        if let Some(media_id) = dto.media_id {
            self.media.find_one(media_id).await?;
        }

        let comment = self
            .store
            .create(NewComment {
                user_id: user.id,
                media_id: dto.media_id,
                parent_id: parent.as_ref().map(|p| p.id),
                text: clean_html(&dto.text),
            })
            .await?;

        if let Some(parent) = &parent {
            self.store.increment_children_count(parent.id).await?;
        }

        self.cache.clear().await;

        self.events.emit(CommentEvent::Created {
            id: comment.id,
            user_id: user.id,
            parent_id: parent.map(|p| p.id),
        });

        Ok(comment)
    }

    /// Paginated root comments of a public media item.
    pub async fn find_roots_paginated(
        &self,
        params: &RootCommentsParams,
    ) -> Result<Page<CommentView>, AppError> {
        let cache_key = format!(
            "root_comments_page_{}_take_{}_media_{}_order_{}",
            params.page, params.take, params.media_id, params.order
        );

        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(page) = serde_json::from_value(cached) {
                return Ok(page);
            }
        }

        let skip = (params.page - 1) * params.take;
        let (comments, item_count) = self
            .store
            .find_roots(params.media_id, params.order, skip, params.take)
            .await?;

        let result = Page::new(comments, params.page, params.take, item_count);

        self.cache
            .set(&cache_key, serde_json::to_value(&result)?, self.cache_ttl)
            .await;

        Ok(result)
    }

    /// Paginated replies of a root comment, oldest first.
    pub async fn find_children_by_parent(
        &self,
        parent_id: i64,
        page: i64,
        take: i64,
    ) -> Result<Page<CommentView>, AppError> {
        let cache_key = format!("children_comments_parent_{}_page_{}_take_{}", parent_id, page, take);

        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(result) = serde_json::from_value(cached) {
                return Ok(result);
            }
        }

        let skip = (page - 1) * take;
        let (children, item_count) = self.store.find_children(parent_id, skip, take).await?;

        let result = Page::new(children, page, take, item_count);

        self.cache
            .set(&cache_key, serde_json::to_value(&result)?, self.cache_ttl)
            .await;

        Ok(result)
    }

    /// Fetches a comment by id. When `requester` is given, the comment must
    /// belong to that user; used both as a read path and as the precondition
    /// for `remove`.
    pub async fn find_one(&self, id: i64, requester: Option<i64>) -> Result<Comment, AppError> {
        let comment = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))?;

        if let Some(user_id) = requester {
            let user = self.users.find_one(user_id).await?;

            if comment.user_id != user.id {
                return Err(AppError::Forbidden(
                    "You are not the owner of this comment".to_string(),
                ));
            }
        }

        Ok(comment)
    }

    /// Deletes a comment owned by `user_id`. Replies of a deleted root go
    /// with it at the storage level.
    pub async fn remove(&self, id: i64, user_id: i64) -> Result<(), AppError> {
        let comment = self.find_one(id, Some(user_id)).await?;

        self.store.delete(id).await?;

        if let Some(parent_id) = comment.parent_id {
            self.store.decrement_children_count(parent_id).await?;
        }

        self.cache.clear().await;

        self.events.emit(CommentEvent::Deleted { id });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::page::Order;
    use crate::services::cache::MemoryCache;
    use crate::services::store::{AuthorRef, MediaRef};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Shared in-memory "database" backing the fake ports.
    #[derive(Default)]
    struct World {
        next_id: i64,
        comments: BTreeMap<i64, Comment>,
        users: BTreeMap<i64, String>,
        media: BTreeMap<i64, bool>,
    }

    fn timestamp(seq: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seq, 0).unwrap()
    }

    fn view_of(world: &World, comment: &Comment) -> CommentView {
        CommentView {
            id: comment.id,
            user_id: comment.user_id,
            author_name: world.users.get(&comment.user_id).cloned().unwrap_or_default(),
            text: comment.text.clone(),
            children_count: comment.children_count,
            created_at: comment.created_at,
        }
    }

    struct MemoryStore {
        world: Arc<Mutex<World>>,
    }

    #[async_trait]
    impl CommentStore for MemoryStore {
        async fn create(&self, new: NewComment) -> Result<Comment, AppError> {
            let mut world = self.world.lock().unwrap();
            world.next_id += 1;
            let id = world.next_id;
            let comment = Comment {
                id,
                user_id: new.user_id,
                media_id: new.media_id,
                parent_id: new.parent_id,
                text: new.text,
                children_count: 0,
                created_at: timestamp(id),
            };
            world.comments.insert(id, comment.clone());
            Ok(comment)
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
            Ok(self.world.lock().unwrap().comments.get(&id).cloned())
        }

        async fn find_roots(
            &self,
            media_id: i64,
            order: Order,
            skip: i64,
            take: i64,
        ) -> Result<(Vec<CommentView>, i64), AppError> {
            let world = self.world.lock().unwrap();
            if !world.media.get(&media_id).copied().unwrap_or(false) {
                return Ok((vec![], 0));
            }
            let mut matches: Vec<&Comment> = world
                .comments
                .values()
                .filter(|c| c.media_id == Some(media_id) && c.parent_id.is_none())
                .collect();
            matches.sort_by_key(|c| c.created_at);
            if order == Order::Desc {
                matches.reverse();
            }
            let item_count = matches.len() as i64;
            let views = matches
                .into_iter()
                .skip(skip as usize)
                .take(take as usize)
                .map(|c| view_of(&world, c))
                .collect();
            Ok((views, item_count))
        }

        async fn find_children(
            &self,
            parent_id: i64,
            skip: i64,
            take: i64,
        ) -> Result<(Vec<CommentView>, i64), AppError> {
            let world = self.world.lock().unwrap();
            let parent_media_public = world
                .comments
                .get(&parent_id)
                .and_then(|p| p.media_id)
                .and_then(|m| world.media.get(&m).copied())
                .unwrap_or(false);
            if !parent_media_public {
                return Ok((vec![], 0));
            }
            let mut matches: Vec<&Comment> = world
                .comments
                .values()
                .filter(|c| c.parent_id == Some(parent_id))
                .collect();
            matches.sort_by_key(|c| c.created_at);
            let item_count = matches.len() as i64;
            let views = matches
                .into_iter()
                .skip(skip as usize)
                .take(take as usize)
                .map(|c| view_of(&world, c))
                .collect();
            Ok((views, item_count))
        }

        async fn delete(&self, id: i64) -> Result<(), AppError> {
            let mut world = self.world.lock().unwrap();
            world.comments.remove(&id);
            // Mirror the schema's ON DELETE CASCADE for replies.
            world.comments.retain(|_, c| c.parent_id != Some(id));
            Ok(())
        }

        async fn increment_children_count(&self, id: i64) -> Result<(), AppError> {
            if let Some(c) = self.world.lock().unwrap().comments.get_mut(&id) {
                c.children_count += 1;
            }
            Ok(())
        }

        async fn decrement_children_count(&self, id: i64) -> Result<(), AppError> {
            if let Some(c) = self.world.lock().unwrap().comments.get_mut(&id) {
                c.children_count = (c.children_count - 1).max(0);
            }
            Ok(())
        }
    }

    struct MemoryDirectory {
        world: Arc<Mutex<World>>,
    }

    #[async_trait]
    impl UserDirectory for MemoryDirectory {
        async fn find_one(&self, id: i64) -> Result<AuthorRef, AppError> {
            self.world
                .lock()
                .unwrap()
                .users
                .get(&id)
                .map(|name| AuthorRef {
                    id,
                    name: name.clone(),
                })
                .ok_or(AppError::NotFound("User not found".to_string()))
        }
    }

    struct MemoryCatalog {
        world: Arc<Mutex<World>>,
    }

    #[async_trait]
    impl MediaCatalog for MemoryCatalog {
        async fn find_one(&self, id: i64) -> Result<MediaRef, AppError> {
            self.world
                .lock()
                .unwrap()
                .media
                .get(&id)
                .map(|is_public| MediaRef {
                    id,
                    is_public: *is_public,
                })
                .ok_or(AppError::NotFound("Media not found".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<CommentEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: CommentEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    struct Fixture {
        service: CommentsService,
        world: Arc<Mutex<World>>,
        sink: Arc<RecordingSink>,
    }

    fn fixture() -> Fixture {
        let world = Arc::new(Mutex::new(World::default()));
        let sink = Arc::new(RecordingSink::default());
        let service = CommentsService::new(
            Arc::new(MemoryStore {
                world: world.clone(),
            }),
            Arc::new(MemoryDirectory {
                world: world.clone(),
            }),
            Arc::new(MemoryCatalog {
                world: world.clone(),
            }),
            Arc::new(MemoryCache::new()),
            sink.clone(),
            Duration::from_secs(60),
        );
        Fixture {
            service,
            world,
            sink,
        }
    }

    impl Fixture {
        fn add_user(&self, id: i64, name: &str) {
            self.world
                .lock()
                .unwrap()
                .users
                .insert(id, name.to_string());
        }

        fn add_media(&self, id: i64, is_public: bool) {
            self.world.lock().unwrap().media.insert(id, is_public);
        }

        /// Inserts a root comment directly into the store, bypassing the
        /// service and therefore the cache invalidation it performs.
        fn sneak_in_root(&self, media_id: i64, user_id: i64, text: &str) {
            let mut world = self.world.lock().unwrap();
            world.next_id += 1;
            let id = world.next_id;
            world.comments.insert(
                id,
                Comment {
                    id,
                    user_id,
                    media_id: Some(media_id),
                    parent_id: None,
                    text: text.to_string(),
                    children_count: 0,
                    created_at: timestamp(id),
                },
            );
        }

        fn children_count(&self, id: i64) -> i32 {
            self.world.lock().unwrap().comments[&id].children_count
        }

        fn events(&self) -> Vec<CommentEvent> {
            self.sink.events.lock().unwrap().clone()
        }
    }

    fn root_dto(media_id: i64, text: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            text: text.to_string(),
            media_id: Some(media_id),
            parent_comment_id: None,
        }
    }

    fn reply_dto(parent_id: i64, text: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            text: text.to_string(),
            media_id: None,
            parent_comment_id: Some(parent_id),
        }
    }

    fn roots_params(media_id: i64, page: i64, take: i64, order: Order) -> RootCommentsParams {
        RootCommentsParams {
            media_id,
            page,
            take,
            order,
        }
    }

    #[tokio::test]
    async fn creates_root_comment_and_emits_event() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let comment = fx.service.create(root_dto(7, "First!"), 1).await.unwrap();

        assert_eq!(comment.media_id, Some(7));
        assert_eq!(comment.parent_id, None);
        assert_eq!(comment.children_count, 0);
        assert_eq!(
            fx.events(),
            vec![CommentEvent::Created {
                id: comment.id,
                user_id: 1,
                parent_id: None,
            }]
        );
    }

    #[tokio::test]
    async fn rejects_both_and_neither_target() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let both = CreateCommentRequest {
            text: "hi".to_string(),
            media_id: Some(7),
            parent_comment_id: Some(1),
        };
        assert!(matches!(
            fx.service.create(both, 1).await,
            Err(AppError::BadRequest(_))
        ));

        let neither = CreateCommentRequest {
            text: "hi".to_string(),
            media_id: None,
            parent_comment_id: None,
        };
        assert!(matches!(
            fx.service.create(neither, 1).await,
            Err(AppError::BadRequest(_))
        ));

        assert!(fx.events().is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_author() {
        let fx = fixture();
        fx.add_media(7, true);

        assert!(matches!(
            fx.service.create(root_dto(7, "hi"), 42).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_missing_parent() {
        let fx = fixture();
        fx.add_user(1, "ana");

        assert!(matches!(
            fx.service.create(reply_dto(99, "hi"), 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejects_missing_media() {
        let fx = fixture();
        fx.add_user(1, "ana");

        assert!(matches!(
            fx.service.create(root_dto(99, "hi"), 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn reply_increments_parent_counter() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let root = fx.service.create(root_dto(7, "root"), 1).await.unwrap();
        assert_eq!(fx.children_count(root.id), 0);

        let reply = fx
            .service
            .create(reply_dto(root.id, "reply"), 1)
            .await
            .unwrap();

        assert_eq!(fx.children_count(root.id), 1);
        assert_eq!(
            fx.events().last().unwrap(),
            &CommentEvent::Created {
                id: reply.id,
                user_id: 1,
                parent_id: Some(root.id),
            }
        );
    }

    #[tokio::test]
    async fn rejects_reply_to_a_reply() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let root = fx.service.create(root_dto(7, "root"), 1).await.unwrap();
        let reply = fx
            .service
            .create(reply_dto(root.id, "reply"), 1)
            .await
            .unwrap();

        assert!(matches!(
            fx.service.create(reply_dto(reply.id, "deeper"), 1).await,
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(fx.children_count(reply.id), 0);
        assert_eq!(fx.children_count(root.id), 1);
    }

    #[tokio::test]
    async fn counter_tracks_creates_and_deletes() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let root = fx.service.create(root_dto(7, "root"), 1).await.unwrap();
        let mut replies = Vec::new();
        for i in 0..3 {
            let reply = fx
                .service
                .create(reply_dto(root.id, &format!("reply {i}")), 1)
                .await
                .unwrap();
            replies.push(reply.id);
        }
        assert_eq!(fx.children_count(root.id), 3);

        fx.service.remove(replies[0], 1).await.unwrap();
        fx.service.remove(replies[1], 1).await.unwrap();

        assert_eq!(fx.children_count(root.id), 1);
        assert_eq!(
            fx.events().last().unwrap(),
            &CommentEvent::Deleted { id: replies[1] }
        );
    }

    #[tokio::test]
    async fn reply_create_then_delete_restores_counter() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let a = fx.service.create(root_dto(7, "A"), 1).await.unwrap();
        let b = fx.service.create(reply_dto(a.id, "B"), 1).await.unwrap();
        assert_eq!(fx.children_count(a.id), 1);

        fx.service.remove(b.id, 1).await.unwrap();
        assert_eq!(fx.children_count(a.id), 0);
    }

    #[tokio::test]
    async fn pagination_meta_for_eleven_roots_take_five() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);
        for i in 0..11 {
            fx.service
                .create(root_dto(7, &format!("comment {i}")), 1)
                .await
                .unwrap();
        }

        let first = fx
            .service
            .find_roots_paginated(&roots_params(7, 1, 5, Order::Asc))
            .await
            .unwrap();
        assert_eq!(first.data.len(), 5);
        assert_eq!(first.meta.item_count, 11);
        assert_eq!(first.meta.page_count, 3);
        assert!(first.meta.has_next_page);
        assert!(!first.meta.has_previous_page);

        let last = fx
            .service
            .find_roots_paginated(&roots_params(7, 3, 5, Order::Asc))
            .await
            .unwrap();
        assert_eq!(last.data.len(), 1);
        assert!(!last.meta.has_next_page);
        assert!(last.meta.has_previous_page);
    }

    #[tokio::test]
    async fn roots_respect_requested_order() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);
        fx.service.create(root_dto(7, "oldest"), 1).await.unwrap();
        fx.service.create(root_dto(7, "middle"), 1).await.unwrap();
        fx.service.create(root_dto(7, "newest"), 1).await.unwrap();

        let asc = fx
            .service
            .find_roots_paginated(&roots_params(7, 1, 10, Order::Asc))
            .await
            .unwrap();
        assert_eq!(asc.data[0].text, "oldest");

        let desc = fx
            .service
            .find_roots_paginated(&roots_params(7, 1, 10, Order::Desc))
            .await
            .unwrap();
        assert_eq!(desc.data[0].text, "newest");
    }

    #[tokio::test]
    async fn roots_of_private_media_stay_hidden() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, false);

        fx.service.create(root_dto(7, "hidden"), 1).await.unwrap();

        let page = fx
            .service
            .find_roots_paginated(&roots_params(7, 1, 10, Order::Asc))
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.meta.item_count, 0);
    }

    #[tokio::test]
    async fn replies_of_private_media_stay_hidden() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, false);

        let root = fx.service.create(root_dto(7, "root"), 1).await.unwrap();
        fx.service
            .create(reply_dto(root.id, "reply"), 1)
            .await
            .unwrap();

        let page = fx
            .service
            .find_children_by_parent(root.id, 1, 5)
            .await
            .unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.meta.item_count, 0);
    }

    #[tokio::test]
    async fn replies_are_paginated_oldest_first() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let root = fx.service.create(root_dto(7, "root"), 1).await.unwrap();
        for i in 0..7 {
            fx.service
                .create(reply_dto(root.id, &format!("reply {i}")), 1)
                .await
                .unwrap();
        }

        let first = fx
            .service
            .find_children_by_parent(root.id, 1, 5)
            .await
            .unwrap();
        assert_eq!(first.data.len(), 5);
        assert_eq!(first.data[0].text, "reply 0");
        assert_eq!(first.meta.item_count, 7);
        assert!(first.meta.has_next_page);

        let second = fx
            .service
            .find_children_by_parent(root.id, 2, 5)
            .await
            .unwrap();
        assert_eq!(second.data.len(), 2);
        assert_eq!(second.data[0].text, "reply 5");
        assert!(!second.meta.has_next_page);
    }

    #[tokio::test]
    async fn cached_page_is_served_verbatim() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);
        fx.service.create(root_dto(7, "only"), 1).await.unwrap();

        let params = roots_params(7, 1, 10, Order::Asc);
        let first = fx.service.find_roots_paginated(&params).await.unwrap();
        assert_eq!(first.data.len(), 1);

        // A write that bypasses the service never clears the cache, so the
        // stale page keeps being served until the TTL runs out.
        fx.sneak_in_root(7, 1, "sneaky");

        let second = fx.service.find_roots_paginated(&params).await.unwrap();
        assert_eq!(second.data.len(), 1);
        assert_eq!(second.meta.item_count, 1);
    }

    #[tokio::test]
    async fn mutations_refresh_listings() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);
        let first = fx.service.create(root_dto(7, "one"), 1).await.unwrap();

        let params = roots_params(7, 1, 10, Order::Asc);
        assert_eq!(
            fx.service
                .find_roots_paginated(&params)
                .await
                .unwrap()
                .meta
                .item_count,
            1
        );

        fx.service.create(root_dto(7, "two"), 1).await.unwrap();
        assert_eq!(
            fx.service
                .find_roots_paginated(&params)
                .await
                .unwrap()
                .meta
                .item_count,
            2
        );

        fx.service.remove(first.id, 1).await.unwrap();
        assert_eq!(
            fx.service
                .find_roots_paginated(&params)
                .await
                .unwrap()
                .meta
                .item_count,
            1
        );
    }

    #[tokio::test]
    async fn find_one_enforces_ownership() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_user(2, "ben");
        fx.add_media(7, true);

        let comment = fx.service.create(root_dto(7, "mine"), 1).await.unwrap();

        assert!(fx.service.find_one(comment.id, None).await.is_ok());
        assert!(fx.service.find_one(comment.id, Some(1)).await.is_ok());
        assert!(matches!(
            fx.service.find_one(comment.id, Some(2)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            fx.service.find_one(999, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn forbidden_remove_mutates_nothing() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_user(2, "ben");
        fx.add_media(7, true);

        let root = fx.service.create(root_dto(7, "root"), 1).await.unwrap();
        let reply = fx
            .service
            .create(reply_dto(root.id, "reply"), 1)
            .await
            .unwrap();

        // Warm the cache, then try to delete someone else's reply.
        let params = roots_params(7, 1, 10, Order::Asc);
        fx.service.find_roots_paginated(&params).await.unwrap();
        let events_before = fx.events().len();

        assert!(matches!(
            fx.service.remove(reply.id, 2).await,
            Err(AppError::Forbidden(_))
        ));

        assert!(fx.service.find_one(reply.id, None).await.is_ok());
        assert_eq!(fx.children_count(root.id), 1);
        assert_eq!(fx.events().len(), events_before);

        // The cache was not cleared: a direct store write stays invisible.
        fx.sneak_in_root(7, 1, "sneaky");
        assert_eq!(
            fx.service
                .find_roots_paginated(&params)
                .await
                .unwrap()
                .meta
                .item_count,
            1
        );
    }

    #[tokio::test]
    async fn removing_a_root_takes_its_replies_along() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let root = fx.service.create(root_dto(7, "root"), 1).await.unwrap();
        let reply = fx
            .service
            .create(reply_dto(root.id, "reply"), 1)
            .await
            .unwrap();

        fx.service.remove(root.id, 1).await.unwrap();

        assert!(matches!(
            fx.service.find_one(root.id, None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.find_one(reply.id, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn strips_markup_from_comment_text() {
        let fx = fixture();
        fx.add_user(1, "ana");
        fx.add_media(7, true);

        let comment = fx
            .service
            .create(root_dto(7, "<script>alert(1)</script>nice shot"), 1)
            .await
            .unwrap();

        assert!(!comment.text.contains("script"));
        assert!(comment.text.contains("nice shot"));
    }
}
