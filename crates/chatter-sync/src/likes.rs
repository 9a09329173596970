use tracing::debug;
use uuid::Uuid;

use chatter_api::likes as likes_api;
use chatter_types::models::Post;

use crate::cache::QueryOptions;
use crate::key::{like_keys, post_keys};
use crate::pending::PendingFlag;
use crate::{ApiError, Chatter};

impl Chatter {
    pub async fn like_status(&self, post_id: Uuid) -> Result<bool, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(like_keys::status(post_id), QueryOptions::default(), move || {
                let api = api.clone();
                async move { Ok(likes_api::like_status(&api, post_id).await?.is_liked) }
            })
            .await
    }

    pub async fn like_count(&self, post_id: Uuid) -> Result<u64, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(like_keys::count(post_id), QueryOptions::default(), move || {
                let api = api.clone();
                async move { Ok(likes_api::like_count(&api, post_id).await?.count) }
            })
            .await
    }

    pub async fn like_post(&self, post_id: Uuid) -> Result<(), ApiError> {
        self.apply_like(post_id, true).await
    }

    pub async fn unlike_post(&self, post_id: Uuid) -> Result<(), ApiError> {
        self.apply_like(post_id, false).await
    }

    /// Like or unlike, reflecting the outcome in the cache before the
    /// server answers. At most one call per post runs at a time; extra
    /// presses while `pending` is set are dropped.
    pub async fn toggle_like(
        &self,
        post_id: Uuid,
        is_liked: bool,
        pending: &PendingFlag,
    ) -> Result<(), ApiError> {
        let Some(_guard) = pending.try_enter() else {
            debug!("Like toggle for {} already in flight, ignoring", post_id);
            return Ok(());
        };
        self.apply_like(post_id, !is_liked).await
    }

    /// Optimistic like/unlike. The cached post detail is patched first
    /// and restored from a snapshot if the request fails; either way
    /// the affected entries are invalidated so the next read reconciles
    /// with the server.
    async fn apply_like(&self, post_id: Uuid, liked: bool) -> Result<(), ApiError> {
        let detail_key = post_keys::detail(post_id);

        // Stop in-flight refetches from overwriting the patched entry.
        self.cache.cancel(&detail_key);
        self.cache.cancel(&post_keys::feed());

        let previous: Option<Post> = self.cache.get(&detail_key);
        if let Some(prev) = &previous {
            let mut patched = prev.clone();
            patched.is_liked = liked;
            patched.like_count = if liked {
                prev.like_count + 1
            } else {
                prev.like_count.saturating_sub(1)
            };
            self.cache.set(&detail_key, &patched);
        }

        let result = if liked {
            likes_api::like_post(&self.social_api, post_id).await.map(|_| ())
        } else {
            likes_api::unlike_post(&self.social_api, post_id).await
        };

        if result.is_err() {
            if let Some(prev) = &previous {
                self.cache.set(&detail_key, prev);
            }
        }

        self.cache.invalidate(&detail_key);
        self.cache.invalidate(&post_keys::feed());
        self.cache.invalidate(&like_keys::status(post_id));
        self.cache.invalidate(&like_keys::count(post_id));

        result
    }
}
