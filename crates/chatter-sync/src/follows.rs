use tracing::debug;
use uuid::Uuid;

use chatter_api::follows as follows_api;
use chatter_types::Page;
use chatter_types::models::{FollowStats, User};

use crate::cache::QueryOptions;
use crate::key::follow_keys;
use crate::pending::PendingFlag;
use crate::{ApiError, Chatter};

impl Chatter {
    pub async fn followers(
        &self,
        user_id: Uuid,
        page: u32,
        size: u32,
    ) -> Result<Page<User>, ApiError> {
        let api = self.social_api.clone();
        let key = follow_keys::followers(user_id).child(page.to_string());
        self.cache
            .fetch(key, QueryOptions::default(), move || {
                let api = api.clone();
                async move { follows_api::followers(&api, user_id, page, size).await }
            })
            .await
    }

    pub async fn following(
        &self,
        user_id: Uuid,
        page: u32,
        size: u32,
    ) -> Result<Page<User>, ApiError> {
        let api = self.social_api.clone();
        let key = follow_keys::following(user_id).child(page.to_string());
        self.cache
            .fetch(key, QueryOptions::default(), move || {
                let api = api.clone();
                async move { follows_api::following(&api, user_id, page, size).await }
            })
            .await
    }

    pub async fn follow_stats(&self, user_id: Uuid) -> Result<FollowStats, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(follow_keys::stats(user_id), QueryOptions::default(), move || {
                let api = api.clone();
                async move { follows_api::follow_stats(&api, user_id).await }
            })
            .await
    }

    pub async fn is_following(&self, user_id: Uuid) -> Result<bool, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(
                follow_keys::is_following(user_id),
                QueryOptions::default(),
                move || {
                    let api = api.clone();
                    async move { follows_api::is_following(&api, user_id).await }
                },
            )
            .await
    }

    pub async fn follow(&self, user_id: Uuid) -> Result<(), ApiError> {
        follows_api::follow_user(&self.social_api, user_id).await?;
        self.invalidate_follow_state(user_id);
        Ok(())
    }

    pub async fn unfollow(&self, user_id: Uuid) -> Result<(), ApiError> {
        follows_api::unfollow_user(&self.social_api, user_id).await?;
        self.invalidate_follow_state(user_id);
        Ok(())
    }

    /// Follow or unfollow, refusing while a previous toggle for the
    /// same flag is still in flight.
    pub async fn toggle_follow(
        &self,
        user_id: Uuid,
        is_following: bool,
        pending: &PendingFlag,
    ) -> Result<(), ApiError> {
        let Some(_guard) = pending.try_enter() else {
            debug!("Follow toggle for {} already in flight, ignoring", user_id);
            return Ok(());
        };
        if is_following {
            self.unfollow(user_id).await
        } else {
            self.follow(user_id).await
        }
    }

    /// Stats and the relationship flag change for both sides, and every
    /// cached following list may now be wrong.
    fn invalidate_follow_state(&self, user_id: Uuid) {
        self.cache.invalidate(&follow_keys::stats(user_id));
        self.cache.invalidate(&follow_keys::is_following(user_id));
        self.cache.invalidate(&follow_keys::following_all());
        self.cache.invalidate(&follow_keys::followers(user_id));
    }
}
