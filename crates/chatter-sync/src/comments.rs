use uuid::Uuid;
use validator::Validate;

use chatter_api::comments as comments_api;
use chatter_types::Page;
use chatter_types::forms::CommentForm;
use chatter_types::models::Comment;

use crate::cache::QueryOptions;
use crate::key::{comment_keys, post_keys};
use crate::{ApiError, Chatter};

impl Chatter {
    /// Comments for one post. Pages share the post's key so an
    /// invalidation after a write refreshes them all.
    pub async fn comments(
        &self,
        post_id: Uuid,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, ApiError> {
        let api = self.social_api.clone();
        let key = comment_keys::list(post_id).child(page.to_string());
        self.cache
            .fetch(key, QueryOptions::default(), move || {
                let api = api.clone();
                async move { comments_api::list_comments(&api, post_id, page, size).await }
            })
            .await
    }

    pub async fn comment(&self, id: Uuid) -> Result<Comment, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(comment_keys::detail(id), QueryOptions::default(), move || {
                let api = api.clone();
                async move { comments_api::get_comment(&api, id).await }
            })
            .await
    }

    /// Creating a comment bumps the parent post's comment count, so its
    /// detail and the feed go stale along with the comment list.
    pub async fn create_comment(&self, post_id: Uuid, form: CommentForm) -> Result<Comment, ApiError> {
        form.validate()?;
        let comment =
            comments_api::create_comment(&self.social_api, &form.into_create_request(post_id))
                .await?;
        self.cache.invalidate(&comment_keys::list(post_id));
        self.cache.invalidate(&post_keys::detail(post_id));
        self.cache.invalidate(&post_keys::feed());
        Ok(comment)
    }

    pub async fn update_comment(&self, id: Uuid, form: CommentForm) -> Result<(), ApiError> {
        form.validate()?;
        comments_api::update_comment(&self.social_api, id, &form.into_update_request()).await?;
        self.cache.invalidate(&comment_keys::detail(id));
        self.cache.invalidate(&comment_keys::lists());
        Ok(())
    }

    pub async fn delete_comment(&self, id: Uuid, post_id: Uuid) -> Result<(), ApiError> {
        comments_api::delete_comment(&self.social_api, id).await?;
        self.cache.remove(&comment_keys::detail(id));
        self.cache.invalidate(&comment_keys::list(post_id));
        self.cache.invalidate(&post_keys::detail(post_id));
        self.cache.invalidate(&post_keys::feed());
        Ok(())
    }
}
