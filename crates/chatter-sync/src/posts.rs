use uuid::Uuid;
use validator::Validate;

use chatter_api::posts as posts_api;
use chatter_types::Page;
use chatter_types::api::ListPostsParams;
use chatter_types::forms::PostForm;
use chatter_types::models::Post;

use crate::cache::QueryOptions;
use crate::key::post_keys;
use crate::{ApiError, Chatter};

pub const FEED_PAGE_SIZE: u32 = 20;
pub const POSTS_PAGE_SIZE: u32 = 20;

fn user_page_params(user_id: Uuid, page: u32) -> ListPostsParams {
    ListPostsParams {
        user_id: Some(user_id),
        page: Some(page),
        size: Some(POSTS_PAGE_SIZE),
        ..Default::default()
    }
}

impl Chatter {
    pub async fn posts(&self, params: ListPostsParams) -> Result<Page<Post>, ApiError> {
        let api = self.social_api.clone();
        let key = post_keys::list(&params);
        self.cache
            .fetch(key, QueryOptions::default(), move || {
                let api = api.clone();
                let params = params.clone();
                async move { posts_api::list_posts(&api, &params).await }
            })
            .await
    }

    pub async fn post(&self, id: Uuid) -> Result<Post, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(post_keys::detail(id), QueryOptions::default(), move || {
                let api = api.clone();
                async move { posts_api::get_post(&api, id).await }
            })
            .await
    }

    /// Cached pages of the followed-users feed, fetching the first page
    /// on a cold start.
    pub async fn feed(&self) -> Result<Vec<Page<Post>>, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch_infinite(post_keys::feed(), QueryOptions::default(), move |page| {
                let api = api.clone();
                async move { posts_api::feed(&api, page, FEED_PAGE_SIZE).await }
            })
            .await
    }

    /// Append the next feed page. No-op when the last page is final.
    pub async fn feed_next_page(&self) -> Result<Vec<Page<Post>>, ApiError> {
        let api = &self.social_api;
        self.cache
            .fetch_next_page(&post_keys::feed(), QueryOptions::default(), |page| async move {
                posts_api::feed(api, page, FEED_PAGE_SIZE).await
            })
            .await
    }

    pub fn feed_has_next(&self) -> bool {
        self.cache.has_next_page(&post_keys::feed())
    }

    /// Cached pages of one user's posts (profile view).
    pub async fn user_posts(&self, user_id: Uuid) -> Result<Vec<Page<Post>>, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch_infinite(post_keys::user(user_id), QueryOptions::default(), move |page| {
                let api = api.clone();
                async move { posts_api::list_posts(&api, &user_page_params(user_id, page)).await }
            })
            .await
    }

    pub async fn user_posts_next_page(&self, user_id: Uuid) -> Result<Vec<Page<Post>>, ApiError> {
        let api = &self.social_api;
        self.cache
            .fetch_next_page(&post_keys::user(user_id), QueryOptions::default(), |page| async move {
                posts_api::list_posts(api, &user_page_params(user_id, page)).await
            })
            .await
    }

    pub fn user_posts_has_next(&self, user_id: Uuid) -> bool {
        self.cache.has_next_page(&post_keys::user(user_id))
    }

    pub async fn create_post(&self, form: PostForm) -> Result<Post, ApiError> {
        form.validate()?;
        let post = posts_api::create_post(&self.social_api, &form.into_create_request()).await?;
        self.cache.invalidate(&post_keys::lists());
        self.cache.invalidate(&post_keys::feed());
        Ok(post)
    }

    pub async fn update_post(&self, id: Uuid, form: PostForm) -> Result<(), ApiError> {
        form.validate()?;
        posts_api::update_post(&self.social_api, id, &form.into_update_request()).await?;
        self.cache.invalidate(&post_keys::detail(id));
        self.cache.invalidate(&post_keys::lists());
        self.cache.invalidate(&post_keys::feed());
        Ok(())
    }

    /// The detail entry is removed rather than invalidated: the post is
    /// gone and a refetch would only 404.
    pub async fn delete_post(&self, id: Uuid) -> Result<(), ApiError> {
        posts_api::delete_post(&self.social_api, id).await?;
        self.cache.remove(&post_keys::detail(id));
        self.cache.invalidate(&post_keys::lists());
        self.cache.invalidate(&post_keys::feed());
        Ok(())
    }
}
