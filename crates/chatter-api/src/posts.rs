use uuid::Uuid;

use chatter_types::Page;
use chatter_types::api::{CreatePostRequest, ListPostsParams, UpdatePostRequest};
use chatter_types::models::Post;

use crate::client::ApiClient;
use crate::error::ApiError;

pub async fn list_posts(api: &ApiClient, params: &ListPostsParams) -> Result<Page<Post>, ApiError> {
    api.get_json_query("/posts", params).await
}

pub async fn get_post(api: &ApiClient, id: Uuid) -> Result<Post, ApiError> {
    api.get_json(&format!("/posts/{}", id)).await
}

/// Posts from followed users, newest first.
pub async fn feed(api: &ApiClient, page: u32, size: u32) -> Result<Page<Post>, ApiError> {
    api.get_json_query("/feed", &[("page", page), ("size", size)])
        .await
}

pub async fn create_post(api: &ApiClient, req: &CreatePostRequest) -> Result<Post, ApiError> {
    api.post_json("/posts", req).await
}

pub async fn update_post(
    api: &ApiClient,
    id: Uuid,
    req: &UpdatePostRequest,
) -> Result<(), ApiError> {
    api.put_unit(&format!("/posts/{}", id), req).await
}

pub async fn delete_post(api: &ApiClient, id: Uuid) -> Result<(), ApiError> {
    api.delete_unit(&format!("/posts/{}", id)).await
}
