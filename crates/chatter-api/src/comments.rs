use uuid::Uuid;

use chatter_types::Page;
use chatter_types::api::{CreateCommentRequest, UpdateCommentRequest};
use chatter_types::models::Comment;

use crate::client::ApiClient;
use crate::error::ApiError;

pub async fn list_comments(
    api: &ApiClient,
    post_id: Uuid,
    page: u32,
    size: u32,
) -> Result<Page<Comment>, ApiError> {
    api.get_json_query(
        &format!("/posts/{}/comments", post_id),
        &[("page", page), ("size", size)],
    )
    .await
}

pub async fn get_comment(api: &ApiClient, id: Uuid) -> Result<Comment, ApiError> {
    api.get_json(&format!("/comments/{}", id)).await
}

pub async fn create_comment(
    api: &ApiClient,
    req: &CreateCommentRequest,
) -> Result<Comment, ApiError> {
    api.post_json("/comments", req).await
}

pub async fn update_comment(
    api: &ApiClient,
    id: Uuid,
    req: &UpdateCommentRequest,
) -> Result<(), ApiError> {
    api.put_unit(&format!("/comments/{}", id), req).await
}

pub async fn delete_comment(api: &ApiClient, id: Uuid) -> Result<(), ApiError> {
    api.delete_unit(&format!("/comments/{}", id)).await
}
