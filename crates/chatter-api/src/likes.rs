use uuid::Uuid;

use chatter_types::api::{LikeCountResponse, LikePostRequest, LikeResponse, LikeStatusResponse};

use crate::client::ApiClient;
use crate::error::ApiError;

pub async fn like_post(api: &ApiClient, post_id: Uuid) -> Result<LikeResponse, ApiError> {
    api.post_json("/likes", &LikePostRequest { post_id }).await
}

pub async fn unlike_post(api: &ApiClient, post_id: Uuid) -> Result<(), ApiError> {
    api.delete_unit(&format!("/posts/{}/likes", post_id)).await
}

pub async fn like_count(api: &ApiClient, post_id: Uuid) -> Result<LikeCountResponse, ApiError> {
    api.get_json(&format!("/posts/{}/likes/count", post_id)).await
}

pub async fn like_status(api: &ApiClient, post_id: Uuid) -> Result<LikeStatusResponse, ApiError> {
    api.get_json(&format!("/posts/{}/likes/status", post_id)).await
}
