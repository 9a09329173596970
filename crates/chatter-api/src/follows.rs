use uuid::Uuid;

use chatter_types::Page;
use chatter_types::api::{FollowRequest, FollowResponse, IsFollowingResponse};
use chatter_types::models::{FollowStats, User};

use crate::client::ApiClient;
use crate::error::ApiError;

pub async fn follow_user(api: &ApiClient, user_id: Uuid) -> Result<FollowResponse, ApiError> {
    api.post_json("/follows", &FollowRequest { user_id }).await
}

pub async fn unfollow_user(api: &ApiClient, user_id: Uuid) -> Result<(), ApiError> {
    api.delete_unit(&format!("/users/{}/follow", user_id)).await
}

pub async fn followers(
    api: &ApiClient,
    user_id: Uuid,
    page: u32,
    size: u32,
) -> Result<Page<User>, ApiError> {
    api.get_json_query(
        &format!("/users/{}/followers", user_id),
        &[("page", page), ("size", size)],
    )
    .await
}

pub async fn following(
    api: &ApiClient,
    user_id: Uuid,
    page: u32,
    size: u32,
) -> Result<Page<User>, ApiError> {
    api.get_json_query(
        &format!("/users/{}/following", user_id),
        &[("page", page), ("size", size)],
    )
    .await
}

pub async fn follow_stats(api: &ApiClient, user_id: Uuid) -> Result<FollowStats, ApiError> {
    api.get_json(&format!("/users/{}/follow-stats", user_id)).await
}

pub async fn is_following(api: &ApiClient, user_id: Uuid) -> Result<bool, ApiError> {
    let resp: IsFollowingResponse = api
        .get_json(&format!("/users/{}/is-following", user_id))
        .await?;
    Ok(resp.is_following)
}
