use chatter_types::api::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest};
use chatter_types::models::User;

use crate::client::ApiClient;
use crate::error::ApiError;

pub async fn login(api: &ApiClient, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
    api.post_json("/auth/login", req).await
}

pub async fn register(api: &ApiClient, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
    api.post_json("/auth/register", req).await
}

pub async fn current_user(api: &ApiClient) -> Result<User, ApiError> {
    api.get_json("/auth/me").await
}

pub async fn refresh(api: &ApiClient, req: &RefreshTokenRequest) -> Result<AuthResponse, ApiError> {
    api.post_json("/auth/refresh", req).await
}

pub async fn logout(api: &ApiClient) -> Result<(), ApiError> {
    api.post_empty("/auth/logout").await
}
