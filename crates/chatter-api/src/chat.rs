use uuid::Uuid;

use chatter_types::Page;
use chatter_types::api::{
    CreateDirectConversationRequest, CreateGroupConversationRequest, SendMessageRequest,
};
use chatter_types::models::{Conversation, Message};

use crate::client::ApiClient;
use crate::error::ApiError;

pub async fn conversations(api: &ApiClient) -> Result<Vec<Conversation>, ApiError> {
    api.get_json("/conversations").await
}

pub async fn get_conversation(api: &ApiClient, id: Uuid) -> Result<Conversation, ApiError> {
    api.get_json(&format!("/conversations/{}", id)).await
}

pub async fn create_direct(
    api: &ApiClient,
    req: &CreateDirectConversationRequest,
) -> Result<Conversation, ApiError> {
    api.post_json("/conversations/direct", req).await
}

pub async fn create_group(
    api: &ApiClient,
    req: &CreateGroupConversationRequest,
) -> Result<Conversation, ApiError> {
    api.post_json("/conversations/group", req).await
}

/// Messages in a conversation, newest first.
pub async fn messages(
    api: &ApiClient,
    conversation_id: Uuid,
    page: u32,
    size: u32,
) -> Result<Page<Message>, ApiError> {
    api.get_json_query(
        &format!("/conversations/{}/messages", conversation_id),
        &[("page", page), ("size", size)],
    )
    .await
}

pub async fn send_message(
    api: &ApiClient,
    conversation_id: Uuid,
    req: &SendMessageRequest,
) -> Result<Message, ApiError> {
    api.post_json(&format!("/conversations/{}/messages", conversation_id), req)
        .await
}

pub async fn mark_read(api: &ApiClient, conversation_id: Uuid) -> Result<(), ApiError> {
    api.post_empty(&format!("/conversations/{}/read", conversation_id))
        .await
}
