use std::time::Duration;

use uuid::Uuid;
use validator::Validate;

use chatter_api::chat as chat_api;
use chatter_types::Page;
use chatter_types::forms::{GroupForm, MessageForm};
use chatter_types::models::{Conversation, Message};

use crate::cache::QueryOptions;
use crate::key::chat_keys;
use crate::poll::{PollHandle, spawn_poll};
use crate::{ApiError, Chatter};

pub const MESSAGES_PAGE_SIZE: u32 = 50;
/// The conversation list only shifts on new activity; a slow poll is
/// enough to surface unread badges.
pub const CONVERSATIONS_POLL_PERIOD: Duration = Duration::from_secs(30);
/// An open conversation needs to feel live.
pub const MESSAGES_POLL_PERIOD: Duration = Duration::from_secs(5);

impl Chatter {
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(chat_keys::conversations(), QueryOptions::default(), move || {
                let api = api.clone();
                async move { chat_api::conversations(&api).await }
            })
            .await
    }

    pub async fn conversation(&self, id: Uuid) -> Result<Conversation, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch(chat_keys::conversation(id), QueryOptions::default(), move || {
                let api = api.clone();
                async move { chat_api::get_conversation(&api, id).await }
            })
            .await
    }

    /// Cached message pages for a conversation, newest first within
    /// each page. See [`messages_chronological`] for display order.
    pub async fn messages(&self, conversation_id: Uuid) -> Result<Vec<Page<Message>>, ApiError> {
        let api = self.social_api.clone();
        self.cache
            .fetch_infinite(
                chat_keys::messages(conversation_id),
                QueryOptions::default(),
                move |page| {
                    let api = api.clone();
                    async move {
                        chat_api::messages(&api, conversation_id, page, MESSAGES_PAGE_SIZE).await
                    }
                },
            )
            .await
    }

    /// Load one more page of history (older messages).
    pub async fn messages_next_page(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Page<Message>>, ApiError> {
        let api = &self.social_api;
        self.cache
            .fetch_next_page(
                &chat_keys::messages(conversation_id),
                QueryOptions::default(),
                |page| async move {
                    chat_api::messages(api, conversation_id, page, MESSAGES_PAGE_SIZE).await
                },
            )
            .await
    }

    pub fn messages_has_more(&self, conversation_id: Uuid) -> bool {
        self.cache.has_next_page(&chat_keys::messages(conversation_id))
    }

    pub async fn create_direct(&self, recipient_id: Uuid) -> Result<Conversation, ApiError> {
        let req = chatter_types::api::CreateDirectConversationRequest { recipient_id };
        let conversation = chat_api::create_direct(&self.social_api, &req).await?;
        self.cache.invalidate(&chat_keys::conversations());
        Ok(conversation)
    }

    pub async fn create_group(&self, form: GroupForm) -> Result<Conversation, ApiError> {
        form.validate()?;
        let conversation = chat_api::create_group(&self.social_api, &form.into_request()).await?;
        self.cache.invalidate(&chat_keys::conversations());
        Ok(conversation)
    }

    /// The conversation list is invalidated too so its last-message
    /// preview catches up.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        form: MessageForm,
    ) -> Result<Message, ApiError> {
        form.validate()?;
        let message =
            chat_api::send_message(&self.social_api, conversation_id, &form.into_request()).await?;
        self.cache.invalidate(&chat_keys::messages(conversation_id));
        self.cache.invalidate(&chat_keys::conversations());
        Ok(message)
    }

    pub async fn mark_read(&self, conversation_id: Uuid) -> Result<(), ApiError> {
        chat_api::mark_read(&self.social_api, conversation_id).await?;
        self.cache.invalidate(&chat_keys::conversation(conversation_id));
        self.cache.invalidate(&chat_keys::conversations());
        Ok(())
    }

    /// Keep the conversation list fresh while its view is open. Errors
    /// inside a tick are swallowed; the next tick tries again.
    pub fn poll_conversations(&self) -> PollHandle {
        let chatter = self.clone();
        spawn_poll(CONVERSATIONS_POLL_PERIOD, move || {
            let chatter = chatter.clone();
            async move {
                chatter.cache.invalidate(&chat_keys::conversations());
                let _ = chatter.conversations().await;
            }
        })
    }

    /// Keep an open conversation's messages fresh. Re-fetches every
    /// loaded page so edits and reads deeper in history land too.
    pub fn poll_messages(&self, conversation_id: Uuid) -> PollHandle {
        let chatter = self.clone();
        spawn_poll(MESSAGES_POLL_PERIOD, move || {
            let chatter = chatter.clone();
            async move {
                let api = &chatter.social_api;
                let _ = chatter
                    .cache
                    .refetch_infinite(
                        &chat_keys::messages(conversation_id),
                        QueryOptions::default(),
                        |page| async move {
                            chat_api::messages(api, conversation_id, page, MESSAGES_PAGE_SIZE).await
                        },
                    )
                    .await;
            }
        })
    }
}

/// Flatten cached pages into oldest-first display order. The server
/// returns newest first within and across pages.
pub fn messages_chronological(pages: &[Page<Message>]) -> Vec<Message> {
    let mut all: Vec<Message> = pages.iter().flat_map(|p| p.items.iter().cloned()).collect();
    all.reverse();
    all
}
