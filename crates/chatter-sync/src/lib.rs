//! Client-side synchronization layer for the chatter backends.
//!
//! [`Chatter`] wires the persisted session store, the two API clients,
//! and the query cache together. Domain operations live in per-resource
//! modules (`posts`, `comments`, `likes`, `follows`, `chat`, `auth`) as
//! methods on `Chatter`; each query goes through the cache, each
//! mutation invalidates exactly the entries it affects.

pub mod auth;
pub mod cache;
pub mod chat;
pub mod comments;
pub mod follows;
pub mod key;
pub mod likes;
pub mod pending;
pub mod poll;
pub mod posts;

use std::sync::Arc;

use chatter_api::client::{ApiClient, ApiConfig, UnauthorizedHook};
use chatter_session::SessionStore;

pub use cache::{DEFAULT_STALE_TIME, QueryCache, QueryOptions};
pub use chatter_api::ApiError;
pub use key::QueryKey;
pub use pending::PendingFlag;
pub use poll::PollHandle;

/// Handle over the whole client stack. Cheap to clone; all clones share
/// the same session, cache, and connection pools.
#[derive(Clone)]
pub struct Chatter {
    pub(crate) auth_api: ApiClient,
    pub(crate) social_api: ApiClient,
    pub(crate) session: Arc<SessionStore>,
    pub(crate) cache: QueryCache,
}

impl Chatter {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Self::with_unauthorized_hook(config, None)
    }

    /// `on_unauthorized` fires after any 401 has torn down the session;
    /// the embedding shell uses it to show the login view.
    pub fn with_unauthorized_hook(
        config: ApiConfig,
        on_unauthorized: Option<UnauthorizedHook>,
    ) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::open(config.session_path.clone()));
        let auth_api = ApiClient::new(
            config.auth_base_url,
            session.clone(),
            on_unauthorized.clone(),
        )?;
        let social_api = ApiClient::new(config.social_base_url, session.clone(), on_unauthorized)?;
        Ok(Self {
            auth_api,
            social_api,
            session,
            cache: QueryCache::new(),
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}
