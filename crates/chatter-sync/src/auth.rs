use std::time::Duration;

use tracing::warn;
use validator::Validate;

use chatter_api::auth as auth_api;
use chatter_types::api::{AuthResponse, RefreshTokenRequest};
use chatter_types::forms::{LoginForm, RegisterForm};
use chatter_types::models::User;

use crate::cache::QueryOptions;
use crate::key::auth_keys;
use crate::{ApiError, Chatter};

/// Identity changes rarely; cache it well past the app-wide default.
pub const CURRENT_USER_STALE_TIME: Duration = Duration::from_secs(5 * 60);

impl Chatter {
    /// The authenticated user's own identity. No retry: a failure here
    /// usually means the token is dead, and the 401 path handles that.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        if !self.session.is_authenticated() {
            return Err(ApiError::Unauthorized);
        }
        let api = self.auth_api.clone();
        self.cache
            .fetch(
                auth_keys::current_user(),
                QueryOptions::default()
                    .stale_time(CURRENT_USER_STALE_TIME)
                    .no_retry(),
                move || {
                    let api = api.clone();
                    async move { auth_api::current_user(&api).await }
                },
            )
            .await
    }

    /// Validate locally, authenticate, persist the session, and drop
    /// any identity cached for the previous account.
    pub async fn login(&self, form: LoginForm) -> Result<AuthResponse, ApiError> {
        form.validate()?;
        let resp = auth_api::login(&self.auth_api, &form.into_request()).await?;
        self.session.set_auth(
            resp.access_token.clone(),
            resp.refresh_token.clone(),
            resp.user.clone(),
        );
        self.cache.invalidate(&auth_keys::all());
        Ok(resp)
    }

    /// Registration does not sign the user in; the caller sends them to
    /// the login view on success.
    pub async fn register(&self, form: RegisterForm) -> Result<AuthResponse, ApiError> {
        form.validate()?;
        auth_api::register(&self.auth_api, &form.into_request()).await
    }

    /// Exchange the stored refresh token for fresh credentials.
    pub async fn refresh(&self) -> Result<AuthResponse, ApiError> {
        let refresh_token = self
            .session
            .snapshot()
            .refresh_token
            .ok_or(ApiError::Unauthorized)?;
        let resp = auth_api::refresh(&self.auth_api, &RefreshTokenRequest { refresh_token }).await?;
        let user = resp.user.clone().or_else(|| self.session.current_user());
        self.session
            .set_auth(resp.access_token.clone(), resp.refresh_token.clone(), user);
        Ok(resp)
    }

    /// Local state is cleared even when the server call fails; a dead
    /// backend must not trap the user in a session.
    pub async fn logout(&self) {
        if let Err(e) = auth_api::logout(&self.auth_api).await {
            warn!("Logout request failed, clearing local state anyway: {}", e);
        }
        self.session.logout();
        self.cache.clear();
    }
}
