use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use chatter_session::SessionStore;
use chatter_types::ApiResponse;

use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_AUTH_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_SOCIAL_URL: &str = "http://localhost:8001/api/v1";

/// Invoked after a 401 has torn down the session; the embedding shell
/// uses it to navigate to the login view.
pub type UnauthorizedHook = Arc<dyn Fn() + Send + Sync>;

/// Base URLs and session file location, overridable via environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub auth_base_url: String,
    pub social_base_url: String,
    pub session_path: PathBuf,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            auth_base_url: std::env::var("CHATTER_AUTH_API_URL")
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.into()),
            social_base_url: std::env::var("CHATTER_SOCIAL_API_URL")
                .unwrap_or_else(|_| DEFAULT_SOCIAL_URL.into()),
            session_path: std::env::var("CHATTER_SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("chatter-session.json")),
        }
    }
}

/// One configured HTTP client for one backend service.
///
/// Every request attaches the current bearer token from the shared
/// session store; every 401 response clears that store, fires the
/// unauthorized hook, and still propagates the error to the caller.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
        on_unauthorized: Option<UnauthorizedHook>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = base_url.into();
        debug!("API client configured for {}", base_url);
        Ok(Self {
            http,
            base_url,
            session,
            on_unauthorized,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET `path`, unwrap the `{success, data}` envelope.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.execute(self.http.get(self.url(path))).await?;
        Self::unwrap_envelope(resp).await
    }

    /// GET `path` with a serialized query string, unwrap the envelope.
    pub async fn get_json_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let resp = self.execute(self.http.get(self.url(path)).query(query)).await?;
        Self::unwrap_envelope(resp).await
    }

    /// POST `body` to `path`, unwrap the envelope.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.execute(self.http.post(self.url(path)).json(body)).await?;
        Self::unwrap_envelope(resp).await
    }

    /// POST with no body, discarding any response payload.
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.http.post(self.url(path))).await?;
        Ok(())
    }

    /// PUT `body`, discarding any response payload.
    pub async fn put_unit<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.http.put(self.url(path)).json(body)).await?;
        Ok(())
    }

    /// DELETE, discarding any response payload.
    pub async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.http.delete(self.url(path))).await?;
        Ok(())
    }

    /// Attach the bearer token, send, and map the failure taxonomy.
    async fn execute(&self, req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let req = match self.session.access_token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Received 401 from {}, clearing session", self.base_url);
            self.session.logout();
            if let Some(hook) = &self.on_unauthorized {
                hook();
            }
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        Ok(resp)
    }

    async fn unwrap_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let text = resp.text().await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&text)?;
        Ok(envelope.data)
    }
}
