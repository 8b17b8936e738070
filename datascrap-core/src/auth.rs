//! Client for the external identity service.
//!
//! Only the public (anonymous) key is ever held here. Privileged keys
//! belong to server-side tooling and have no representation in this crate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::AuthError;
use crate::session::{AuthUser, Session, SessionProvider, SessionStore};

/// Tier assumed for users without a profile row or without a tier on it.
pub const FREE_TIER: &str = "free";

/// Public identity-service key, safe to ship in client builds.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(String);

impl PublicKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PublicKey(..)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

#[derive(Debug, Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Option<Session> {
        let access_token = self.access_token.filter(|t| !t.is_empty())?;
        let user = self.user?;
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| {
                self.expires_in
                    .map(|secs| now + chrono::Duration::seconds(secs))
            });
        Some(Session {
            access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user,
        })
    }
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Row of the `profiles` table kept next to the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub subscription_tier: Option<String>,
}

impl Profile {
    pub fn tier(&self) -> &str {
        self.subscription_tier
            .as_deref()
            .filter(|tier| !tier.is_empty())
            .unwrap_or(FREE_TIER)
    }

    /// Paying users only: an active status on a free tier does not count.
    pub fn has_active_subscription(&self) -> bool {
        self.subscription_status.as_deref() == Some("active") && self.tier() != FREE_TIER
    }
}

#[derive(Clone, Debug)]
pub struct IdentityClient {
    client: Client,
    base_url: Url,
    key: PublicKey,
}

impl IdentityClient {
    pub fn new(base_url: Url, key: PublicKey) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url,
            key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let mut url = self.endpoint("/auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let response = self
            .client
            .post(url)
            .header("apikey", self.key.as_str())
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        self.session_from(response).await?.ok_or(AuthError::NoSession)
    }

    /// Registers a user. Returns `None` when the service requires email confirmation first.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let url = self.endpoint("/auth/v1/signup")?;
        let response = self
            .client
            .post(url)
            .header("apikey", self.key.as_str())
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        self.session_from(response).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let mut url = self.endpoint("/auth/v1/token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");
        let response = self
            .client
            .post(url)
            .header("apikey", self.key.as_str())
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;
        self.session_from(response).await?.ok_or(AuthError::NoSession)
    }

    /// Completes an OAuth sign-in from the URL the provider redirected to.
    ///
    /// Tokens arrive in the fragment (`#access_token=..&refresh_token=..&expires_in=..`);
    /// the user is then looked up with the new access token.
    pub async fn session_from_redirect(&self, redirect: &Url) -> Result<Session, AuthError> {
        let fragment = redirect.fragment().unwrap_or_default();
        let mut tokens = TokenResponse {
            access_token: None,
            refresh_token: None,
            expires_in: None,
            expires_at: None,
            user: None,
        };
        for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
            match key.as_ref() {
                "access_token" => tokens.access_token = Some(value.into_owned()),
                "refresh_token" => tokens.refresh_token = Some(value.into_owned()),
                "expires_in" => tokens.expires_in = value.parse().ok(),
                "expires_at" => tokens.expires_at = value.parse().ok(),
                "error_description" => {
                    return Err(AuthError::Rejected {
                        status: 400,
                        message: value.into_owned(),
                    })
                }
                _ => {}
            }
        }
        let token = tokens
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::NoSession)?;
        tokens.user = Some(self.get_user(&token).await?);
        tokens.into_session(Utc::now()).ok_or(AuthError::NoSession)
    }

    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let url = self.endpoint("/auth/v1/user")?;
        let response = self
            .client
            .get(url)
            .header("apikey", self.key.as_str())
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = self.endpoint("/auth/v1/logout")?;
        let response = self
            .client
            .post(url)
            .header("apikey", self.key.as_str())
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::check(response).await?;
        debug!("signed out");
        Ok(())
    }

    /// Profile row of `user_id`, or `None` when the user has none yet.
    pub async fn profile(&self, access_token: &str, user_id: &str) -> Result<Option<Profile>, AuthError> {
        let mut url = self.endpoint("/rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{user_id}"))
            .append_pair("select", "*");
        let response = self
            .client
            .get(url)
            .header("apikey", self.key.as_str())
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let rows: Vec<Profile> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    /// URL the user's browser must open to start an OAuth sign-in.
    pub fn oauth_authorize_url(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Url, AuthError> {
        let mut url = self.endpoint("/auth/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to);
        Ok(url)
    }

    async fn session_from(&self, response: Response) -> Result<Option<Session>, AuthError> {
        let response = Self::check(response).await?;
        let body: TokenResponse = response.json().await?;
        Ok(body.into_session(Utc::now()))
    }

    async fn check(response: Response) -> Result<Response, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<IdentityErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error_description.or(b.msg).or(b.message).or(b.error))
            .unwrap_or_else(|| format!("identity service returned {}", status.as_u16()));
        warn!(status = status.as_u16(), %message, "identity request rejected");
        Err(AuthError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Session source that renews an expired access token before handing it out.
///
/// Clones share one refresh lock, so concurrent callers trigger a single refresh.
#[derive(Clone)]
pub struct RefreshingSessions {
    sessions: SessionStore,
    identity: IdentityClient,
    refresh_lock: Arc<Mutex<()>>,
}

impl RefreshingSessions {
    pub fn new(sessions: SessionStore, identity: IdentityClient) -> Self {
        Self {
            sessions,
            identity,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Stored session if still valid, otherwise a refreshed one. `None` when neither exists.
    pub async fn valid_session(&self) -> Option<Session> {
        let session = self.sessions.get().await?;
        if !session.is_expired(Utc::now()) {
            return Some(session);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while this one waited.
        let session = self.sessions.get().await?;
        if !session.is_expired(Utc::now()) {
            return Some(session);
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            debug!("session expired without a refresh token");
            return None;
        };
        match self.identity.refresh(refresh_token).await {
            Ok(fresh) => {
                debug!(user = %fresh.user.id, "session refreshed");
                self.sessions.set(fresh.clone()).await;
                Some(fresh)
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed");
                None
            }
        }
    }
}

#[async_trait]
impl SessionProvider for RefreshingSessions {
    async fn current_session(&self) -> Option<Session> {
        self.valid_session().await
    }
}
