use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{IdentityClient, RefreshingSessions};
use crate::session::{AuthUser, SessionStore};

/// Dashboard views reachable by navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Sources,
    NewSource,
    Articles,
    Digests,
    Digest(String),
    Settings,
    Account,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_owned(),
            Route::Signup => "/signup".to_owned(),
            Route::Dashboard => "/dashboard".to_owned(),
            Route::Sources => "/dashboard/sources".to_owned(),
            Route::NewSource => "/dashboard/sources/new".to_owned(),
            Route::Articles => "/dashboard/articles".to_owned(),
            Route::Digests => "/dashboard/digests".to_owned(),
            Route::Digest(id) => format!("/dashboard/digests/{id}"),
            Route::Settings => "/dashboard/settings".to_owned(),
            Route::Account => "/dashboard/account".to_owned(),
        }
    }

    /// Login and signup are the only views an anonymous user may see.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Signup)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Whatever can move the user to another view (a window, a browser, a test recorder).
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Terminal outcome of a guard: the current render stops and the user goes to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redirect to {}", self.to)
    }
}

impl std::error::Error for Redirect {}

#[derive(Clone)]
pub struct AuthGuard {
    identity: IdentityClient,
    sessions: RefreshingSessions,
    navigator: Arc<dyn Navigator>,
}

impl AuthGuard {
    pub fn new(
        identity: IdentityClient,
        sessions: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let sessions = RefreshingSessions::new(sessions, identity.clone());
        Self::with_sessions(identity, sessions, navigator)
    }

    /// Guard sharing a refresh lock with other users of `sessions`, such as the transport.
    pub fn with_sessions(
        identity: IdentityClient,
        sessions: RefreshingSessions,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            identity,
            sessions,
            navigator,
        }
    }

    /// Current identity as confirmed by the identity service. Never fails.
    pub async fn current_user(&self) -> Option<AuthUser> {
        let session = self.sessions.valid_session().await?;
        let token = session.bearer_token()?;
        match self.identity.get_user(token).await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "error getting user");
                None
            }
        }
    }

    /// Gate for authenticated views: yields the user or redirects to login.
    pub async fn require_auth(&self) -> Result<AuthUser, Redirect> {
        match self.current_user().await {
            Some(user) => Ok(user),
            None => {
                info!("no authenticated user, redirecting to login");
                Err(self.redirect(Route::Login))
            }
        }
    }

    /// Login and signup views send already-authenticated users to the dashboard.
    pub async fn redirect_if_authenticated(&self) -> Option<Redirect> {
        self.current_user()
            .await
            .map(|_| self.redirect(Route::Dashboard))
    }

    fn redirect(&self, to: Route) -> Redirect {
        self.navigator.navigate(&to);
        Redirect { to }
    }
}
