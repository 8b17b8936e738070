pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod services;
pub mod session;
pub mod transport;
pub mod view;

pub use auth::{IdentityClient, OAuthProvider, Profile, PublicKey, RefreshingSessions};
pub use config::{AppConfig, ClientConfig};
pub use error::{ApiError, AuthError, ConfigError, ErrorKind};
pub use guard::{AuthGuard, Navigator, Redirect, Route};
pub use services::{Pagination, Services};
pub use session::{AuthUser, Session, SessionProvider, SessionStore};
pub use transport::{ApiClient, ApiPath, RequestOptions};
pub use view::{Page, ViewState};
