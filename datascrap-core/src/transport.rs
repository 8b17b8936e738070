use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{ApiError, ErrorKind};
use crate::guard::{Navigator, Route};
use crate::session::SessionProvider;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call extras: query parameters and additional headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    headers: HeaderMap,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    /// Adds the parameter only when a value is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

/// Backend path as a list of segments.
///
/// Segments added with [`ApiPath::segment`] are sent as one path segment even
/// when they contain `/`, so ids cannot reach a different endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiPath {
    segments: Vec<String>,
}

impl ApiPath {
    /// Splits a fixed route such as `/api/v1/sources` on `/`.
    pub fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl From<&str> for ApiPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Single point of outbound communication with the backend.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    sessions: Arc<dyn SessionProvider>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ApiClient {
    pub fn new(base_url: Url, sessions: Arc<dyn SessionProvider>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT)?,
            base_url,
            sessions,
            navigator: None,
        })
    }

    /// Replaces the default 30 s per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, reqwest::Error> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Navigator told to show the login view when the backend answers 401.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: impl Into<ApiPath>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send::<(), T>(Method::GET, path.into(), None, options).await
    }

    pub async fn post<B, T>(
        &self,
        path: impl Into<ApiPath>,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path.into(), Some(body), options).await
    }

    /// POST without a request body, used by action endpoints.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: impl Into<ApiPath>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send::<(), T>(Method::POST, path.into(), None, options).await
    }

    pub async fn patch<B, T>(
        &self,
        path: impl Into<ApiPath>,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path.into(), Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: impl Into<ApiPath>,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.send::<(), T>(Method::DELETE, path.into(), None, options).await
    }

    /// Appends `path` to the base URL, percent-encoding each segment (`/` included).
    fn url_for(&self, path: &ApiPath) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(ErrorKind::Unknown, "API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(path.segments());
        Ok(url)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: ApiPath,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(&path)?;
        let mut request = self
            .client
            .request(method.clone(), url)
            .query(&options.query)
            .headers(options.headers.clone());

        // The token is looked up per call and never kept.
        match self.sessions.current_session().await {
            Some(session) => {
                if let Some(token) = session.bearer_token() {
                    request = request.header(AUTHORIZATION, format!("Bearer {token}"));
                }
            }
            None => debug!("no session, sending request unauthenticated"),
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, path = %path, query = ?options.query, "[API] request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = classify_transport_error(&e);
                warn!(method = %method, path = %path, kind = %err.kind, error = %e, "[API] request failed");
                return Err(err);
            }
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = classify_transport_error(&e);
                warn!(method = %method, path = %path, kind = %err.kind, error = %e, "[API] failed to read response");
                return Err(err);
            }
        };

        if !status.is_success() {
            let err = classify_status(status.as_u16(), &bytes);
            self.report(&method, &path, &err);
            return Err(err);
        }

        debug!(method = %method, path = %path, status = status.as_u16(), "[API] response");
        decode_body(&bytes)
    }

    fn report(&self, method: &Method, path: &ApiPath, err: &ApiError) {
        if err.is_unauthorized() {
            error!(method = %method, path = %path, "unauthorized, redirecting to login");
            if let Some(navigator) = &self.navigator {
                navigator.navigate(&Route::Login);
            }
        } else {
            warn!(
                method = %method,
                path = %path,
                kind = %err.kind,
                status = ?err.status,
                message = %err.message,
                "[API] error response"
            );
        }
    }
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let bytes: &[u8] = if bytes.is_empty() { b"null" } else { bytes };
    serde_json::from_slice(bytes).map_err(|e| {
        ApiError::new(ErrorKind::Unknown, "Unexpected response from server.")
            .with_detail(Some(e.to_string()))
    })
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    msg: String,
}

/// `detail` is either a plain string or a list of validation entries carrying `msg`.
fn detail_text(detail: &serde_json::Value) -> Option<String> {
    match detail {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(_) => {
            let items: Vec<ValidationItem> = serde_json::from_value(detail.clone()).ok()?;
            let joined = items
                .into_iter()
                .map(|item| item.msg)
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

/// Map a non-success status and its body to the error taxonomy.
pub fn classify_status(status: u16, body: &[u8]) -> ApiError {
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
    let detail = parsed
        .as_ref()
        .and_then(|b| b.detail.as_ref())
        .and_then(detail_text);
    let backend_message = detail
        .clone()
        .or_else(|| parsed.and_then(|b| b.message))
        .unwrap_or_else(|| format!("Error {status}"));

    let kind = match status {
        401 => ErrorKind::Unauthorized,
        403 => ErrorKind::Forbidden,
        404 => ErrorKind::NotFound,
        422 => ErrorKind::Validation,
        s if s >= 500 => ErrorKind::Server,
        _ => ErrorKind::Unknown,
    };
    let message = kind
        .default_message()
        .map(str::to_owned)
        .unwrap_or(backend_message);

    ApiError::new(kind, message)
        .with_status(status)
        .with_detail(detail)
}

/// Failures where no response arrived are connectivity problems; the rest are unknown.
pub fn classify_transport_error(e: &reqwest::Error) -> ApiError {
    if e.is_builder() {
        return ApiError::new(ErrorKind::Unknown, e.to_string());
    }
    if e.is_decode() {
        return ApiError::new(ErrorKind::Unknown, "Unexpected response from server.")
            .with_detail(Some(e.to_string()));
    }
    ApiError::connectivity().with_detail(Some(e.to_string()))
}
