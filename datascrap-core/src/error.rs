use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing category every transport failure is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Server,
    Connectivity,
    Unknown,
}

impl ErrorKind {
    /// Fixed message shown for the category, `None` when the backend text is passed through.
    pub fn default_message(self) -> Option<&'static str> {
        match self {
            ErrorKind::Unauthorized => Some("You are not authorized. Please log in."),
            ErrorKind::Forbidden => Some("You do not have permission to perform this action."),
            ErrorKind::NotFound => Some("The requested resource was not found."),
            ErrorKind::Validation => Some("Validation error. Please check your input."),
            ErrorKind::Server => Some("Server error. Please try again later."),
            ErrorKind::Connectivity => {
                Some("No response from server. Please check your connection.")
            }
            ErrorKind::Unknown => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Unauthorized => "not authorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not found",
            ErrorKind::Validation => "validation error",
            ErrorKind::Server => "server error",
            ErrorKind::Connectivity => "no response",
            ErrorKind::Unknown => "unknown error",
        };
        f.write_str(name)
    }
}

/// Normalized failure returned by every backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            status: None,
        }
    }

    pub fn connectivity() -> Self {
        Self::new(
            ErrorKind::Connectivity,
            ErrorKind::Connectivity.default_message().unwrap_or_default(),
        )
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid URL in {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no platform configuration directory available")]
    NoConfigDir,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity service unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("identity service returned no session")]
    NoSession,
    #[error("invalid identity URL: {0}")]
    Url(#[from] url::ParseError),
}
