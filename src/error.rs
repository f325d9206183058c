//! Unified client error model and user-facing notice mapping.
//! Every failure in the session/request path is one `AppError`; views turn it into a
//! `Notice` with `AppError::notice()` and never let it unwind the view tree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields.iter().map(|f| f.field.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// Caught before any network call; reported inline per field.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    /// Any login failure. Wrong password and unreachable server look the same.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    /// 401 on a request that was already retried after a refresh.
    #[error("unauthorized")]
    Unauthorized,
    /// Refresh failed; the session has been cleared.
    #[error("session expired")]
    SessionExpired,
    #[error("corrupted session data: {0}")]
    CorruptedSession(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

impl AppError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Network(_) => "network",
            AppError::Timeout => "timeout",
            AppError::Http { .. } => "http",
            AppError::Unauthorized => "unauthorized",
            AppError::SessionExpired => "session_expired",
            AppError::CorruptedSession(_) => "corrupted_session",
            AppError::Storage(_) => "storage",
            AppError::Decode(_) => "decode",
            AppError::UnknownRole(_) => "unknown_role",
        }
    }

    /// True when the only sane reaction is to drop the session and show the login route.
    pub fn forces_logout(&self) -> bool {
        matches!(self, AppError::SessionExpired)
    }

    /// Transient failures of a data-fetch screen. Never retried automatically.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Timeout | AppError::Http { .. })
    }

    /// Map to what the user is shown.
    pub fn notice(&self) -> Notice {
        match self {
            AppError::Validation(fields) => Notice {
                kind: NoticeKind::Inline,
                message: "All fields are required".to_string(),
                fields: fields.clone(),
            },
            AppError::InvalidCredentials => Notice::toast("Invalid credentials. Check your details and try again."),
            AppError::Network(_) | AppError::Timeout | AppError::Http { .. } | AppError::Decode(_) => Notice {
                kind: NoticeKind::Screen,
                message: "Could not load data. Please try again later.".to_string(),
                fields: Vec::new(),
            },
            AppError::Unauthorized | AppError::SessionExpired => Notice::toast("Your session has expired. Please sign in again."),
            AppError::CorruptedSession(_) => Notice::silent(),
            AppError::Storage(_) => Notice::toast("Local storage is unavailable."),
            AppError::UnknownRole(_) => Notice::toast("Unrecognized user type."),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else if err.is_decode() {
            AppError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            AppError::Http { status: status.as_u16(), message: err.to_string() }
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self { AppError::Decode(err.to_string()) }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self { AppError::Storage(err.to_string()) }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Next to the offending form field.
    Inline,
    /// Transient popup.
    Toast,
    /// Replaces the screen body.
    Screen,
    /// Not shown at all.
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl Notice {
    pub fn toast(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Toast, message: message.into(), fields: Vec::new() }
    }

    pub fn silent() -> Self {
        Self { kind: NoticeKind::Silent, message: String::new(), fields: Vec::new() }
    }
}
