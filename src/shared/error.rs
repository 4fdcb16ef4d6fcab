//! Usage: Unified application error model (maps internal failures to `CODE: message` strings).

use std::sync::Arc;

pub type AppResult<T> = Result<T, AppError>;

pub(crate) const CODE_DB_ERROR: &str = "DB_ERROR";
pub(crate) const CODE_DB_NOT_FOUND: &str = "DB_NOT_FOUND";
pub(crate) const CODE_NETWORK_ERROR: &str = "NETWORK_ERROR";
pub(crate) const CODE_ACCESS_DENIED: &str = "ACCESS_DENIED";
pub(crate) const CODE_INVALID_INPUT: &str = "SEC_INVALID_INPUT";
pub(crate) const CODE_CONFIRMATION_REQUIRED: &str = "CONFIRMATION_REQUIRED";
pub(crate) const CODE_TRANSFER_CANCELLED: &str = "TRANSFER_CANCELLED";
pub(crate) const CODE_INTERNAL: &str = "INTERNAL_ERROR";

/// Coarse grouping of error codes, used to pick the notice shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LocalPersistence,
    Network,
    AccessDenied,
    InvalidInput,
    Cancelled,
    Other,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    code: String,
    message: String,
    #[source]
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code.as_str() {
            CODE_DB_ERROR | CODE_DB_NOT_FOUND => ErrorKind::LocalPersistence,
            CODE_NETWORK_ERROR => ErrorKind::Network,
            CODE_ACCESS_DENIED => ErrorKind::AccessDenied,
            CODE_INVALID_INPUT | CODE_CONFIRMATION_REQUIRED => ErrorKind::InvalidInput,
            CODE_TRANSFER_CANCELLED => ErrorKind::Cancelled,
            _ => ErrorKind::Other,
        }
    }

    pub fn db(message: impl Into<String>) -> Self {
        Self::new(CODE_DB_ERROR, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(CODE_DB_NOT_FOUND, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CODE_NETWORK_ERROR, message)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(CODE_ACCESS_DENIED, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(CODE_INVALID_INPUT, message)
    }

    pub fn confirmation_required(message: impl Into<String>) -> Self {
        Self::new(CODE_CONFIRMATION_REQUIRED, message)
    }

    pub fn transfer_cancelled(message: impl Into<String>) -> Self {
        Self::new(CODE_TRANSFER_CANCELLED, message)
    }
}

/// `db_err!("failed to ...: {e}")` builds a `DB_ERROR` with `format!` semantics.
macro_rules! db_err {
    ($($arg:tt)*) => {
        $crate::shared::error::AppError::db(format!($($arg)*))
    };
}
pub(crate) use db_err;

fn split_code_message(raw: &str) -> Option<(&str, &str)> {
    let msg = raw.trim();
    let msg = msg.strip_prefix("Error:").unwrap_or(msg).trim();
    if msg.is_empty() {
        return None;
    }

    let (maybe_code, rest) = msg.split_once(':')?;
    let code = maybe_code.trim();
    if code.is_empty() {
        return None;
    }
    let mut chars = code.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    if !chars.all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_') {
        return None;
    }
    Some((code, rest.trim()))
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        if let Some((code, rest)) = split_code_message(&value) {
            let message = if rest.is_empty() { value.trim() } else { rest };
            return AppError::new(code.to_string(), message.to_string());
        }
        AppError::new(CODE_INTERNAL, value)
    }
}

impl From<&'static str> for AppError {
    fn from(value: &'static str) -> Self {
        AppError::from(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        AppError::db(value.to_string()).with_source(value)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        AppError::network(value.to_string()).with_source(value)
    }
}

impl From<AppError> for String {
    fn from(value: AppError) -> Self {
        value.to_string()
    }
}
