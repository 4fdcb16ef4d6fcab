//! Usage: Transient user-facing notices (the banner/toast layer).
//!
//! - Frontend: `invoke("notice_send", { level, title?, body })`
//! - Rust: `notice::emit(app, notice::build(...))`; the frontend listens on `notice:notify`.

use crate::shared::error::{AppError, ErrorKind};
use tauri::Emitter;

pub const NOTICE_EVENT_NAME: &str = "notice:notify";

const NOTICE_PREFIX: &str = "Parse Dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NoticeEventPayload {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

fn default_title(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "Info",
        NoticeLevel::Success => "Done",
        NoticeLevel::Warning => "Warning",
        NoticeLevel::Error => "Error",
    }
}

fn normalize_optional_title(title: Option<String>) -> Option<String> {
    let title = title?;
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn format_title(level: NoticeLevel, title: Option<String>) -> String {
    let title = normalize_optional_title(title).unwrap_or_else(|| default_title(level).to_string());
    format!("{NOTICE_PREFIX} · {title}")
}

pub fn build(level: NoticeLevel, title: Option<String>, body: String) -> NoticeEventPayload {
    NoticeEventPayload {
        level,
        title: format_title(level, title),
        body,
    }
}

/// Notice for a failed command; the body is the message without the code prefix.
/// Refusals the user can act on (locked gate, bad form input) are warnings.
pub fn from_error(title: &str, err: &AppError) -> NoticeEventPayload {
    let level = match err.kind() {
        ErrorKind::Cancelled => NoticeLevel::Info,
        ErrorKind::AccessDenied | ErrorKind::InvalidInput => NoticeLevel::Warning,
        ErrorKind::LocalPersistence | ErrorKind::Network | ErrorKind::Other => NoticeLevel::Error,
    };
    build(level, Some(title.to_string()), err.message().to_string())
}

pub fn emit<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    payload: NoticeEventPayload,
) -> Result<(), String> {
    app.emit(NOTICE_EVENT_NAME, payload)
        .map_err(|e| format!("NOTICE_EMIT: {e}"))?;
    Ok(())
}

/// Fire-and-forget variant for command paths where a lost banner must not fail the command.
pub fn emit_best_effort<R: tauri::Runtime>(app: &tauri::AppHandle<R>, payload: NoticeEventPayload) {
    if let Err(err) = emit(app, payload) {
        tracing::warn!("failed to emit notice: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_gets_prefix_and_default() {
        let n = build(NoticeLevel::Success, None, "ok".to_string());
        assert_eq!(n.title, "Parse Dashboard · Done");

        let n = build(NoticeLevel::Info, Some("  Server Added ".to_string()), String::new());
        assert_eq!(n.title, "Parse Dashboard · Server Added");
    }

    #[test]
    fn blank_title_falls_back_to_level_default() {
        let n = build(NoticeLevel::Error, Some("   ".to_string()), "x".to_string());
        assert_eq!(n.title, "Parse Dashboard · Error");
    }

    #[test]
    fn error_notice_uses_message_without_code() {
        let err = AppError::network("Download Error: http status 404");
        let n = from_error("Download Error", &err);
        assert_eq!(n.level, NoticeLevel::Error);
        assert_eq!(n.body, "Download Error: http status 404");
    }

    #[test]
    fn access_denied_is_a_warning() {
        let err = AppError::access_denied("Authorization required to load saved servers");
        let n = from_error("Error", &err);
        assert_eq!(n.level, NoticeLevel::Warning);
        assert_eq!(n.body, "Authorization required to load saved servers");
    }

    #[test]
    fn level_serializes_lowercase() {
        let v = serde_json::to_value(NoticeLevel::Warning).expect("serialize");
        assert_eq!(v, "warning");
    }
}
