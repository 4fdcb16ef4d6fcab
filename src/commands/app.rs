//! Usage: App-level Tauri commands (notices raised by the frontend).

use crate::notice::{self, NoticeLevel};

fn sanitize_text(input: Option<String>, max_len: usize) -> Option<String> {
    let value = input?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_len).collect())
}

#[tauri::command]
pub(crate) fn notice_send(
    app: tauri::AppHandle,
    level: NoticeLevel,
    title: Option<String>,
    body: String,
) -> Result<bool, String> {
    let title = sanitize_text(title, 80);
    let body = sanitize_text(Some(body), 500).unwrap_or_default();
    notice::emit(&app, notice::build(level, title, body))?;
    Ok(true)
}
