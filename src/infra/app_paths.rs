//! Usage: Resolve the app data directory.
//!
//! Desktop builds use `~/.parse-dashboard` (renamable through `PARSE_DASHBOARD_DOTDIR_NAME`).
//! iOS and Android only allow writes inside the app sandbox, so mobile builds use the
//! platform app data directory as is.

use crate::shared::error::AppResult;
use std::path::{Path, PathBuf};
use tauri::Manager;

pub const APP_DOTDIR_NAME: &str = ".parse-dashboard";
const APP_DOTDIR_NAME_ENV: &str = "PARSE_DASHBOARD_DOTDIR_NAME";

fn is_safe_dotdir_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if !name.starts_with('.') {
        return false;
    }
    if name.contains('/') || name.contains('\\') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

fn resolve_dotdir_name(raw: Option<String>) -> String {
    raw.map(|v| v.trim().to_string())
        .filter(|v| is_safe_dotdir_name(v))
        .unwrap_or_else(|| APP_DOTDIR_NAME.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DataRoot {
    #[cfg_attr(mobile, allow(dead_code))]
    Home(PathBuf),
    #[cfg_attr(desktop, allow(dead_code))]
    Sandbox(PathBuf),
}

fn data_dir_in(root: DataRoot, dotdir_override: Option<String>) -> PathBuf {
    match root {
        DataRoot::Home(home) => home.join(resolve_dotdir_name(dotdir_override)),
        DataRoot::Sandbox(dir) => dir,
    }
}

#[cfg(desktop)]
fn data_root<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<DataRoot> {
    let home_dir = app
        .path()
        .home_dir()
        .map_err(|e| format!("failed to resolve home dir: {e}"))?;
    Ok(DataRoot::Home(home_dir))
}

#[cfg(mobile)]
fn data_root<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<DataRoot> {
    let dir = app
        .path()
        .app_data_dir()
        .map_err(|e| format!("failed to resolve app data dir: {e}"))?;
    Ok(DataRoot::Sandbox(dir))
}

pub fn app_data_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    let dir = data_dir_in(data_root(app)?, std::env::var(APP_DOTDIR_NAME_ENV).ok());
    std::fs::create_dir_all(&dir).map_err(|e| format!("failed to create app dir: {e}"))?;

    Ok(dir)
}

/// Scratch directory for in-flight download artifacts.
pub fn transfers_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    ensure_subdir(&app_data_dir(app)?, "transfers")
}

pub fn logs_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    ensure_subdir(&app_data_dir(app)?, "logs")
}

fn ensure_subdir(base: &Path, name: &str) -> AppResult<PathBuf> {
    let dir = base.join(name);
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("failed to create {name} dir: {e}"))?;
    Ok(dir)
}
