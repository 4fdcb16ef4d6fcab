//! Usage: Persisted application settings (schema + read/write helpers).
//!
//! `settings.json` holds the access gate's persisted half (`is_setup`) plus the stored
//! credential fields, which no active flow reads today but must survive round trips.

use crate::app_paths;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, RwLock};
use std::time::{Duration, Instant};

pub const SCHEMA_VERSION: u32 = 1;
const SETTINGS_FILE_NAME: &str = "settings.json";
const CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct CachedSettings {
    path: PathBuf,
    data: AppSettings,
    last_updated: Instant,
}

static SETTINGS_CACHE: OnceLock<RwLock<Option<CachedSettings>>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, specta::Type)]
#[serde(default)]
pub struct AppSettings {
    pub schema_version: u32,
    pub is_setup: bool,
    pub passkey: Option<u32>,
    pub is_protected: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            is_setup: false,
            passkey: None,
            is_protected: false,
        }
    }
}

/// Returns `true` if `schema_version` had to be written back.
fn migrate_bump_schema_version(settings: &mut AppSettings, schema_version_present: bool) -> bool {
    if schema_version_present && settings.schema_version >= SCHEMA_VERSION {
        return false;
    }
    settings.schema_version = SCHEMA_VERSION;
    true
}

fn settings_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    Ok(app_paths::app_data_dir(app)?.join(SETTINGS_FILE_NAME))
}

fn parse_settings_json(content: &str) -> AppResult<(AppSettings, bool)> {
    let raw: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("failed to parse settings.json: {e}"))?;
    let schema_version_present = raw.get("schema_version").is_some();
    let settings: AppSettings =
        serde_json::from_value(raw).map_err(|e| format!("failed to parse settings.json: {e}"))?;
    Ok((settings, schema_version_present))
}

fn cached(path: &Path) -> Option<AppSettings> {
    let cache = SETTINGS_CACHE.get_or_init(|| RwLock::new(None));
    let guard = cache.read().ok()?;
    let cached = guard.as_ref()?;
    if cached.path == path && cached.last_updated.elapsed() < CACHE_TTL {
        return Some(cached.data.clone());
    }
    None
}

fn store_cache(path: &Path, settings: &AppSettings) {
    let cache = SETTINGS_CACHE.get_or_init(|| RwLock::new(None));
    if let Ok(mut guard) = cache.write() {
        *guard = Some(CachedSettings {
            path: path.to_path_buf(),
            data: settings.clone(),
            last_updated: Instant::now(),
        });
    }
}

pub fn read<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<AppSettings> {
    read_from(&settings_path(app)?)
}

pub fn write<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    settings: &AppSettings,
) -> AppResult<AppSettings> {
    write_to(&settings_path(app)?, settings)
}

pub(crate) fn read_from(path: &Path) -> AppResult<AppSettings> {
    if let Some(settings) = cached(path) {
        return Ok(settings);
    }

    if !path.exists() {
        let settings = AppSettings::default();
        // Best-effort: create default settings.json on first read so it is discoverable.
        if let Err(err) = write_to(path, &settings) {
            tracing::warn!("failed to create default settings.json: {}", err);
        }
        store_cache(path, &settings);
        return Ok(settings);
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read settings: {e}"))?;
    let (mut settings, schema_version_present) = parse_settings_json(&content)?;

    if migrate_bump_schema_version(&mut settings, schema_version_present) {
        let _ = write_to(path, &settings);
    }

    store_cache(path, &settings);
    Ok(settings)
}

pub(crate) fn write_to(path: &Path, settings: &AppSettings) -> AppResult<AppSettings> {
    let tmp_path = path.with_file_name("settings.json.tmp");
    let backup_path = path.with_file_name("settings.json.bak");

    let content = serde_json::to_vec_pretty(settings)
        .map_err(|e| format!("failed to serialize settings: {e}"))?;

    std::fs::write(&tmp_path, content)
        .map_err(|e| format!("failed to write temp settings file: {e}"))?;

    if backup_path.exists() {
        let _ = std::fs::remove_file(&backup_path);
    }

    if path.exists() {
        std::fs::rename(path, &backup_path)
            .map_err(|e| format!("failed to create settings backup: {e}"))?;
    }

    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::rename(&backup_path, path);
        return Err(format!("failed to finalize settings: {e}").into());
    }

    if backup_path.exists() {
        let _ = std::fs::remove_file(&backup_path);
    }

    store_cache(path, settings);
    Ok(settings.clone())
}
