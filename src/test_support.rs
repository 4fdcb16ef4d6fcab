//! Usage: Public test helpers for integration tests.

use crate::app_state::ServerListState;
use crate::shared::error::AppResult;
use std::path::PathBuf;
use tauri::Manager;

fn serialize_json(value: impl serde::Serialize) -> AppResult<serde_json::Value> {
    Ok(serde_json::to_value(value)
        .map_err(|e| format!("INTERNAL_ERROR: failed to serialize json: {e}"))?)
}

fn server_input(input: serde_json::Value) -> AppResult<crate::servers::ServerConfigInput> {
    Ok(serde_json::from_value(input)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid server input json: {e}"))?)
}

/// Gate as the app would build it at startup from `settings.json`.
fn startup_gate<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<crate::access::AccessGate> {
    let settings = crate::settings::read(app)?;
    Ok(crate::access::AccessGate::from_settings(&settings))
}

/// The presented list, managed on first use the way `run()` manages it at startup.
fn list_state<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> tauri::State<'_, ServerListState> {
    if app.try_state::<ServerListState>().is_none() {
        app.manage(ServerListState::default());
    }
    app.state::<ServerListState>()
}

pub fn app_data_dir<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    crate::app_paths::app_data_dir(app)
}

pub fn db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<PathBuf> {
    crate::db::db_path(app)
}

pub fn init_db<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> AppResult<()> {
    crate::db::init(app).map(|_| ())
}

/// Mirrors `servers_list`: loads through the gate into the presented list.
pub fn servers_list_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> AppResult<serde_json::Value> {
    let gate = startup_gate(app)?;
    let (_, err) = match crate::db::init(app) {
        Ok(db) => list_state(app).refresh(|| crate::servers::list(&db, &gate)),
        Err(err) => (None, Some(err)),
    };
    if let Some(err) = err {
        return Err(err);
    }
    serialize_json(list_state(app).servers())
}

/// What the presented list currently shows, without reloading it.
pub fn presented_servers_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> AppResult<serde_json::Value> {
    serialize_json(list_state(app).servers())
}

pub fn server_create_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    input: serde_json::Value,
) -> AppResult<serde_json::Value> {
    let db = crate::db::init(app)?;
    let input = server_input(input)?;
    let (server, _) = list_state(app).mutate(
        || crate::servers::create(&db, input),
        |list, server| Some(list.inserted(server)),
    )?;
    serialize_json(server)
}

pub fn server_update_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    server_id: i64,
    input: serde_json::Value,
) -> AppResult<serde_json::Value> {
    let db = crate::db::init(app)?;
    let input = server_input(input)?;
    let (server, _) = list_state(app).mutate(
        || crate::servers::update(&db, server_id, input),
        |list, server| list.updated(server),
    )?;
    serialize_json(server)
}

pub fn server_set_icon_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    server_id: i64,
    icon: Option<Vec<u8>>,
) -> AppResult<serde_json::Value> {
    let db = crate::db::init(app)?;
    let (server, _) = list_state(app).mutate(
        || crate::servers::set_icon(&db, server_id, icon),
        |list, server| list.updated(server),
    )?;
    serialize_json(server)
}

pub fn server_duplicate_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    server_id: i64,
) -> AppResult<serde_json::Value> {
    let db = crate::db::init(app)?;
    let (server, _) = list_state(app).mutate(
        || crate::servers::duplicate(&db, server_id),
        |list, server| Some(list.inserted(server)),
    )?;
    serialize_json(server)
}

pub fn server_delete<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    server_id: i64,
    confirmed: bool,
) -> AppResult<()> {
    let db = crate::db::init(app)?;
    list_state(app)
        .remove(server_id, confirmed, || crate::servers::delete(&db, server_id))
        .map(|_| ())
}

/// Mirrors `server_select`: picks from the presented list as it currently stands.
pub fn server_select_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    server_id: i64,
) -> AppResult<serde_json::Value> {
    serialize_json(list_state(app).select(server_id)?)
}

pub fn access_status_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> AppResult<serde_json::Value> {
    serialize_json(startup_gate(app)?.status())
}

/// Mirrors `access_destroy`: opens the gate and persists the cleared settings.
pub fn access_destroy_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> AppResult<serde_json::Value> {
    let settings = crate::settings::read(app)?;
    let mut gate = crate::access::AccessGate::from_settings(&settings);
    let next = gate.destroy(&settings);
    crate::settings::write(app, &next)?;
    serialize_json(gate.status())
}

pub fn settings_read_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
) -> AppResult<serde_json::Value> {
    serialize_json(crate::settings::read(app)?)
}

pub fn settings_write_json<R: tauri::Runtime>(
    app: &tauri::AppHandle<R>,
    settings: serde_json::Value,
) -> AppResult<serde_json::Value> {
    let settings: crate::settings::AppSettings = serde_json::from_value(settings)
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid settings json: {e}"))?;
    serialize_json(crate::settings::write(app, &settings)?)
}
