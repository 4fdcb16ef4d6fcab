//! Usage: Server profile and server list related Tauri commands.

use crate::app_state::{ensure_db_ready, AccessState, DbInitState, ServerListState};
use crate::blocking;
use crate::notice::{self, NoticeLevel};
use crate::server_list::{self, ListChange, ServerAction};
use crate::servers::{self, ServerConfig, ServerConfigInput, ServerContext};
use crate::shared::bytes_b64;
use crate::shared::error::{AppError, AppResult};
use tauri::{Emitter, Manager};

pub(crate) const SERVERS_CHANGED_EVENT: &str = "servers:changed";

fn emit_change(app: &tauri::AppHandle, change: &ListChange) {
    if let Err(err) = app.emit(SERVERS_CHANGED_EVENT, change) {
        tracing::warn!("failed to emit {SERVERS_CHANGED_EVENT}: {}", err);
    }
}

/// Emits the list change and the success or failure notice for a finished mutation.
fn finish_mutation(
    app: &tauri::AppHandle,
    result: AppResult<(ServerConfig, Option<ListChange>)>,
    success_title: &str,
    failure_title: &str,
) -> Result<ServerConfig, String> {
    match result {
        Ok((server, change)) => {
            if let Some(change) = change {
                emit_change(app, &change);
            }
            notice::emit_best_effort(
                app,
                notice::build(NoticeLevel::Success, Some(success_title.to_string()), server.name.clone()),
            );
            Ok(server)
        }
        Err(err) => {
            notice::emit_best_effort(app, notice::from_error(failure_title, &err));
            Err(err.into())
        }
    }
}

#[tauri::command]
pub(crate) async fn servers_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    access_state: tauri::State<'_, AccessState>,
) -> Result<Vec<ServerConfig>, String> {
    let gate = access_state.snapshot();
    let loaded = match ensure_db_ready(app.clone(), db_state.inner()).await {
        Ok(db) => {
            let handle = app.clone();
            blocking::run("servers_list", move || {
                let list_state = handle.state::<ServerListState>();
                Ok::<_, AppError>(list_state.refresh(|| servers::list(&db, &gate)))
            })
            .await
        }
        Err(err) => Err(err),
    };
    let (change, err) = loaded.unwrap_or_else(|err| (None, Some(err)));

    if let Some(change) = &change {
        emit_change(&app, change);
    }

    if let Some(err) = err {
        tracing::warn!(code = err.code(), list_cleared = change.is_some(), "server list load failed");
        notice::emit_best_effort(&app, notice::from_error("Error", &err));
        return Err(err.into());
    }

    match change {
        Some(ListChange::Reload { servers }) => {
            tracing::info!(count = servers.len(), "server list loaded");
            Ok(servers)
        }
        _ => Ok(Vec::new()),
    }
}

#[tauri::command]
pub(crate) async fn server_create(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    input: ServerConfigInput,
) -> Result<ServerConfig, String> {
    let db = ensure_db_ready(app.clone(), db_state.inner()).await?;
    let handle = app.clone();
    let result = blocking::run("server_create", move || {
        handle.state::<ServerListState>().mutate(
            || servers::create(&db, input),
            |list, server| Some(list.inserted(server)),
        )
    })
    .await;

    if let Ok((ref server, _)) = result {
        tracing::info!(server_id = server.id, server_name = %server.name, "server created");
    }

    finish_mutation(&app, result, "Server Added", "Error")
}

#[tauri::command]
pub(crate) async fn server_update(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    server_id: i64,
    input: ServerConfigInput,
) -> Result<ServerConfig, String> {
    let db = ensure_db_ready(app.clone(), db_state.inner()).await?;
    let handle = app.clone();
    let result = blocking::run("server_update", move || {
        handle.state::<ServerListState>().mutate(
            || servers::update(&db, server_id, input),
            |list, server| list.updated(server),
        )
    })
    .await;

    if let Ok((ref server, _)) = result {
        tracing::info!(server_id = server.id, server_name = %server.name, "server updated");
    }

    finish_mutation(&app, result, "Server Updated", "Error")
}

/// `icon_base64 = None` clears the icon.
#[tauri::command]
pub(crate) async fn server_set_icon(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    server_id: i64,
    icon_base64: Option<String>,
) -> Result<ServerConfig, String> {
    let icon = icon_base64.as_deref().map(bytes_b64::decode).transpose()?;
    let db = ensure_db_ready(app.clone(), db_state.inner()).await?;
    let handle = app.clone();
    let result = blocking::run("server_set_icon", move || {
        handle.state::<ServerListState>().mutate(
            || servers::set_icon(&db, server_id, icon),
            |list, server| list.updated(server),
        )
    })
    .await;

    if let Ok((ref server, _)) = result {
        tracing::info!(
            server_id = server.id,
            icon_bytes = server.icon.as_ref().map(Vec::len).unwrap_or(0),
            "server icon updated"
        );
    }

    finish_mutation(&app, result, "Icon Updated", "Error")
}

#[tauri::command]
pub(crate) async fn server_duplicate(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    server_id: i64,
) -> Result<ServerConfig, String> {
    let db = ensure_db_ready(app.clone(), db_state.inner()).await?;
    let handle = app.clone();
    let result = blocking::run("server_duplicate", move || {
        handle.state::<ServerListState>().mutate(
            || servers::duplicate(&db, server_id),
            |list, server| Some(list.inserted(server)),
        )
    })
    .await;

    if let Ok((ref server, _)) = result {
        tracing::info!(source_id = server_id, server_id = server.id, "server duplicated");
    }

    finish_mutation(&app, result, "Server Duplicated", "Error")
}

#[tauri::command]
pub(crate) async fn server_delete(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    list_state: tauri::State<'_, ServerListState>,
    server_id: i64,
    confirmed: bool,
) -> Result<bool, String> {
    // Checked again under the list lock; this only skips DB init for an unconfirmed request.
    server_list::ensure_confirmed(ServerAction::Delete, confirmed)?;

    let result = match ensure_db_ready(app.clone(), db_state.inner()).await {
        Ok(db) => {
            let handle = app.clone();
            blocking::run("server_delete", move || {
                handle
                    .state::<ServerListState>()
                    .remove(server_id, confirmed, || servers::delete(&db, server_id))
            })
            .await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(change) => {
            tracing::info!(server_id, remaining = list_state.servers().len(), "server deleted");
            if let Some(change) = change {
                emit_change(&app, &change);
            }
            notice::emit_best_effort(
                &app,
                notice::build(NoticeLevel::Success, Some("Server Deleted".to_string()), String::new()),
            );
            Ok(true)
        }
        Err(err) => {
            notice::emit_best_effort(&app, notice::from_error("Error", &err));
            Err(err.into())
        }
    }
}

/// Picks from the presented list only; a locked or unloaded list has nothing to select.
#[tauri::command]
pub(crate) fn server_select(
    list_state: tauri::State<'_, ServerListState>,
    server_id: i64,
) -> Result<ServerContext, String> {
    let ctx = list_state.select(server_id)?;
    tracing::info!(server_id, server_url = %ctx.server_url, "server selected");
    Ok(ctx)
}

#[tauri::command]
pub(crate) fn server_actions() -> Vec<server_list::ActionDescriptor> {
    server_list::action_sheet()
}
