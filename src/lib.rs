mod app;
mod commands;
mod domain;
mod infra;
mod shared;
pub mod test_support;

pub(crate) use app::{app_state, notice};
pub(crate) use domain::{access, server_list, servers, transfers};
pub(crate) use infra::{app_paths, db, parse_client, settings};
pub(crate) use shared::blocking;

use app_state::{ensure_db_ready, AccessState, DbInitState, ServerListState};
use tauri::Manager;
use transfers::TransferRegistry;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let app = tauri::Builder::default()
        .manage(DbInitState::default())
        .manage(AccessState::default())
        .manage(ServerListState::default())
        .manage(TransferRegistry::default())
        .setup(|app| {
            crate::app::logging::init(app.handle());

            // Payload is not logged: panics can carry profile fields, master keys included.
            std::panic::set_hook(Box::new(|panic_info| {
                let location = panic_info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::error!(location = %location, "PANIC: application panicked at {location}");
            }));

            #[cfg(debug_assertions)]
            {
                if let Ok(dotdir_name) = std::env::var("PARSE_DASHBOARD_DOTDIR_NAME") {
                    tracing::info!(dotdir_name = %dotdir_name, "[dev] PARSE_DASHBOARD_DOTDIR_NAME");
                }
                if let Ok(dir) = app_paths::app_data_dir(app.handle()) {
                    tracing::info!(dir = %dir.display(), "[dev] app data dir");
                }
            }

            // Access state must be settled before the first `servers_list`.
            let access_state = app.state::<AccessState>();
            match settings::read(app.handle()) {
                Ok(cfg) => access_state.load(&cfg),
                Err(err) => {
                    tracing::error!("failed to read settings, keeping saved servers locked: {}", err);
                    access_state.load_fail_closed();
                }
            }
            let gate = access_state.snapshot();
            tracing::info!(phase = ?gate.phase(), "access gate loaded");

            crate::app::cleanup::sweep_stale_artifacts(app.handle());

            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let db_state = app_handle.state::<DbInitState>();
                if let Err(err) = ensure_db_ready(app_handle.clone(), db_state.inner()).await {
                    tracing::error!("database initialization failed: {}", err);
                }
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::servers::servers_list,
            commands::servers::server_create,
            commands::servers::server_update,
            commands::servers::server_set_icon,
            commands::servers::server_duplicate,
            commands::servers::server_delete,
            commands::servers::server_select,
            commands::servers::server_actions,
            commands::files::file_download,
            commands::files::file_upload,
            commands::files::transfer_cancel,
            commands::access::access_status,
            commands::access::access_lock,
            commands::access::access_destroy,
            commands::settings::settings_get,
            commands::app::notice_send
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| {
        if let tauri::RunEvent::Exit = event {
            tracing::info!("exit requested, running cleanup");
            crate::app::cleanup::cleanup_before_exit(app_handle);
        }
    });
}

/// Specta type export configuration.
///
/// Uses `tauri_specta::Builder` to export TypeScript bindings for the subset of
/// Tauri commands annotated with `#[specta::specta]`.
///
/// Run `cargo test export_bindings -- --ignored` to regenerate `dist/bindings.ts`.
#[cfg(test)]
#[test]
#[ignore = "run manually: cargo test export_bindings -- --ignored"]
fn export_bindings() {
    let builder =
        tauri_specta::Builder::<tauri::Wry>::new().commands(tauri_specta::collect_commands![
            commands::settings::settings_get,
            commands::access::access_status,
            commands::access::access_lock,
            commands::access::access_destroy
        ]);

    builder
        .export(specta_typescript::Typescript::default(), "dist/bindings.ts")
        .expect("failed to export specta TypeScript bindings");
}
