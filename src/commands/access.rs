//! Usage: Access gate Tauri commands.

use crate::access::AccessStatus;
use crate::app_state::AccessState;
use crate::shared::mutex_ext::MutexExt;
use crate::{blocking, settings};

#[tauri::command]
#[specta::specta]
pub(crate) fn access_status(access_state: tauri::State<'_, AccessState>) -> AccessStatus {
    access_state.snapshot().status()
}

#[tauri::command]
#[specta::specta]
pub(crate) fn access_lock(access_state: tauri::State<'_, AccessState>) -> AccessStatus {
    let mut gate = access_state.0.lock_or_recover();
    gate.lock();
    tracing::info!("access locked");
    gate.status()
}

/// Turns protection off and persists it; the stored credential is cleared too.
#[tauri::command]
#[specta::specta]
pub(crate) async fn access_destroy(
    app: tauri::AppHandle,
    access_state: tauri::State<'_, AccessState>,
) -> Result<AccessStatus, String> {
    let current = blocking::run("access_destroy_read_settings", {
        let app = app.clone();
        move || settings::read(&app)
    })
    .await?;

    let next = {
        let mut gate = access_state.0.lock_or_recover();
        gate.destroy(&current)
    };

    blocking::run("access_destroy_write_settings", move || settings::write(&app, &next)).await?;
    tracing::info!("access protection removed");

    Ok(access_state.snapshot().status())
}
