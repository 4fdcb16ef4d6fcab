//! Usage: File field download/upload Tauri commands and transfer cancellation.

use crate::app_state::{ensure_db_ready, DbInitState};
use crate::notice::{self, NoticeLevel};
use crate::parse_client::{FileUploadRequest, ParseClient, UploadOutcome};
use crate::shared::bytes_b64;
use crate::shared::error::AppError;
use crate::transfers::{self, DownloadedFile, TransferProgress, TransferRegistry};
use crate::{app_paths, blocking, servers};
use serde::Serialize;
use tauri::Emitter;
use tokio::sync::watch;

pub(crate) const TRANSFER_PROGRESS_EVENT: &str = "transfer:progress";
pub(crate) const TRANSFER_FINISHED_EVENT: &str = "transfer:finished";

#[derive(Debug, Clone, Serialize)]
struct TransferProgressEvent {
    #[serde(flatten)]
    progress: TransferProgress,
    percent: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
struct TransferFinishedEvent<'a> {
    transfer_id: &'a str,
    ok: bool,
    error: Option<String>,
}

fn emit_progress(app: &tauri::AppHandle, progress: TransferProgress) {
    let payload = TransferProgressEvent {
        percent: progress.percent(),
        progress,
    };
    if let Err(err) = app.emit(TRANSFER_PROGRESS_EVENT, payload) {
        tracing::debug!("failed to emit {TRANSFER_PROGRESS_EVENT}: {}", err);
    }
}

fn emit_finished(app: &tauri::AppHandle, transfer_id: &str, error: Option<String>) {
    let payload = TransferFinishedEvent {
        transfer_id,
        ok: error.is_none(),
        error,
    };
    if let Err(err) = app.emit(TRANSFER_FINISHED_EVENT, payload) {
        tracing::warn!("failed to emit {TRANSFER_FINISHED_EVENT}: {}", err);
    }
}

/// Re-emits every progress update until the download task drops its sender.
fn spawn_progress_forwarder(app: tauri::AppHandle, mut rx: watch::Receiver<TransferProgress>) {
    tauri::async_runtime::spawn(async move {
        let initial = rx.borrow_and_update().clone();
        emit_progress(&app, initial);
        while rx.changed().await.is_ok() {
            let progress = rx.borrow_and_update().clone();
            emit_progress(&app, progress);
        }
    });
}

#[tauri::command]
pub(crate) async fn file_download(
    app: tauri::AppHandle,
    registry: tauri::State<'_, TransferRegistry>,
    url: String,
) -> Result<DownloadedFile, String> {
    let dir = app_paths::transfers_dir(&app)?;
    let client = transfers::download_client()?;
    let task = match transfers::start_download(client, &url, &dir) {
        Ok(task) => task,
        Err(err) => {
            notice::emit_best_effort(&app, notice::from_error("Download Error", &err));
            return Err(err.into());
        }
    };

    let transfer_id = task.id().to_string();
    registry.register(&transfer_id, task.abort_handle());
    spawn_progress_forwarder(app.clone(), task.progress());

    let result = task.join().await;
    registry.finish(&transfer_id);

    match result {
        Ok(file) => {
            emit_finished(&app, &transfer_id, None);
            Ok(file)
        }
        Err(err) => {
            emit_finished(&app, &transfer_id, Some(err.to_string()));
            notice::emit_best_effort(&app, notice::from_error("Download Error", &err));
            Err(err.into())
        }
    }
}

#[tauri::command]
#[allow(clippy::too_many_arguments)]
pub(crate) async fn file_upload(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    registry: tauri::State<'_, TransferRegistry>,
    server_id: i64,
    filename: String,
    class_name: String,
    key: String,
    object_id: String,
    bytes_base64: String,
) -> Result<UploadOutcome, String> {
    let bytes = bytes_b64::decode(&bytes_base64)?;
    if bytes.is_empty() {
        return Err(AppError::invalid_input("upload payload is empty").into());
    }

    let db = ensure_db_ready(app.clone(), db_state.inner()).await?;
    let server = blocking::run("file_upload_resolve_server", move || servers::get(&db, server_id)).await?;
    let client = ParseClient::new(&server.context())?;

    notice::emit_best_effort(
        &app,
        notice::build(NoticeLevel::Info, Some("Uploading".to_string()), filename.clone()),
    );

    let task = transfers::start_upload(
        client,
        FileUploadRequest {
            filename,
            class_name,
            key,
            object_id,
            bytes,
        },
    );
    let transfer_id = task.id().to_string();
    registry.register(&transfer_id, task.abort_handle());

    let result = task.join().await;
    registry.finish(&transfer_id);

    match result {
        Ok(outcome) if outcome.success => {
            emit_finished(&app, &transfer_id, None);
            Ok(outcome)
        }
        Ok(outcome) => {
            let message = outcome
                .error
                .clone()
                .unwrap_or_else(|| "Upload Failed".to_string());
            emit_finished(&app, &transfer_id, Some(message.clone()));
            notice::emit_best_effort(
                &app,
                notice::build(NoticeLevel::Error, Some("Upload Failed".to_string()), message),
            );
            Ok(outcome)
        }
        Err(err) => {
            emit_finished(&app, &transfer_id, Some(err.to_string()));
            notice::emit_best_effort(&app, notice::from_error("Upload Failed", &err));
            Err(err.into())
        }
    }
}

#[tauri::command]
pub(crate) fn transfer_cancel(
    registry: tauri::State<'_, TransferRegistry>,
    transfer_id: String,
) -> bool {
    let cancelled = registry.cancel(&transfer_id);
    tracing::info!(transfer_id = %transfer_id, cancelled, "transfer cancel requested");
    cancelled
}
