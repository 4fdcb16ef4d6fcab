//! Usage: Best-effort cleanup hooks for app lifecycle events (startup sweep, exit).

use crate::app_paths;
use crate::transfers::TransferRegistry;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tauri::Manager;

static CLEANUP_STARTED: AtomicBool = AtomicBool::new(false);

pub(crate) fn cleanup_before_exit<R: tauri::Runtime>(app: &tauri::AppHandle<R>) {
    if CLEANUP_STARTED.swap(true, Ordering::SeqCst) {
        return;
    }

    let cancelled = app.state::<TransferRegistry>().cancel_all();
    if cancelled > 0 {
        tracing::info!(cancelled, "exit cleanup: cancelled in-flight transfers");
    }
    sweep_stale_artifacts(app);
}

/// Removes download artifacts left behind by a crash or a forced exit.
pub(crate) fn sweep_stale_artifacts<R: tauri::Runtime>(app: &tauri::AppHandle<R>) {
    match app_paths::transfers_dir(app) {
        Ok(dir) => {
            let removed = sweep_dir(&dir);
            if removed > 0 {
                tracing::info!(removed, "removed stale download artifacts");
            }
        }
        Err(err) => tracing::warn!("failed to resolve transfers dir: {}", err),
    }
}

fn sweep_dir(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), "failed to list transfers dir: {err}");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("download") {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => tracing::warn!(path = %path.display(), "failed to remove artifact: {err}"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_only_touches_download_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("dl-1-1.download"), b"x").expect("seed");
        std::fs::write(dir.path().join("dl-1-2.download"), b"y").expect("seed");
        std::fs::write(dir.path().join("keep.txt"), b"z").expect("seed");

        assert_eq!(sweep_dir(dir.path()), 2);
        assert!(dir.path().join("keep.txt").exists());
        assert_eq!(sweep_dir(dir.path()), 0);
    }
}
