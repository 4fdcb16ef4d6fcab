//! Usage: Off-thread execution for the SQLite and list-state work behind server commands.
//!
//! Every store call holds the server list lock for its duration, so a slow call stalls the
//! whole list; those are logged with the command label.

use crate::shared::error::{AppError, AppResult};
use std::time::{Duration, Instant};

const SLOW_TASK_THRESHOLD: Duration = Duration::from_millis(500);

pub async fn run<T, E>(
    label: &'static str,
    f: impl FnOnce() -> Result<T, E> + Send + 'static,
) -> AppResult<T>
where
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    let started = Instant::now();
    let joined = tauri::async_runtime::spawn_blocking(f).await;

    let elapsed = started.elapsed();
    if elapsed >= SLOW_TASK_THRESHOLD {
        tracing::warn!(label, elapsed_ms = elapsed.as_millis() as u64, "slow blocking task");
    }

    match joined {
        Ok(result) => result.map_err(Into::into),
        Err(err) => Err(join_failure(label, &err)),
    }
}

/// Panic text stays out of the error: it can echo profile fields, master keys included.
fn join_failure(label: &'static str, err: &tauri::Error) -> AppError {
    let outcome = match err {
        tauri::Error::JoinError(join_err) if join_err.is_panic() => "panicked",
        tauri::Error::JoinError(_) => "cancelled",
        _ => "failed",
    };
    tracing::error!(label, outcome, "blocking task did not complete");
    AppError::new("TASK_JOIN", format!("{label}: task {outcome}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn coded_error_from_task_keeps_its_code() {
        let err = run("servers_list", || {
            Err::<(), String>("DB_ERROR: database is locked".to_string())
        })
        .await
        .expect_err("task error");
        assert_eq!(err.code(), "DB_ERROR");
        assert_eq!(err.message(), "database is locked");
    }

    #[tokio::test]
    async fn panic_is_reported_without_its_payload() {
        let err = run("server_create", || -> Result<(), AppError> {
            panic!("master_key=mk-secret-456");
        })
        .await
        .expect_err("panicked");
        assert_eq!(err.code(), "TASK_JOIN");
        assert_eq!(err.message(), "server_create: task panicked");
        assert!(!err.to_string().contains("mk-secret"));
    }
}
