//! Usage: File field transfers (progress-reporting download, single-shot upload) as cancellable tasks.
//!
//! A download streams into `<dir>/<transfer-id>.download`, publishes progress on a `watch`
//! channel, then reads the artifact back into memory. The artifact is removed on every exit path,
//! including abort.

use crate::parse_client::{FileUploadRequest, ParseClient, UploadOutcome};
use crate::shared::bytes_b64;
use crate::shared::error::{AppError, AppResult};
use crate::shared::mutex_ext::MutexExt;
use crate::shared::time::now_unix_millis;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinError, JoinHandle};

const ARTIFACT_EXTENSION: &str = "download";
const DOWNLOAD_ERROR: &str = "Download Error";

static TRANSFER_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_transfer_id(prefix: &str) -> String {
    let seq = TRANSFER_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{seq}", now_unix_millis())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferProgress {
    pub transfer_id: String,
    pub bytes_written: u64,
    pub bytes_expected: Option<u64>,
}

impl TransferProgress {
    fn started(transfer_id: &str) -> Self {
        Self {
            transfer_id: transfer_id.to_string(),
            bytes_written: 0,
            bytes_expected: None,
        }
    }

    /// `None` while the total is unknown (no or zero Content-Length).
    pub fn percent(&self) -> Option<u8> {
        let expected = self.bytes_expected.filter(|v| *v > 0)?;
        let pct = self.bytes_written.saturating_mul(100) / expected;
        Some(pct.min(100) as u8)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedFile {
    pub transfer_id: String,
    #[serde(rename = "bytes_base64", serialize_with = "bytes_b64::serialize")]
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl std::fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("transfer_id", &self.transfer_id)
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Removes the on-disk artifact when dropped.
struct Artifact {
    path: PathBuf,
}

impl Drop for Artifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "failed to remove download artifact: {err}")
            }
        }
    }
}

pub fn artifact_path(dir: &Path, transfer_id: &str) -> PathBuf {
    dir.join(format!("{transfer_id}.{ARTIFACT_EXTENSION}"))
}

fn join_error(transfer_id: &str, err: JoinError) -> AppError {
    if err.is_cancelled() {
        tracing::info!(transfer_id = %transfer_id, "transfer cancelled");
        return AppError::transfer_cancelled(format!("transfer {transfer_id} cancelled"));
    }
    tracing::error!(transfer_id = %transfer_id, "transfer task panicked");
    AppError::new("TASK_JOIN", format!("transfer {transfer_id}: task panicked"))
}

pub struct DownloadTask {
    id: String,
    progress: watch::Receiver<TransferProgress>,
    handle: JoinHandle<AppResult<DownloadedFile>>,
}

impl DownloadTask {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn progress(&self) -> watch::Receiver<TransferProgress> {
        self.progress.clone()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    pub async fn join(self) -> AppResult<DownloadedFile> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(join_error(&self.id, err)),
        }
    }
}

/// Plain client for file URLs; Parse serves files without the app headers.
pub fn download_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("parse-dashboard/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::network(format!("failed to build http client: {e}")))
}

pub fn start_download(client: reqwest::Client, url: &str, dir: &Path) -> AppResult<DownloadTask> {
    let url = reqwest::Url::parse(url.trim())
        .map_err(|e| AppError::invalid_input(format!("invalid file url={url}: {e}")))?;

    let id = next_transfer_id("dl");
    let (tx, rx) = watch::channel(TransferProgress::started(&id));
    let path = artifact_path(dir, &id);

    tracing::info!(transfer_id = %id, url = %url, "download started");
    let handle = tokio::spawn(run_download(client, url, path, id.clone(), tx));

    Ok(DownloadTask {
        id,
        progress: rx,
        handle,
    })
}

async fn run_download(
    client: reqwest::Client,
    url: reqwest::Url,
    path: PathBuf,
    transfer_id: String,
    progress: watch::Sender<TransferProgress>,
) -> AppResult<DownloadedFile> {
    let artifact = Artifact { path };

    let result = stream_to_artifact(&client, url, &artifact.path, &transfer_id, &progress).await;
    let bytes = match result {
        Ok(()) => tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| AppError::network(format!("{DOWNLOAD_ERROR}: failed to read artifact: {e}"))),
        Err(err) => Err(err),
    };
    drop(artifact);

    let bytes = match bytes {
        Ok(bytes) if bytes.is_empty() => {
            Err(AppError::network(format!("{DOWNLOAD_ERROR}: empty response")))
        }
        other => other,
    };

    match bytes {
        Ok(bytes) => {
            tracing::info!(transfer_id = %transfer_id, bytes = bytes.len(), "download finished");
            Ok(DownloadedFile {
                transfer_id,
                mime_type: sniff_mime_type(&bytes),
                bytes,
            })
        }
        Err(err) => {
            tracing::warn!(transfer_id = %transfer_id, "download failed: {err}");
            Err(err)
        }
    }
}

async fn stream_to_artifact(
    client: &reqwest::Client,
    url: reqwest::Url,
    path: &Path,
    transfer_id: &str,
    progress: &watch::Sender<TransferProgress>,
) -> AppResult<()> {
    let mut resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::network(format!("{DOWNLOAD_ERROR}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::network(format!(
            "{DOWNLOAD_ERROR}: http status {}",
            status.as_u16()
        )));
    }

    let bytes_expected = resp.content_length();
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| AppError::network(format!("{DOWNLOAD_ERROR}: failed to create artifact: {e}")))?;
    let mut bytes_written: u64 = 0;
    progress.send_replace(TransferProgress {
        transfer_id: transfer_id.to_string(),
        bytes_written,
        bytes_expected,
    });

    loop {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| AppError::network(format!("{DOWNLOAD_ERROR}: write failed: {e}")))?;
                bytes_written = bytes_written.saturating_add(chunk.len() as u64);
                progress.send_replace(TransferProgress {
                    transfer_id: transfer_id.to_string(),
                    bytes_written,
                    bytes_expected,
                });
            }
            Ok(None) => break,
            Err(e) => return Err(AppError::network(format!("{DOWNLOAD_ERROR}: {e}"))),
        }
    }

    file.flush()
        .await
        .map_err(|e| AppError::network(format!("{DOWNLOAD_ERROR}: flush failed: {e}")))?;
    Ok(())
}

pub struct UploadTask {
    id: String,
    handle: JoinHandle<AppResult<UploadOutcome>>,
}

impl UploadTask {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    pub async fn join(self) -> AppResult<UploadOutcome> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) => Err(join_error(&self.id, err)),
        }
    }
}

pub fn start_upload(client: ParseClient, request: FileUploadRequest) -> UploadTask {
    let id = next_transfer_id("ul");
    tracing::info!(
        transfer_id = %id,
        class_name = %request.class_name,
        key = %request.key,
        bytes = request.bytes.len(),
        "upload started"
    );

    let task_id = id.clone();
    let handle = tokio::spawn(async move {
        let outcome = client.upload_file(request).await;
        match &outcome {
            Ok(o) if o.success => tracing::info!(transfer_id = %task_id, "upload finished"),
            Ok(o) => tracing::warn!(
                transfer_id = %task_id,
                error = o.error.as_deref().unwrap_or(""),
                "upload rejected"
            ),
            Err(err) => tracing::warn!(transfer_id = %task_id, "upload failed: {err}"),
        }
        outcome
    });

    UploadTask { id, handle }
}

/// Abort handles of in-flight transfers, keyed by transfer id.
#[derive(Default)]
pub struct TransferRegistry {
    inflight: Mutex<HashMap<String, AbortHandle>>,
}

impl TransferRegistry {
    pub fn register(&self, transfer_id: &str, handle: AbortHandle) {
        self.inflight
            .lock_or_recover()
            .insert(transfer_id.to_string(), handle);
    }

    pub fn finish(&self, transfer_id: &str) {
        self.inflight.lock_or_recover().remove(transfer_id);
    }

    /// Returns `false` when the transfer already finished or never existed.
    pub fn cancel(&self, transfer_id: &str) -> bool {
        match self.inflight.lock_or_recover().remove(transfer_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let drained: Vec<AbortHandle> = self
            .inflight
            .lock_or_recover()
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in &drained {
            handle.abort();
        }
        drained.len()
    }

    pub fn len(&self) -> usize {
        self.inflight.lock_or_recover().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
