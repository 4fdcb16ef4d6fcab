//! Usage: Minimal Parse Server REST client (file creation + object field update).

use crate::servers::ServerContext;
use crate::shared::error::{AppError, AppResult};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const HEADER_APPLICATION_ID: &str = "X-Parse-Application-Id";
const HEADER_MASTER_KEY: &str = "X-Parse-Master-Key";
const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of a single upload; failures are data, not errors, so the UI can show Parse's message.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub body: Option<Value>,
}

impl UploadOutcome {
    fn ok(body: Value) -> Self {
        Self {
            success: true,
            error: None,
            body: Some(body),
        }
    }

    fn failed(error: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            body,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ParseFileRef {
    name: String,
    url: String,
}

#[derive(Debug, Clone)]
pub struct FileUploadRequest {
    pub filename: String,
    pub class_name: String,
    pub key: String,
    pub object_id: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ParseClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
}

impl ParseClient {
    pub fn new(ctx: &ServerContext) -> AppResult<Self> {
        let base_url = reqwest::Url::parse(ctx.server_url.trim()).map_err(|e| {
            AppError::invalid_input(format!("invalid server_url={}: {e}", ctx.server_url))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_APPLICATION_ID, header_value(&ctx.application_id)?);
        headers.insert(HEADER_MASTER_KEY, header_value(&ctx.master_key)?);

        let http = reqwest::Client::builder()
            .user_agent(format!("parse-dashboard/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::network(format!("failed to build http client: {e}")))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<reqwest::Url> {
        let mut url = self.base_url.clone();
        {
            let mut ps = url.path_segments_mut().map_err(|_| {
                AppError::invalid_input(format!("server_url cannot be a base: {}", self.base_url))
            })?;
            ps.pop_if_empty();
            for seg in segments {
                ps.push(seg);
            }
        }
        Ok(url)
    }

    /// Stores `bytes` as a Parse file, then points `class_name/object_id.key` at it.
    pub async fn upload_file(&self, request: FileUploadRequest) -> AppResult<UploadOutcome> {
        let files_url = self.endpoint(&["files", &request.filename])?;
        let resp = self
            .http
            .post(files_url)
            .header(CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
            .timeout(UPLOAD_TIMEOUT)
            .body(request.bytes)
            .send()
            .await
            .map_err(|e| AppError::network(format!("file upload failed: {e}")))?;

        let status = resp.status();
        let body = read_json_body(resp).await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "parse file upload rejected");
            return Ok(UploadOutcome::failed(parse_error_message(&body, status), body));
        }

        let file: ParseFileRef = match body.clone().map(serde_json::from_value) {
            Some(Ok(file)) => file,
            _ => return Ok(UploadOutcome::failed("Upload Failed", body)),
        };

        let object_url = self.endpoint(&["classes", &request.class_name, &request.object_id])?;
        let mut update = serde_json::Map::new();
        update.insert(
            request.key.clone(),
            json!({
                "__type": "File",
                "name": file.name,
                "url": file.url,
            }),
        );
        let resp = self
            .http
            .put(object_url)
            .json(&Value::Object(update))
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::network(format!("object update failed: {e}")))?;

        let status = resp.status();
        let body = read_json_body(resp).await?;
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                class_name = %request.class_name,
                "parse object update rejected"
            );
            return Ok(UploadOutcome::failed(parse_error_message(&body, status), body));
        }

        Ok(UploadOutcome::ok(body.unwrap_or(Value::Null)))
    }
}

fn header_value(raw: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(raw.trim())
        .map_err(|_| AppError::invalid_input("credentials contain characters not allowed in headers"))
}

async fn read_json_body(resp: reqwest::Response) -> AppResult<Option<Value>> {
    let text = resp
        .text()
        .await
        .map_err(|e| AppError::network(format!("failed to read response: {e}")))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str(&text).ok())
}

fn parse_error_message(body: &Option<Value>, status: reqwest::StatusCode) -> String {
    body.as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Upload Failed (http {})", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(url: &str) -> ServerContext {
        ServerContext {
            server_id: 1,
            name: "Prod".to_string(),
            application_id: "app".to_string(),
            master_key: "mk".to_string(),
            server_url: url.to_string(),
        }
    }

    #[test]
    fn endpoint_appends_segments_after_mount_path() {
        let client = ParseClient::new(&ctx("https://example.com/parse/")).expect("client");
        let url = client
            .endpoint(&["classes", "GameScore", "abc123"])
            .expect("url");
        assert_eq!(url.as_str(), "https://example.com/parse/classes/GameScore/abc123");
    }

    #[test]
    fn endpoint_escapes_filenames() {
        let client = ParseClient::new(&ctx("https://example.com/parse")).expect("client");
        let url = client.endpoint(&["files", "my photo.jpg"]).expect("url");
        assert_eq!(url.as_str(), "https://example.com/parse/files/my%20photo.jpg");
    }

    #[test]
    fn invalid_server_url_is_rejected() {
        let err = ParseClient::new(&ctx("not a url")).err().expect("should fail");
        assert_eq!(err.code(), "SEC_INVALID_INPUT");
    }

    #[test]
    fn error_message_prefers_parse_error_field() {
        let body = Some(json!({"code": 101, "error": "Object not found."}));
        assert_eq!(
            parse_error_message(&body, reqwest::StatusCode::NOT_FOUND),
            "Object not found."
        );
        assert_eq!(
            parse_error_message(&None, reqwest::StatusCode::BAD_GATEWAY),
            "Upload Failed (http 502)"
        );
    }
}
