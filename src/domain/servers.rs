//! Usage: Server profile persistence (create/update/duplicate/delete + gated listing).

use crate::access::AccessGate;
use crate::db;
use crate::shared::bytes_b64;
use crate::shared::error::{db_err, AppError, AppResult};
use crate::shared::security::mask_secret;
use crate::shared::time::now_unix_seconds;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

pub(crate) const ACCESS_REQUIRED_MESSAGE: &str = "Authorization required to load saved servers";

const SELECT_COLUMNS: &str =
    "id, name, application_id, master_key, server_url, icon, created_at, updated_at";

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    pub id: i64,
    pub name: String,
    pub application_id: String,
    pub master_key: String,
    pub server_url: String,
    #[serde(rename = "icon_base64", serialize_with = "bytes_b64::serialize_opt")]
    pub icon: Option<Vec<u8>>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("application_id", &self.application_id)
            .field("master_key", &mask_secret(&self.master_key))
            .field("server_url", &self.server_url)
            .field("icon_len", &self.icon.as_ref().map(Vec::len))
            .finish()
    }
}

impl ServerConfig {
    /// Two profiles describe the same server when every text field matches.
    pub fn same_fields(&self, other: &ServerConfig) -> bool {
        self.name == other.name
            && self.application_id == other.application_id
            && self.master_key == other.master_key
            && self.server_url == other.server_url
    }

    pub fn context(&self) -> ServerContext {
        ServerContext {
            server_id: self.id,
            name: self.name.clone(),
            application_id: self.application_id.clone(),
            master_key: self.master_key.clone(),
            server_url: self.server_url.clone(),
        }
    }
}

/// Connection target handed to the schema browser and the transfer commands.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ServerContext {
    pub server_id: i64,
    pub name: String,
    pub application_id: String,
    pub master_key: String,
    pub server_url: String,
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("server_id", &self.server_id)
            .field("name", &self.name)
            .field("application_id", &self.application_id)
            .field("master_key", &mask_secret(&self.master_key))
            .field("server_url", &self.server_url)
            .finish()
    }
}

/// Raw form values as submitted by the add/edit dialog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfigInput {
    pub name: String,
    pub application_id: String,
    pub master_key: String,
    pub server_url: String,
}

/// Form values after trimming and URL validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidServerConfig {
    name: String,
    application_id: String,
    master_key: String,
    server_url: String,
}

impl ServerConfigInput {
    pub(crate) fn validate(self) -> AppResult<ValidServerConfig> {
        Ok(ValidServerConfig {
            name: self.name.trim().to_string(),
            application_id: self.application_id.trim().to_string(),
            master_key: self.master_key.trim().to_string(),
            server_url: normalize_server_url(&self.server_url)?,
        })
    }
}

fn normalize_server_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("server_url is required"));
    }

    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| AppError::invalid_input(format!("invalid server_url={trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::invalid_input(format!(
                "server_url must use http or https (got {other})"
            )))
        }
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(AppError::invalid_input(format!(
            "server_url must include a host: {trimmed}"
        )));
    }

    Ok(trimmed.to_string())
}

fn row_to_server(row: &rusqlite::Row<'_>) -> Result<ServerConfig, rusqlite::Error> {
    Ok(ServerConfig {
        id: row.get("id")?,
        name: row.get("name")?,
        application_id: row.get("application_id")?,
        master_key: row.get("master_key")?,
        server_url: row.get("server_url")?,
        icon: row.get("icon")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn get_by_id(conn: &Connection, server_id: i64) -> AppResult<ServerConfig> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM server_configs WHERE id = ?1"),
        params![server_id],
        row_to_server,
    )
    .optional()
    .map_err(|e| db_err!("failed to query server: {e}"))?
    .ok_or_else(|| AppError::not_found("server not found"))
}

pub fn get(db: &db::Db, server_id: i64) -> AppResult<ServerConfig> {
    let conn = db.open_connection()?;
    get_by_id(&conn, server_id)
}

/// Every stored profile in fetch order; refused while the access gate is closed.
pub fn list(db: &db::Db, gate: &AccessGate) -> AppResult<Vec<ServerConfig>> {
    if !gate.access_enabled() {
        return Err(AppError::access_denied(ACCESS_REQUIRED_MESSAGE));
    }

    let conn = db.open_connection()?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM server_configs ORDER BY id ASC"
        ))
        .map_err(|e| db_err!("failed to prepare server list: {e}"))?;
    let rows = stmt
        .query_map([], row_to_server)
        .map_err(|e| db_err!("failed to query server list: {e}"))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row.map_err(|e| db_err!("failed to read server row: {e}"))?);
    }
    Ok(items)
}

fn insert(conn: &Connection, fields: &ValidServerConfig) -> AppResult<ServerConfig> {
    let now = now_unix_seconds();
    conn.execute(
        r#"
INSERT INTO server_configs(name, application_id, master_key, server_url, icon, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)
"#,
        params![
            fields.name,
            fields.application_id,
            fields.master_key,
            fields.server_url,
            now
        ],
    )
    .map_err(|e| db_err!("failed to insert server: {e}"))?;

    get_by_id(conn, conn.last_insert_rowid())
}

pub fn create(db: &db::Db, input: ServerConfigInput) -> AppResult<ServerConfig> {
    let fields = input.validate()?;
    let conn = db.open_connection()?;
    insert(&conn, &fields)
}

/// Replaces the four text fields; the icon is left as is.
pub fn update(db: &db::Db, server_id: i64, input: ServerConfigInput) -> AppResult<ServerConfig> {
    let fields = input.validate()?;
    let conn = db.open_connection()?;
    let changed = conn
        .execute(
            r#"
UPDATE server_configs
SET name = ?1, application_id = ?2, master_key = ?3, server_url = ?4, updated_at = ?5
WHERE id = ?6
"#,
            params![
                fields.name,
                fields.application_id,
                fields.master_key,
                fields.server_url,
                now_unix_seconds(),
                server_id
            ],
        )
        .map_err(|e| db_err!("failed to update server: {e}"))?;

    if changed == 0 {
        return Err(AppError::not_found("server not found"));
    }

    get_by_id(&conn, server_id)
}

/// `None` (or an empty payload) clears the icon.
pub fn set_icon(db: &db::Db, server_id: i64, icon: Option<Vec<u8>>) -> AppResult<ServerConfig> {
    let icon = icon.filter(|bytes| !bytes.is_empty());
    let conn = db.open_connection()?;
    let changed = conn
        .execute(
            "UPDATE server_configs SET icon = ?1, updated_at = ?2 WHERE id = ?3",
            params![icon, now_unix_seconds(), server_id],
        )
        .map_err(|e| db_err!("failed to update server icon: {e}"))?;

    if changed == 0 {
        return Err(AppError::not_found("server not found"));
    }

    get_by_id(&conn, server_id)
}

/// Copies the text fields of `server_id` into a new record. The icon stays with the source.
pub fn duplicate(db: &db::Db, server_id: i64) -> AppResult<ServerConfig> {
    let conn = db.open_connection()?;
    let source = get_by_id(&conn, server_id)?;
    insert(
        &conn,
        &ValidServerConfig {
            name: source.name,
            application_id: source.application_id,
            master_key: source.master_key,
            server_url: source.server_url,
        },
    )
}

pub fn delete(db: &db::Db, server_id: i64) -> AppResult<()> {
    let conn = db.open_connection()?;
    let changed = conn
        .execute("DELETE FROM server_configs WHERE id = ?1", params![server_id])
        .map_err(|e| db_err!("failed to delete server: {e}"))?;

    if changed == 0 {
        return Err(AppError::not_found("server not found"));
    }

    Ok(())
}

#[cfg(test)]
mod tests;
