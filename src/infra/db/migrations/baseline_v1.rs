use rusqlite::Connection;

pub(super) fn create_baseline_v1(conn: &mut Connection) -> Result<(), String> {
    let tx = conn
        .transaction()
        .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;

    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS server_configs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL DEFAULT '',
  application_id TEXT NOT NULL DEFAULT '',
  master_key TEXT NOT NULL DEFAULT '',
  server_url TEXT NOT NULL,
  icon BLOB,
  created_at INTEGER NOT NULL,
  updated_at INTEGER NOT NULL
);
"#,
    )
    .map_err(|e| format!("failed to create baseline v1 tables: {e}"))?;

    super::set_user_version(&tx, 1)?;

    tx.commit()
        .map_err(|e| format!("failed to commit baseline v1: {e}"))?;

    Ok(())
}
