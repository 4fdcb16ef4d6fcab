//! Usage: SQLite schema migrations (user_version based).

mod baseline_v1;

use rusqlite::Connection;

const LATEST_SCHEMA_VERSION: i64 = 1;

pub(super) fn apply_migrations(conn: &mut Connection) -> Result<(), String> {
    let mut user_version = read_user_version(conn)?;

    if user_version < 0 {
        return Err(format!(
            "unsupported sqlite schema version: user_version={user_version}"
        ));
    }

    if user_version > LATEST_SCHEMA_VERSION {
        return Err(format!(
            "unsupported sqlite schema version: user_version={user_version} (newer than app)"
        ));
    }

    if user_version == 0 {
        baseline_v1::create_baseline_v1(conn)?;
        user_version = read_user_version(conn)?;
    }

    if user_version != LATEST_SCHEMA_VERSION {
        return Err(format!(
            "sqlite migration ended at unexpected version: user_version={user_version}"
        ));
    }

    Ok(())
}

fn read_user_version(conn: &Connection) -> Result<i64, String> {
    conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .map_err(|e| format!("failed to read sqlite user_version: {e}"))
}

fn set_user_version(tx: &rusqlite::Transaction<'_>, version: i64) -> Result<(), String> {
    tx.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| format!("failed to update sqlite user_version: {e}"))
}
