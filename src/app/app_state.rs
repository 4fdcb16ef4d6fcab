//! Usage: Shared Tauri state types and DB initialization gate used by `commands/*`.

use crate::access::AccessGate;
use crate::server_list::{self, ListChange, ServerAction, ServerList};
use crate::servers::{ServerConfig, ServerContext};
use crate::settings::AppSettings;
use crate::shared::error::{AppError, AppResult};
use crate::shared::mutex_ext::MutexExt;
use crate::{blocking, db};
use std::sync::Mutex;
use tokio::sync::OnceCell;

#[derive(Default)]
pub(crate) struct DbInitState(pub(crate) OnceCell<AppResult<db::Db>>);

pub(crate) async fn ensure_db_ready<R: tauri::Runtime>(
    app: tauri::AppHandle<R>,
    state: &DbInitState,
) -> AppResult<db::Db> {
    state
        .0
        .get_or_init(|| async move { blocking::run("db_init", move || db::init(&app)).await })
        .await
        .clone()
}

#[derive(Default)]
pub(crate) struct AccessState(pub(crate) Mutex<AccessGate>);

impl AccessState {
    pub(crate) fn load(&self, settings: &AppSettings) {
        *self.0.lock_or_recover() = AccessGate::from_settings(settings);
    }

    /// Used when `settings.json` cannot be read: treat protection as configured.
    pub(crate) fn load_fail_closed(&self) {
        self.load(&AppSettings {
            is_setup: true,
            ..AppSettings::default()
        });
    }

    pub(crate) fn snapshot(&self) -> AccessGate {
        *self.0.lock_or_recover()
    }
}

/// The presented server list.
///
/// Store calls run while the list lock is held, so a load snapshot and the mutations around it
/// are applied in the order they hit the database. Call these from a blocking task.
#[derive(Default)]
pub(crate) struct ServerListState(pub(crate) Mutex<ServerList>);

impl ServerListState {
    pub(crate) fn refresh(
        &self,
        fetch: impl FnOnce() -> AppResult<Vec<ServerConfig>>,
    ) -> (Option<ListChange>, Option<AppError>) {
        let mut list = self.0.lock_or_recover();
        let result = fetch();
        list.reload(result)
    }

    /// A failed write leaves the list as it was.
    pub(crate) fn mutate(
        &self,
        write: impl FnOnce() -> AppResult<ServerConfig>,
        reconcile: impl FnOnce(&mut ServerList, ServerConfig) -> Option<ListChange>,
    ) -> AppResult<(ServerConfig, Option<ListChange>)> {
        let mut list = self.0.lock_or_recover();
        let server = write()?;
        let change = reconcile(&mut list, server.clone());
        Ok((server, change))
    }

    pub(crate) fn remove(
        &self,
        server_id: i64,
        confirmed: bool,
        delete: impl FnOnce() -> AppResult<()>,
    ) -> AppResult<Option<ListChange>> {
        server_list::ensure_confirmed(ServerAction::Delete, confirmed)?;
        let mut list = self.0.lock_or_recover();
        delete()?;
        Ok(list.removed(server_id))
    }

    pub(crate) fn select(&self, server_id: i64) -> AppResult<ServerContext> {
        self.0.lock_or_recover().select(server_id)
    }

    pub(crate) fn servers(&self) -> Vec<ServerConfig> {
        self.0.lock_or_recover().servers().to_vec()
    }
}
