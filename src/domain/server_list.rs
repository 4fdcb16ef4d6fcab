//! Usage: In-memory server list shown to the user, reconciled incrementally after each mutation.

use crate::servers::{ServerConfig, ServerContext};
use crate::shared::error::{AppError, AppResult, ErrorKind};
use serde::Serialize;

/// One reconciliation step for the rendered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListChange {
    Reload { servers: Vec<ServerConfig> },
    Insert { index: usize, server: ServerConfig },
    Update { index: usize, server: ServerConfig },
    Remove { index: usize, server_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerAction {
    Duplicate,
    Edit,
    EditIcon,
    Delete,
}

impl ServerAction {
    pub const ALL: [ServerAction; 4] = [
        ServerAction::Duplicate,
        ServerAction::Edit,
        ServerAction::EditIcon,
        ServerAction::Delete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Duplicate => "Duplicate",
            Self::Edit => "Edit",
            Self::EditIcon => "Edit Icon",
            Self::Delete => "Delete",
        }
    }

    pub fn requires_confirmation(self) -> bool {
        matches!(self, Self::Delete)
    }
}

const CONFIRMATION_TITLE: &str = "Are you sure?";
const CONFIRMATION_MESSAGE: &str = "This cannot be undone";

/// Refuses a destructive action the user has not confirmed; runs before any storage access.
pub fn ensure_confirmed(action: ServerAction, confirmed: bool) -> AppResult<()> {
    if action.requires_confirmation() && !confirmed {
        return Err(AppError::confirmation_required(format!(
            "{}: {CONFIRMATION_TITLE} {CONFIRMATION_MESSAGE}",
            action.label()
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub title: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionDescriptor {
    pub action: ServerAction,
    pub label: &'static str,
    pub confirmation: Option<Confirmation>,
}

/// Per-item action sheet, in display order.
pub fn action_sheet() -> Vec<ActionDescriptor> {
    ServerAction::ALL
        .into_iter()
        .map(|action| ActionDescriptor {
            action,
            label: action.label(),
            confirmation: action.requires_confirmation().then_some(Confirmation {
                title: CONFIRMATION_TITLE,
                message: CONFIRMATION_MESSAGE,
            }),
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct ServerList {
    servers: Vec<ServerConfig>,
}

impl ServerList {
    pub fn servers(&self) -> &[ServerConfig] {
        &self.servers
    }

    fn position(&self, server_id: i64) -> Option<usize> {
        self.servers.iter().position(|s| s.id == server_id)
    }

    /// Replaces the list with a fresh load.
    ///
    /// An access denial empties the list so no saved profile stays on screen. Any other failure
    /// (storage, task join) keeps what was already shown and yields no change. The error is handed
    /// back for the notice.
    pub fn reload(
        &mut self,
        result: AppResult<Vec<ServerConfig>>,
    ) -> (Option<ListChange>, Option<AppError>) {
        match result {
            Ok(servers) => {
                self.servers = servers;
                let change = ListChange::Reload {
                    servers: self.servers.clone(),
                };
                (Some(change), None)
            }
            Err(err) if err.kind() == ErrorKind::AccessDenied => {
                self.servers.clear();
                (Some(ListChange::Reload { servers: Vec::new() }), Some(err))
            }
            Err(err) => (None, Some(err)),
        }
    }

    pub fn inserted(&mut self, server: ServerConfig) -> ListChange {
        self.servers.push(server.clone());
        ListChange::Insert {
            index: self.servers.len() - 1,
            server,
        }
    }

    pub fn updated(&mut self, server: ServerConfig) -> Option<ListChange> {
        let index = self.position(server.id)?;
        self.servers[index] = server.clone();
        Some(ListChange::Update { index, server })
    }

    pub fn removed(&mut self, server_id: i64) -> Option<ListChange> {
        let index = self.position(server_id)?;
        self.servers.remove(index);
        Some(ListChange::Remove { index, server_id })
    }

    pub fn select(&self, server_id: i64) -> AppResult<ServerContext> {
        self.servers
            .iter()
            .find(|s| s.id == server_id)
            .map(ServerConfig::context)
            .ok_or_else(|| AppError::not_found("server not in list"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(id: i64, name: &str) -> ServerConfig {
        ServerConfig {
            id,
            name: name.to_string(),
            application_id: "app".to_string(),
            master_key: "mk".to_string(),
            server_url: "https://api.example.com/parse".to_string(),
            icon: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn loaded(ids: &[i64]) -> ServerList {
        let mut list = ServerList::default();
        list.reload(Ok(ids.iter().map(|id| server(*id, "s")).collect()));
        list
    }

    fn ids(list: &ServerList) -> Vec<i64> {
        list.servers().iter().map(|s| s.id).collect()
    }

    #[test]
    fn access_denied_reload_clears_list() {
        let mut list = loaded(&[1, 2]);
        let (change, err) = list.reload(Err(AppError::access_denied("locked")));
        assert_eq!(change, Some(ListChange::Reload { servers: Vec::new() }));
        assert_eq!(err.map(|e| e.code().to_string()).as_deref(), Some("ACCESS_DENIED"));
        assert!(list.servers().is_empty());
    }

    #[test]
    fn storage_failure_on_reload_keeps_shown_servers() {
        let mut list = loaded(&[1, 2]);
        let (change, err) = list.reload(Err(AppError::db("disk I/O error")));
        assert_eq!(change, None);
        assert_eq!(err.map(|e| e.code().to_string()).as_deref(), Some("DB_ERROR"));
        assert_eq!(ids(&list), vec![1, 2]);
        assert_eq!(list.select(1).expect("still selectable").server_id, 1);
    }

    #[test]
    fn delete_needs_confirmation_other_actions_do_not() {
        let err = ensure_confirmed(ServerAction::Delete, false).expect_err("unconfirmed");
        assert_eq!(err.code(), "CONFIRMATION_REQUIRED");
        assert_eq!(err.message(), "Delete: Are you sure? This cannot be undone");

        ensure_confirmed(ServerAction::Delete, true).expect("confirmed");
        for action in [ServerAction::Duplicate, ServerAction::Edit, ServerAction::EditIcon] {
            ensure_confirmed(action, false).expect("no confirmation needed");
        }
    }

    #[test]
    fn inserted_appends_at_end() {
        let mut list = loaded(&[1, 2]);
        let change = list.inserted(server(3, "new"));
        assert!(matches!(change, ListChange::Insert { index: 2, .. }));
        assert_eq!(list.servers().len(), 3);
    }

    #[test]
    fn updated_replaces_in_place() {
        let mut list = loaded(&[1, 2, 3]);
        let change = list.updated(server(2, "renamed")).expect("present");
        assert!(matches!(change, ListChange::Update { index: 1, .. }));
        assert_eq!(list.servers()[1].name, "renamed");
        assert!(list.updated(server(9, "ghost")).is_none());
    }

    #[test]
    fn removed_reports_former_index() {
        let mut list = loaded(&[1, 2, 3]);
        let change = list.removed(2).expect("present");
        assert_eq!(change, ListChange::Remove { index: 1, server_id: 2 });
        assert_eq!(ids(&list), vec![1, 3]);
        assert!(list.removed(2).is_none());
    }

    #[test]
    fn select_yields_context_for_listed_server() {
        let list = loaded(&[1, 2]);
        let ctx = list.select(2).expect("select");
        assert_eq!(ctx.server_id, 2);
        assert_eq!(ctx.server_url, "https://api.example.com/parse");
        assert_eq!(list.select(7).expect_err("missing").code(), "DB_NOT_FOUND");
    }

    #[test]
    fn only_delete_requires_confirmation() {
        let sheet = action_sheet();
        let labels: Vec<&str> = sheet.iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["Duplicate", "Edit", "Edit Icon", "Delete"]);
        for item in &sheet {
            assert_eq!(item.confirmation.is_some(), item.action == ServerAction::Delete);
        }
    }

    #[test]
    fn list_change_serializes_with_kind_tag() {
        let json = serde_json::to_value(ListChange::Remove {
            index: 0,
            server_id: 5,
        })
        .expect("serialize");
        assert_eq!(json["kind"], "remove");
        assert_eq!(json["server_id"], 5);
    }
}
