//! Usage: Application layer (Tauri-managed state, logging, notices, lifecycle cleanup).

pub(crate) mod app_state;
pub(crate) mod cleanup;
pub(crate) mod logging;
pub(crate) mod notice;
