//! Usage: Tauri command handlers (thin wrappers over `domain` + `infra`).

pub(crate) mod access;
pub(crate) mod app;
pub(crate) mod files;
pub(crate) mod servers;
pub(crate) mod settings;
