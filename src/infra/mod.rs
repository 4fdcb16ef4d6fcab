pub(crate) mod app_paths;
pub(crate) mod db;
pub(crate) mod parse_client;
pub(crate) mod settings;
