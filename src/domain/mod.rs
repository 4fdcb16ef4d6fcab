//! Usage: Domain modules (server profiles, the presented list, access gate, file transfers).

pub(crate) mod access;
pub(crate) mod server_list;
pub(crate) mod servers;
pub(crate) mod transfers;
