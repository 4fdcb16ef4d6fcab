//! Usage: serde helpers that put binary payloads (icons, downloaded files) on the wire as base64.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serializer;

pub(crate) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(bytes))
}

pub(crate) fn serialize_opt<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serializer.serialize_some(&BASE64.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn decode(input: &str) -> Result<Vec<u8>, String> {
    BASE64
        .decode(input.trim())
        .map_err(|e| format!("SEC_INVALID_INPUT: invalid base64 payload: {e}"))
}
