#![forbid(unsafe_code)]

use crate::server::McpServer;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rwm_core::paths::safe_join;
use serde_json::{Value, json};

pub(crate) const ARTIFACT_SCHEME: &str = "artifact://sha256/";
pub(crate) const WORKSPACE_SCHEME: &str = "workspace://";

/// Maximum replacement characters tolerated before a body is treated as
/// binary and returned base64-encoded.
const MAX_REPLACEMENT_CHARS: usize = 5;

pub(crate) fn read_resource(server: &McpServer, uri: &str) -> Result<Value, String> {
    if let Some(hash) = uri.strip_prefix(ARTIFACT_SCHEME) {
        let bytes = server
            .store
            .pool()
            .read_body(hash)
            .map_err(|err| err.to_string())?;
        let decoded = String::from_utf8_lossy(&bytes);
        let replacements = decoded.chars().filter(|c| *c == '\u{FFFD}').count();
        if replacements < MAX_REPLACEMENT_CHARS {
            return Ok(json!({
                "uri": uri,
                "mimeType": "text/plain",
                "text": decoded.into_owned(),
            }));
        }
        return Ok(json!({
            "uri": uri,
            "mimeType": "application/octet-stream",
            "blob": STANDARD.encode(&bytes),
        }));
    }

    if let Some(rel) = uri.strip_prefix(WORKSPACE_SCHEME) {
        let path = safe_join(&server.root, rel).map_err(|err| err.to_string())?;
        let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
        return Ok(json!({
            "uri": uri,
            "mimeType": "text/plain",
            "text": text,
        }));
    }

    Err(format!("unsupported resource scheme: {uri}"))
}
