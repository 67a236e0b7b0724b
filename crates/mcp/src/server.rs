#![forbid(unsafe_code)]

use crate::handlers;
use crate::support::ai::ai_error;
use crate::support::resources;
use crate::support::session::{SessionResolver, raw_suffix_is_alias};
use rwm_core::ids::SessionId;
use rwm_core::tokens::{ModelFamily, TokenEstimator};
use rwm_storage::SqliteStore;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

const MCP_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "rwm-mcp";
const SERVER_VERSION: &str = "0.1.0";

#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcRequest {
    #[serde(default)]
    #[serde(rename = "jsonrpc")]
    _jsonrpc: Option<String>,
    pub(crate) method: String,
    #[serde(default)]
    pub(crate) id: Option<Value>,
    #[serde(default)]
    pub(crate) params: Option<Value>,
}

pub(crate) fn json_rpc_response(id: Option<Value>, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub(crate) fn json_rpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

fn tool_text_content(payload: &Value) -> Value {
    json!({
        "type": "text",
        "text": serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string()),
    })
}

pub(crate) struct McpServer {
    initialized: bool,
    pub(crate) store: SqliteStore,
    pub(crate) root: PathBuf,
    pub(crate) resolver: SessionResolver,
    pub(crate) estimator: TokenEstimator,
    pub(crate) bundle_budget: usize,
}

impl McpServer {
    pub(crate) fn new(
        store: SqliteStore,
        root: PathBuf,
        bundle_budget: usize,
        family: ModelFamily,
    ) -> Self {
        Self {
            initialized: false,
            store,
            root,
            resolver: SessionResolver::new(),
            estimator: TokenEstimator::new(family),
            bundle_budget,
        }
    }

    /// Normalize a raw session id and, when the raw value was an alias
    /// (empty or unknown suffix), fold previously persisted alias rows into
    /// the canonical id.
    pub(crate) fn resolve_session(&mut self, raw: &str) -> Result<SessionId, Value> {
        let resolved = self.resolver.normalize(raw, &self.root);
        if raw_suffix_is_alias(raw)
            && let Err(err) = self
                .store
                .canonicalize_sessions(resolved.base(), resolved.as_str())
        {
            return Err(ai_error(err.code(), &err.to_string()));
        }
        Ok(resolved)
    }

    pub(crate) fn handle(&mut self, request: JsonRpcRequest) -> Option<Value> {
        let method = request.method.as_str();

        if method == "initialize" {
            return Some(json_rpc_response(
                request.id,
                json!({
                    "protocolVersion": MCP_VERSION,
                    "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
                    "capabilities": { "tools": {}, "resources": {} }
                }),
            ));
        }

        if !self.initialized && method != "notifications/initialized" {
            return Some(json_rpc_error(request.id, -32002, "Server not initialized"));
        }

        if method == "notifications/initialized" {
            self.initialized = true;
            return None;
        }

        if method == "ping" {
            return Some(json_rpc_response(request.id, json!({})));
        }

        if method == "tools/list" {
            return Some(json_rpc_response(
                request.id,
                json!({ "tools": handlers::tool_definitions() }),
            ));
        }

        if method == "tools/call" {
            let Some(params_obj) = request.params.as_ref().and_then(|v| v.as_object()) else {
                return Some(json_rpc_error(
                    request.id,
                    -32602,
                    "params must be an object",
                ));
            };
            let tool_name = params_obj
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let args = params_obj
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));
            let response_body = handlers::dispatch_memory_tool(self, &tool_name, args)
                .unwrap_or_else(|| {
                    ai_error("INVALID_INPUT", &format!("Unknown tool: {tool_name}"))
                });

            return Some(json_rpc_response(
                request.id,
                json!({
                    "content": [tool_text_content(&response_body)],
                    "isError": !response_body
                        .get("success")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false)
                }),
            ));
        }

        if method == "resources/read" {
            let uri = request
                .params
                .as_ref()
                .and_then(|v| v.get("uri"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            return Some(match resources::read_resource(self, &uri) {
                Ok(contents) => {
                    json_rpc_response(request.id, json!({ "contents": [contents] }))
                }
                Err(message) => json_rpc_error(request.id, -32602, &message),
            });
        }

        Some(json_rpc_error(
            request.id,
            -32601,
            &format!("Method not found: {method}"),
        ))
    }
}
