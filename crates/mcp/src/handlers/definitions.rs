#![forbid(unsafe_code)]

use serde_json::{Value, json};

pub(crate) fn tool_definitions() -> Vec<Value> {
    let mut tools = vec![
        json!({
            "name": "memory_resume",
            "description": "Return a rehydration bundle (Now card + pointers) for a session, fit to a token budget.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": { "type": "string" },
                    "token_budget": { "type": "integer", "minimum": 1, "maximum": 1000000 }
                },
                "required": ["session_id"]
            }
        }),
        json!({
            "name": "memory_commit",
            "description": "Persist one state frame: task, decisions, artifacts and facts for a logical step.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": { "type": "string" },
                    "task": { "type": "string" },
                    "decisions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "type": { "type": "string", "enum": ["DECISION", "ASSUMPTION", "FIX", "BLOCKER", "NOTE", "TEST_FAIL", "TEST_PASS"] },
                                "summary": { "type": "string" },
                                "task_id": { "type": "string" },
                                "evidence": { "type": "array", "items": { "type": "string" } }
                            },
                            "required": ["type", "summary"]
                        }
                    },
                    "artifacts": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "kind": { "type": "string", "enum": ["DIFF", "SNIPPET", "CONFIG", "FIXTURE", "TEST_TRACE", "LOG", "OTHER"] },
                                "uri": { "type": "string" },
                                "text": { "type": "string" },
                                "path": { "type": "string" },
                                "startLine": { "type": "integer", "minimum": 1 },
                                "endLine": { "type": "integer", "minimum": 1 },
                                "meta": { "type": "object" }
                            },
                            "required": ["kind"]
                        }
                    },
                    "facts": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "key": { "type": "string" },
                                "value": { "type": "string" },
                                "scope": { "type": "string", "enum": ["repo", "service", "team", "global"] }
                            },
                            "required": ["key", "value"]
                        }
                    }
                },
                "required": ["session_id"]
            }
        }),
        json!({
            "name": "memory_update",
            "description": "Mutate a single task, artifact or fact by id with partial fields.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "target": { "type": "string", "enum": ["task", "artifact", "fact"] },
                    "id": { "type": "string" },
                    "title": { "type": "string" },
                    "status": { "type": "string", "enum": ["todo", "doing", "blocked", "done", "review"] },
                    "accept_criteria": { "type": ["string", "null"] },
                    "parent_id": { "type": ["string", "null"] },
                    "kind": { "type": "string" },
                    "text": { "type": "string" },
                    "uri": { "type": "string" },
                    "meta": { "type": "object" },
                    "value": { "type": "string" },
                    "scope": { "type": "string", "enum": ["repo", "service", "team", "global"] }
                },
                "required": ["target", "id"]
            }
        }),
        json!({
            "name": "memory_fetch",
            "description": "Fetch a record (task, artifact, fact, event or checkpoint) by id.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": { "type": "string" }
                },
                "required": ["id"]
            }
        }),
        json!({
            "name": "memory_span",
            "description": "Read a line span from a workspace file through the path guard.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string" },
                    "startLine": { "type": "integer", "minimum": 1 },
                    "endLine": { "type": "integer", "minimum": 1 }
                },
                "required": ["path", "startLine", "endLine"]
            }
        }),
        json!({
            "name": "memory_search",
            "description": "Literal substring search over events, tasks and facts.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": { "type": "string" },
                    "query": { "type": "string" },
                    "limit": { "type": "integer", "minimum": 1, "maximum": 200 }
                },
                "required": ["session_id", "query"]
            }
        }),
        json!({
            "name": "memory_checkpoint",
            "description": "Record a labeled save point with a snapshot of the session state.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "session_id": { "type": "string" },
                    "label": { "type": "string" }
                },
                "required": ["session_id", "label"]
            }
        }),
    ];
    tools.sort_by_key(|tool| {
        tool.get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    });
    tools
}
