#![forbid(unsafe_code)]

use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

struct Server {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    root: PathBuf,
    next_id: i64,
}

impl Server {
    fn start(test_name: &str) -> Self {
        let root = temp_dir(test_name);
        Self::start_in(root)
    }

    fn start_in(root: PathBuf) -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_rwm_mcp"))
            .arg("--root")
            .arg(&root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .expect("spawn rwm_mcp");

        let stdin = child.stdin.take().expect("stdin");
        let stdout = BufReader::new(child.stdout.take().expect("stdout"));

        Self {
            child,
            stdin,
            stdout,
            root,
            next_id: 1,
        }
    }

    fn send(&mut self, req: Value) {
        writeln!(self.stdin, "{req}").expect("write request");
        self.stdin.flush().expect("flush request");
    }

    fn recv(&mut self) -> Value {
        let mut line = String::new();
        self.stdout.read_line(&mut line).expect("read response");
        assert!(!line.trim().is_empty(), "empty response line");
        serde_json::from_str(&line).expect("parse response json")
    }

    fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }));
        self.recv()
    }

    fn initialize(&mut self) {
        let init = self.request(
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test", "version": "0" }
            }),
        );
        assert!(init.get("result").is_some(), "initialize must return result");
        self.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized", "params": {} }));
    }

    fn call_tool(&mut self, name: &str, args: Value) -> Value {
        let resp = self.request("tools/call", json!({ "name": name, "arguments": args }));
        extract_tool_envelope(&resp)
    }

    fn call_tool_ok(&mut self, name: &str, args: Value) -> Value {
        let envelope = self.call_tool(name, args);
        assert_eq!(
            envelope["success"],
            Value::Bool(true),
            "tool {name} failed: {envelope}"
        );
        envelope
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("rwm_mcp_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn extract_tool_envelope(resp: &Value) -> Value {
    let text = resp
        .get("result")
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .expect("result.content[0].text");
    serde_json::from_str(text).expect("parse tool envelope json")
}

fn assert_json_rpc_error(resp: &Value, expected_code: i64) {
    let code = resp
        .get("error")
        .and_then(|v| v.get("code"))
        .and_then(|v| v.as_i64())
        .expect("error.code");
    assert_eq!(code, expected_code);
}

const SESSION: &str = "proj@main";

#[test]
fn lifecycle_requires_notifications_initialized() {
    let mut server = Server::start("lifecycle");

    let init = server.request(
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test", "version": "0" }
        }),
    );
    assert!(init.get("result").is_some());

    let before = server.request("tools/list", json!({}));
    assert_json_rpc_error(&before, -32002);

    server.send(json!({ "jsonrpc": "2.0", "method": "notifications/initialized", "params": {} }));

    let after = server.request("tools/list", json!({}));
    let tools = after["result"]["tools"].as_array().expect("tools array");
    let names: Vec<&str> = tools
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "memory_checkpoint",
            "memory_commit",
            "memory_fetch",
            "memory_resume",
            "memory_search",
            "memory_span",
            "memory_update",
        ]
    );

    let pong = server.request("ping", json!({}));
    assert!(pong.get("result").is_some());

    let unknown = server.request("no/such/method", json!({}));
    assert_json_rpc_error(&unknown, -32601);
}

#[test]
fn unknown_tool_and_bad_input_are_flagged_errors() {
    let mut server = Server::start("bad_input");
    server.initialize();

    let resp = server.request(
        "tools/call",
        json!({ "name": "memory_nope", "arguments": {} }),
    );
    assert_eq!(resp["result"]["isError"], Value::Bool(true));

    let envelope = server.call_tool("memory_commit", json!({}));
    assert_eq!(envelope["success"], Value::Bool(false));
    assert_eq!(envelope["error"]["code"], "INVALID_INPUT");

    let envelope = server.call_tool(
        "memory_commit",
        json!({ "session_id": SESSION, "decisions": [{ "type": "WAT", "summary": "x" }] }),
    );
    assert_eq!(envelope["error"]["code"], "INVALID_INPUT");
}

#[test]
fn fact_commits_dedupe_and_update_in_place() {
    let mut server = Server::start("fact_dedup");
    server.initialize();

    for value in ["npm run build", "cargo build"] {
        server.call_tool_ok(
            "memory_commit",
            json!({
                "session_id": SESSION,
                "facts": [{ "key": "build", "value": value, "scope": "repo" }]
            }),
        );
    }

    let envelope = server.call_tool_ok(
        "memory_search",
        json!({ "session_id": SESSION, "query": "build" }),
    );
    let facts = envelope["result"]["facts"].as_array().expect("facts");
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0]["value"], "cargo build");
    let id = facts[0]["id"].as_str().expect("fact id");
    assert!(id.starts_with("F-"));
    assert_eq!(id.len(), 2 + 16);
}

#[test]
fn pointer_artifact_round_trip() {
    let mut server = Server::start("pointer");
    server.initialize();

    let envelope = server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": SESSION,
            "artifacts": [{ "kind": "SNIPPET", "uri": "workspace://README.md" }]
        }),
    );
    let ids = envelope["result"]["artifactIds"].as_array().expect("ids");
    assert_eq!(ids.len(), 1);
    let artifact_id = ids[0].as_str().expect("artifact id");

    let fetched = server.call_tool_ok("memory_fetch", json!({ "id": artifact_id }));
    let record = &fetched["result"]["record"];
    assert_eq!(record["uri"], "workspace://README.md");
    assert_eq!(record["size"], 0);
    assert_eq!(record["meta"]["origin"]["type"], "workspace-uri");
    assert_eq!(record["meta"]["pointer"], Value::Bool(true));

    // No body file was created for the pointer.
    let sha = record["sha256"].as_str().expect("sha");
    assert!(!server.root.join("rwm_artifacts").join(sha).exists());
}

#[test]
fn text_artifact_body_is_readable_as_resource() {
    let mut server = Server::start("text_resource");
    server.initialize();

    let envelope = server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": SESSION,
            "artifacts": [{ "kind": "DIFF", "text": "diff --git a b" }]
        }),
    );
    let artifact_id = envelope["result"]["artifactIds"][0]
        .as_str()
        .expect("artifact id")
        .to_string();

    let fetched = server.call_tool_ok("memory_fetch", json!({ "id": artifact_id }));
    let resource = fetched["result"]["resource"].as_str().expect("resource");
    assert!(resource.starts_with("artifact://sha256/"));
    assert_eq!(fetched["result"]["record"]["meta"]["origin"]["type"], "text");

    let read = server.request("resources/read", json!({ "uri": resource }));
    assert_eq!(read["result"]["contents"][0]["text"], "diff --git a b");
}

#[test]
fn workspace_resource_is_path_guarded() {
    let mut server = Server::start("workspace_resource");
    std::fs::write(server.root.join("notes.txt"), "workspace text").expect("write file");
    server.initialize();

    let read = server.request(
        "resources/read",
        json!({ "uri": "workspace://notes.txt" }),
    );
    assert_eq!(read["result"]["contents"][0]["text"], "workspace text");

    let escape = server.request(
        "resources/read",
        json!({ "uri": "workspace://../outside.txt" }),
    );
    assert!(escape.get("error").is_some());

    let unknown = server.request("resources/read", json!({ "uri": "ftp://nope" }));
    assert!(unknown.get("error").is_some());
}

#[test]
fn commit_links_events_to_the_current_task() {
    let mut server = Server::start("task_link");
    server.initialize();

    server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": SESSION,
            "task": "Implement feature",
            "decisions": [{ "id": "D-choice", "type": "DECISION", "summary": "Chose approach" }]
        }),
    );

    let fetched = server.call_tool_ok("memory_fetch", json!({ "id": "D-choice" }));
    assert_eq!(fetched["result"]["record"]["task_id"], "T-implement-fe");

    let task = server.call_tool_ok("memory_fetch", json!({ "id": "T-implement-fe" }));
    assert_eq!(task["result"]["record"]["title"], "Implement feature");
    assert_eq!(task["result"]["record"]["status"], "doing");
}

#[test]
fn decision_evidence_defaults_to_all_commit_artifacts() {
    let mut server = Server::start("evidence");
    server.initialize();

    let envelope = server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": SESSION,
            "decisions": [
                { "id": "D-auto", "type": "DECISION", "summary": "inherits evidence" },
                { "id": "D-manual", "type": "DECISION", "summary": "keeps evidence", "evidence": ["E-1"] }
            ],
            "artifacts": [
                { "kind": "SNIPPET", "text": "alpha" },
                { "kind": "SNIPPET", "text": "beta" }
            ]
        }),
    );
    let ids = envelope["result"]["artifactIds"].clone();

    let auto = server.call_tool_ok("memory_fetch", json!({ "id": "D-auto" }));
    assert_eq!(auto["result"]["record"]["evidence"], ids);

    let manual = server.call_tool_ok("memory_fetch", json!({ "id": "D-manual" }));
    assert_eq!(manual["result"]["record"]["evidence"], json!(["E-1"]));
}

#[test]
fn orphan_bodies_are_pruned_on_commit() {
    let mut server = Server::start("prune");
    server.initialize();

    let envelope = server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": SESSION,
            "artifacts": [{ "kind": "LOG", "text": "kept body" }]
        }),
    );
    let artifact_id = envelope["result"]["artifactIds"][0]
        .as_str()
        .expect("artifact id")
        .to_string();
    let fetched = server.call_tool_ok("memory_fetch", json!({ "id": artifact_id }));
    let sha = fetched["result"]["record"]["sha256"]
        .as_str()
        .expect("sha")
        .to_string();

    let orphan = server.root.join("rwm_artifacts").join("stray.tmp");
    std::fs::write(&orphan, b"stray").expect("write orphan");

    // Any commit sweeps the pool.
    server.call_tool_ok("memory_commit", json!({ "session_id": SESSION }));

    assert!(!orphan.exists());
    assert!(server.root.join("rwm_artifacts").join(&sha).exists());
}

#[test]
fn span_reads_and_clamps_lines() {
    let mut server = Server::start("span");
    std::fs::write(server.root.join("file.txt"), "l1\nl2\nl3\n").expect("write file");
    server.initialize();

    let envelope = server.call_tool_ok(
        "memory_span",
        json!({ "path": "file.txt", "startLine": 2, "endLine": 99 }),
    );
    assert_eq!(envelope["result"]["text"], "l2\nl3");
    assert_eq!(envelope["result"]["startLine"], 2);
    assert_eq!(envelope["result"]["endLine"], 3);

    let inverted = server.call_tool(
        "memory_span",
        json!({ "path": "file.txt", "startLine": 3, "endLine": 1 }),
    );
    assert_eq!(inverted["error"]["code"], "INVALID_INPUT");

    let escape = server.call_tool(
        "memory_span",
        json!({ "path": "../escape.txt", "startLine": 1, "endLine": 1 }),
    );
    assert_eq!(escape["error"]["code"], "PATH_ESCAPE");
}

#[test]
fn update_distinguishes_omitted_from_null_accept_criteria() {
    let mut server = Server::start("update_task");
    server.initialize();

    server.call_tool_ok(
        "memory_commit",
        json!({ "session_id": SESSION, "task": "Refactor parser" }),
    );

    let set = server.call_tool_ok(
        "memory_update",
        json!({
            "target": "task",
            "id": "T-refactor-par",
            "status": "blocked",
            "accept_criteria": "tests green"
        }),
    );
    assert_eq!(set["result"]["record"]["status"], "blocked");
    assert_eq!(set["result"]["record"]["accept_criteria"], "tests green");

    // Omitting the key leaves criteria alone.
    let keep = server.call_tool_ok(
        "memory_update",
        json!({ "target": "task", "id": "T-refactor-par", "status": "review" }),
    );
    assert_eq!(keep["result"]["record"]["accept_criteria"], "tests green");

    // An explicit null clears them.
    let clear = server.call_tool_ok(
        "memory_update",
        json!({ "target": "task", "id": "T-refactor-par", "accept_criteria": null }),
    );
    assert_eq!(clear["result"]["record"]["accept_criteria"], Value::Null);

    let empty = server.call_tool(
        "memory_update",
        json!({ "target": "task", "id": "T-refactor-par" }),
    );
    assert_eq!(empty["error"]["code"], "INVALID_UPDATE");

    let missing = server.call_tool(
        "memory_update",
        json!({ "target": "task", "id": "T-missing", "status": "done" }),
    );
    assert_eq!(missing["error"]["code"], "NOT_FOUND");
}

#[test]
fn artifact_text_update_rewrites_the_content_address() {
    let mut server = Server::start("update_artifact");
    server.initialize();

    let envelope = server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": SESSION,
            "artifacts": [{ "id": "P-stable", "kind": "CONFIG", "text": "before" }]
        }),
    );
    assert_eq!(envelope["result"]["artifactIds"][0], "P-stable");

    let before = server.call_tool_ok("memory_fetch", json!({ "id": "P-stable" }));
    let old_sha = before["result"]["record"]["sha256"]
        .as_str()
        .expect("sha")
        .to_string();

    let updated = server.call_tool_ok(
        "memory_update",
        json!({ "target": "artifact", "id": "P-stable", "text": "after" }),
    );
    let record = &updated["result"]["record"];
    let new_sha = record["sha256"].as_str().expect("sha");
    assert_ne!(new_sha, old_sha);
    assert_eq!(record["size"], "after".len() as i64);
    assert_eq!(
        record["uri"],
        format!("artifact://sha256/{new_sha}")
    );

    // Old body is an orphan now; the next commit sweeps it.
    server.call_tool_ok("memory_commit", json!({ "session_id": SESSION }));
    assert!(!server.root.join("rwm_artifacts").join(&old_sha).exists());
    assert!(server.root.join("rwm_artifacts").join(new_sha).exists());
}

#[test]
fn checkpoint_snapshots_session_state() {
    let mut server = Server::start("checkpoint");
    server.initialize();

    server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": SESSION,
            "task": "Ship checkpoints",
            "decisions": [{ "type": "DECISION", "summary": "labeled save points" }],
            "facts": [{ "key": "db", "value": "sqlite" }]
        }),
    );

    let envelope = server.call_tool_ok(
        "memory_checkpoint",
        json!({ "session_id": SESSION, "label": "before-refactor" }),
    );
    let id = envelope["result"]["id"].as_str().expect("id").to_string();
    assert_eq!(envelope["result"]["label"], "before-refactor");
    assert_eq!(envelope["result"]["session_id"], SESSION);

    let fetched = server.call_tool_ok("memory_fetch", json!({ "id": id }));
    let meta = &fetched["result"]["record"]["bundle_meta"];
    assert_eq!(meta["objective"], "Ship checkpoints");
    assert_eq!(meta["active_tasks"][0]["id"], "T-ship-checkpo");
    assert!(meta["recent_events"].as_array().is_some_and(|v| !v.is_empty()));
    assert!(meta["facts"].as_array().is_some_and(|v| !v.is_empty()));
}

#[test]
fn search_scopes_events_by_session_but_not_facts() {
    let mut server = Server::start("search_scope");
    server.initialize();

    server.call_tool_ok(
        "memory_commit",
        json!({
            "session_id": "proj@feature-a",
            "decisions": [{ "type": "NOTE", "summary": "alpha widget note" }],
            "facts": [{ "key": "widget", "value": "alpha widget fact" }]
        }),
    );

    let envelope = server.call_tool_ok(
        "memory_search",
        json!({ "session_id": "proj@feature-b", "query": "widget" }),
    );
    assert_eq!(envelope["result"]["events"].as_array().map(Vec::len), Some(0));
    assert_eq!(envelope["result"]["facts"].as_array().map(Vec::len), Some(1));

    let scoped = server.call_tool_ok(
        "memory_search",
        json!({ "session_id": "proj@feature-a", "query": "widget" }),
    );
    assert_eq!(scoped["result"]["events"].as_array().map(Vec::len), Some(1));

    let over_limit = server.call_tool(
        "memory_search",
        json!({ "session_id": SESSION, "query": "x", "limit": 500 }),
    );
    assert_eq!(over_limit["error"]["code"], "INVALID_INPUT");
}
