use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Local, TimeDelta};
use lcommon::BoxFuture;
use lmcp::{
    CallToolResult, McpConnector, McpError, McpSession, ServerParameters, ToolCacheStore,
    ToolDiscovery, ToolSchema,
};
use ltooling::Tool;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Serves canned tool lists keyed by command and counts opened sessions.
#[derive(Default)]
struct FakeConnector {
    tools: HashMap<String, Vec<ToolSchema>>,
    sessions: AtomicUsize,
    closed: Arc<AtomicUsize>,
    listed: Mutex<Vec<String>>,
}

impl FakeConnector {
    fn with_server(mut self, command: &str, names: &[&str]) -> Self {
        let schemas = names
            .iter()
            .map(|name| ToolSchema::new(*name, format!("{name} tool"), json!({"type": "object"})))
            .collect();
        self.tools.insert(command.to_string(), schemas);
        self
    }

    fn sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    tools: Option<Vec<ToolSchema>>,
    closed: Arc<AtomicUsize>,
}

impl McpConnector for FakeConnector {
    fn connect<'a>(
        &'a self,
        server: &'a ServerParameters,
    ) -> BoxFuture<'a, Result<Box<dyn McpSession>, McpError>> {
        Box::pin(async move {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            self.listed
                .lock()
                .expect("listed lock")
                .push(server.command.clone());
            Ok(Box::new(FakeSession {
                tools: self.tools.get(&server.command).cloned(),
                closed: Arc::clone(&self.closed),
            }) as Box<dyn McpSession>)
        })
    }
}

impl McpSession for FakeSession {
    fn initialize<'a>(&'a mut self) -> BoxFuture<'a, Result<(), McpError>> {
        Box::pin(async move { Ok(()) })
    }

    fn list_tools<'a>(&'a mut self) -> BoxFuture<'a, Result<Vec<ToolSchema>, McpError>> {
        Box::pin(async move {
            self.tools
                .clone()
                .ok_or_else(|| McpError::closed("server exited during startup"))
        })
    }

    fn call_tool<'a>(
        &'a mut self,
        _name: &'a str,
        _arguments: Value,
    ) -> BoxFuture<'a, Result<CallToolResult, McpError>> {
        Box::pin(async move { Ok(CallToolResult::default()) })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            self.closed.fetch_add(1, Ordering::SeqCst);
        })
    }
}

fn names(tools: &[lmcp::McpTool]) -> Vec<String> {
    tools.iter().map(|tool| tool.definition().name).collect()
}

#[tokio::test]
async fn uncached_servers_open_one_session_each_and_fill_the_cache() {
    let dir = TempDir::new().expect("temp dir");
    let connector = Arc::new(
        FakeConnector::default()
            .with_server("fetch-server", &["fetch"])
            .with_server("git-server", &["git_status", "git_diff", "git_commit"]),
    );
    let discovery = ToolDiscovery::new(ToolCacheStore::new(dir.path()), connector.clone());
    let servers = vec![
        ServerParameters::new("git-server"),
        ServerParameters::new("fetch-server"),
    ];

    let tools = discovery.discover(&servers).await;

    assert_eq!(
        names(&tools),
        vec!["git_status", "git_diff", "git_commit", "fetch"]
    );
    assert_eq!(connector.sessions(), 2);
    assert_eq!(connector.closed.load(Ordering::SeqCst), 2);
    assert!(discovery.cache().get(&servers[0]).await.is_some());
    assert!(discovery.cache().get(&servers[1]).await.is_some());
}

#[tokio::test]
async fn fresh_cache_entries_open_no_sessions() {
    let dir = TempDir::new().expect("temp dir");
    let cache = ToolCacheStore::new(dir.path());
    let server = ServerParameters::new("fetch-server").with_args(["--stdio"]);
    cache
        .put(
            &server,
            &[ToolSchema::new("fetch", "cached", json!({"type": "object"}))],
        )
        .await
        .expect("seed cache");

    let connector = Arc::new(FakeConnector::default().with_server("fetch-server", &["live"]));
    let discovery = ToolDiscovery::new(cache, connector.clone());

    let tools = discovery.discover(std::slice::from_ref(&server)).await;

    assert_eq!(names(&tools), vec!["fetch"]);
    assert_eq!(tools[0].definition().description, "cached");
    assert_eq!(connector.sessions(), 0);
}

#[tokio::test]
async fn expired_entries_are_refreshed_from_the_server() {
    let dir = TempDir::new().expect("temp dir");
    let cache = ToolCacheStore::new(dir.path());
    let server = ServerParameters::new("fetch-server");
    cache
        .put_at(
            &server,
            &[ToolSchema::new("stale", "", json!({"type": "object"}))],
            Local::now() - TimeDelta::hours(25),
        )
        .await
        .expect("seed cache");

    let connector = Arc::new(FakeConnector::default().with_server("fetch-server", &["fetch"]));
    let discovery = ToolDiscovery::new(cache, connector.clone());

    let tools = discovery.discover(std::slice::from_ref(&server)).await;

    assert_eq!(names(&tools), vec!["fetch"]);
    assert_eq!(connector.sessions(), 1);
    let cached = discovery.cache().get(&server).await.expect("refreshed entry");
    assert_eq!(cached[0].name, "fetch");
}

#[tokio::test]
async fn failing_server_is_skipped_and_others_still_load() {
    let dir = TempDir::new().expect("temp dir");
    let connector = Arc::new(FakeConnector::default().with_server("fetch-server", &["fetch"]));
    let discovery = ToolDiscovery::new(ToolCacheStore::new(dir.path()), connector.clone());
    let servers = vec![
        ServerParameters::new("broken-server"),
        ServerParameters::new("fetch-server"),
    ];

    let tools = discovery.discover(&servers).await;

    assert_eq!(names(&tools), vec!["fetch"]);
    assert_eq!(connector.closed.load(Ordering::SeqCst), 2);
    assert!(discovery.cache().get(&servers[0]).await.is_none());
}

#[tokio::test]
async fn unwritable_cache_does_not_break_discovery() {
    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").expect("create blocker file");

    let connector = Arc::new(FakeConnector::default().with_server("fetch-server", &["fetch"]));
    let discovery = ToolDiscovery::new(ToolCacheStore::new(&blocker), connector.clone());

    let tools = discovery
        .discover(&[ServerParameters::new("fetch-server")])
        .await;

    assert_eq!(names(&tools), vec!["fetch"]);
}
