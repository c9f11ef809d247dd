//! On-disk cache of each server's advertised tools.
//!
//! One JSON file per server under the cache directory, named after
//! [`ToolCacheStore::cache_key`]. The directory is created on first access. Entries older than the expiry read as absent,
//! and so do unreadable or corrupt files: the cache can only ever cost a
//! refresh, never fail a run.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{McpError, ServerParameters, ToolSchema};

pub const DEFAULT_CACHE_EXPIRY_HOURS: i64 = 24;

/// File body: `{"cached_at": "<ISO-8601>", "tools": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cached_at: String,
    pub tools: Vec<ToolSchema>,
}

#[derive(Debug, Clone)]
pub struct ToolCacheStore {
    dir: PathBuf,
    expiry: TimeDelta,
}

impl ToolCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            expiry: TimeDelta::hours(DEFAULT_CACHE_EXPIRY_HOURS),
        }
    }

    pub fn with_expiry(mut self, expiry: TimeDelta) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `command-arg1-arg2` with path separators flattened to `-`. The
    /// environment does not take part, so servers that differ only in env
    /// share an entry.
    pub fn cache_key(server: &ServerParameters) -> String {
        format!("{}-{}", server.command, server.args.join("-")).replace(['/', '\\'], "-")
    }

    pub fn entry_path(&self, server: &ServerParameters) -> PathBuf {
        self.dir.join(format!("{}.json", Self::cache_key(server)))
    }

    pub async fn get(&self, server: &ServerParameters) -> Option<Vec<ToolSchema>> {
        self.get_at(server, Utc::now()).await
    }

    pub async fn get_at(
        &self,
        server: &ServerParameters,
        now: DateTime<Utc>,
    ) -> Option<Vec<ToolSchema>> {
        if let Err(error) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), %error, "tool cache dir unavailable");
            return None;
        }

        let path = self.entry_path(server);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cached tool list");
                return None;
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "unreadable tool cache entry ignored");
                return None;
            }
        };

        let entry = match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(path = %path.display(), %error, "corrupt tool cache entry ignored");
                return None;
            }
        };

        let Some(cached_at) = parse_timestamp(&entry.cached_at) else {
            warn!(
                path = %path.display(),
                cached_at = %entry.cached_at,
                "tool cache entry has an unreadable timestamp"
            );
            return None;
        };

        if now - cached_at > self.expiry {
            debug!(path = %path.display(), %cached_at, "tool cache entry expired");
            return None;
        }

        Some(entry.tools)
    }

    pub async fn put(&self, server: &ServerParameters, tools: &[ToolSchema]) -> Result<(), McpError> {
        self.put_at(server, tools, Local::now()).await
    }

    /// Overwrites the server's entry. The body goes to a uniquely named temp
    /// file in the cache dir that is then persisted over the entry, so
    /// readers and concurrent writers never observe a partial file.
    pub async fn put_at(
        &self,
        server: &ServerParameters,
        tools: &[ToolSchema],
        cached_at: DateTime<Local>,
    ) -> Result<(), McpError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|error| {
            McpError::cache(format!(
                "failed to create cache dir '{}': {error}",
                self.dir.display()
            ))
        })?;

        let entry = CacheEntry {
            cached_at: cached_at.to_rfc3339(),
            tools: tools.to_vec(),
        };
        let body = serde_json::to_vec(&entry)
            .map_err(|error| McpError::cache(format!("failed to encode cache entry: {error}")))?;

        let dir = self.dir.clone();
        let path = self.entry_path(server);
        tokio::task::spawn_blocking(move || write_replacing(&dir, &path, &body))
            .await
            .map_err(|error| McpError::cache(format!("cache write task failed: {error}")))?
    }
}

fn write_replacing(dir: &Path, path: &Path, body: &[u8]) -> Result<(), McpError> {
    let mut temp = NamedTempFile::new_in(dir).map_err(|error| {
        McpError::cache(format!("failed to create temp file in '{}': {error}", dir.display()))
    })?;
    temp.write_all(body).map_err(|error| {
        McpError::cache(format!("failed to write '{}': {error}", temp.path().display()))
    })?;
    temp.persist(path).map_err(|error| {
        McpError::cache(format!("failed to replace '{}': {}", path.display(), error.error))
    })?;

    Ok(())
}

/// Accepts RFC 3339 and offset-less ISO-8601 timestamps; the latter are read
/// as local time.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()?
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn fetch_server() -> ServerParameters {
        ServerParameters::new("uvx").with_args(["mcp-server-fetch"])
    }

    fn fetch_tools() -> Vec<ToolSchema> {
        vec![
            ToolSchema::new(
                "fetch",
                "Fetches a URL from the internet",
                json!({
                    "type": "object",
                    "properties": {"url": {"type": "string"}},
                    "required": ["url"]
                }),
            ),
            ToolSchema::new("noop", "", json!({"type": "object"})),
        ]
    }

    #[test]
    fn cache_key_ignores_env_and_flattens_paths() {
        let plain = ServerParameters::new("npx").with_args(["-y", "@scope/server", "C:\\data"]);
        let with_env = plain.clone().with_env("API_TOKEN", "secret");

        assert_eq!(ToolCacheStore::cache_key(&plain), "npx--y-@scope-server-C:-data");
        assert_eq!(
            ToolCacheStore::cache_key(&plain),
            ToolCacheStore::cache_key(&with_env)
        );
        assert_eq!(ToolCacheStore::cache_key(&ServerParameters::new("srv")), "srv-");
    }

    #[tokio::test]
    async fn entry_is_valid_until_expiry() {
        let dir = TempDir::new().expect("temp dir");
        let store = ToolCacheStore::new(dir.path().join("mcp-tools"));
        let written_at = Local::now();

        store
            .put_at(&fetch_server(), &fetch_tools(), written_at)
            .await
            .expect("put should succeed");

        let written_at = written_at.with_timezone(&Utc);
        let fresh = store
            .get_at(
                &fetch_server(),
                written_at + TimeDelta::hours(23) + TimeDelta::minutes(59),
            )
            .await;
        assert_eq!(fresh, Some(fetch_tools()));

        let stale = store
            .get_at(
                &fetch_server(),
                written_at + TimeDelta::hours(24) + TimeDelta::minutes(1),
            )
            .await;
        assert_eq!(stale, None);
    }

    #[tokio::test]
    async fn missing_and_corrupt_entries_read_as_absent() {
        let dir = TempDir::new().expect("temp dir");
        let store = ToolCacheStore::new(dir.path());

        assert_eq!(store.get(&fetch_server()).await, None);

        tokio::fs::write(store.entry_path(&fetch_server()), b"{\"cached_at\": 12")
            .await
            .expect("write corrupt file");
        assert_eq!(store.get(&fetch_server()).await, None);

        tokio::fs::write(
            store.entry_path(&fetch_server()),
            b"{\"cached_at\": \"yesterday\", \"tools\": []}",
        )
        .await
        .expect("write bad timestamp");
        assert_eq!(store.get(&fetch_server()).await, None);
    }

    #[tokio::test]
    async fn naive_timestamps_are_read_as_local_time() {
        let dir = TempDir::new().expect("temp dir");
        let store = ToolCacheStore::new(dir.path());
        let cached_at = Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f");
        let body = json!({
            "cached_at": cached_at.to_string(),
            "tools": [{"name": "fetch", "description": "Fetch", "inputSchema": {"type": "object"}}]
        });

        tokio::fs::write(store.entry_path(&fetch_server()), body.to_string())
            .await
            .expect("write entry");

        let tools = store.get(&fetch_server()).await.expect("entry should be fresh");
        assert_eq!(tools[0].name, "fetch");
    }

    #[tokio::test]
    async fn put_overwrites_the_previous_entry_in_place() {
        let dir = TempDir::new().expect("temp dir");
        let store = ToolCacheStore::new(dir.path());

        store.put(&fetch_server(), &fetch_tools()).await.expect("first put");
        store
            .put(&fetch_server(), &fetch_tools()[..1])
            .await
            .expect("second put");

        let tools = store.get(&fetch_server()).await.expect("entry should exist");
        assert_eq!(tools.len(), 1);

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.expect("read dir");
        while let Some(entry) = entries.next_entry().await.expect("dir entry") {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["uvx-mcp-server-fetch.json".to_string()]);
    }

    #[tokio::test]
    async fn first_read_creates_the_cache_dir() {
        let dir = TempDir::new().expect("temp dir");
        let store = ToolCacheStore::new(dir.path().join("home").join("mcp-tools"));

        assert_eq!(store.get(&fetch_server()).await, None);
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn concurrent_writers_leave_one_whole_entry() {
        let dir = TempDir::new().expect("temp dir");
        let store = ToolCacheStore::new(dir.path());
        let tools = fetch_tools();

        let writers = (0..8).map(|round| {
            let store = store.clone();
            let tools = tools[..1 + round % 2].to_vec();
            tokio::spawn(async move { store.put(&fetch_server(), &tools).await })
        });
        for writer in writers.collect::<Vec<_>>() {
            writer.await.expect("writer task").expect("put should succeed");
        }

        let cached = store.get(&fetch_server()).await.expect("entry should decode");
        assert!(cached == tools[..1] || cached == tools[..]);

        let mut entries = tokio::fs::read_dir(dir.path()).await.expect("read dir");
        let mut count = 0;
        while entries.next_entry().await.expect("dir entry").is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
    }
}
