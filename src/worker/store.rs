//! Cache store trait and SQLite implementation.
//!
//! Entries live in generation-named stores keyed by request URL. There is no
//! TTL; eviction happens only when a whole generation is deleted.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use url::Url;

use super::fetch::FetchResponse;

/// A cached response snapshot.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
  /// When the snapshot was stored.
  pub cached_at: DateTime<Utc>,
}

impl CachedResponse {
  pub fn snapshot(response: &FetchResponse) -> Self {
    Self {
      status: response.status,
      content_type: response.content_type.clone(),
      body: response.body.clone(),
      cached_at: Utc::now(),
    }
  }
}

impl From<CachedResponse> for FetchResponse {
  fn from(cached: CachedResponse) -> Self {
    FetchResponse {
      status: cached.status,
      content_type: cached.content_type,
      body: cached.body,
    }
  }
}

/// Trait for shell-cache storage backends.
pub trait CacheStore: Send + Sync {
  /// Store a response snapshot under (generation, url), replacing any
  /// previous entry for that key.
  fn put(&self, generation: &str, url: &Url, response: &CachedResponse) -> Result<()>;

  /// Look up a cached response.
  fn get(&self, generation: &str, url: &Url) -> Result<Option<CachedResponse>>;

  /// All generation names currently present.
  fn generations(&self) -> Result<Vec<String>>;

  /// Delete a whole generation and its entries.
  fn delete_generation(&self, generation: &str) -> Result<()>;
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryCacheStore {
  entries: Mutex<HashMap<(String, String), CachedResponse>>,
}

impl MemoryCacheStore {
  #[allow(dead_code)]
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), CachedResponse>>> {
    self.entries.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStore for MemoryCacheStore {
  fn put(&self, generation: &str, url: &Url, response: &CachedResponse) -> Result<()> {
    self
      .lock()?
      .insert((generation.to_string(), url.to_string()), response.clone());
    Ok(())
  }

  fn get(&self, generation: &str, url: &Url) -> Result<Option<CachedResponse>> {
    Ok(
      self
        .lock()?
        .get(&(generation.to_string(), url.to_string()))
        .cloned(),
    )
  }

  fn generations(&self) -> Result<Vec<String>> {
    let mut names: Vec<String> = self.lock()?.keys().map(|(g, _)| g.clone()).collect();
    names.sort();
    names.dedup();
    Ok(names)
  }

  fn delete_generation(&self, generation: &str) -> Result<()> {
    self.lock()?.retain(|(g, _), _| g != generation);
    Ok(())
  }
}

/// SQLite-based cache store.
pub struct SqliteCacheStore {
  conn: Mutex<Connection>,
}

/// Schema for the shell cache.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS shell_cache (
    generation TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, url)
);

CREATE INDEX IF NOT EXISTS idx_shell_cache_generation ON shell_cache(generation);
"#;

impl SqliteCacheStore {
  /// Open or create the cache database at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStore for SqliteCacheStore {
  fn put(&self, generation: &str, url: &Url, response: &CachedResponse) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO shell_cache (generation, url, status, content_type, body, cached_at)
         VALUES (?, ?, ?, ?, ?, datetime('now'))",
        params![
          generation,
          url.as_str(),
          response.status,
          response.content_type,
          response.body
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }

  fn get(&self, generation: &str, url: &Url) -> Result<Option<CachedResponse>> {
    let conn = self.lock()?;

    let result: Option<(u16, Option<String>, Vec<u8>, String)> = conn
      .query_row(
        "SELECT status, content_type, body, cached_at FROM shell_cache
         WHERE generation = ? AND url = ?",
        params![generation, url.as_str()],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry: {}", e))?;

    match result {
      Some((status, content_type, body, cached_at_str)) => Ok(Some(CachedResponse {
        status,
        content_type,
        body,
        cached_at: parse_datetime(&cached_at_str)?,
      })),
      None => Ok(None),
    }
  }

  fn generations(&self) -> Result<Vec<String>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT DISTINCT generation FROM shell_cache ORDER BY generation")
      .map_err(|e| eyre!("Failed to prepare generation query: {}", e))?;

    let names: Vec<String> = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list generations: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    Ok(names)
  }

  fn delete_generation(&self, generation: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM shell_cache WHERE generation = ?", params![generation])
      .map_err(|e| eyre!("Failed to delete generation: {}", e))?;

    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
  }

  fn snapshot(body: &str) -> CachedResponse {
    CachedResponse {
      status: 200,
      content_type: Some("text/html".to_string()),
      body: body.as_bytes().to_vec(),
      cached_at: Utc::now(),
    }
  }

  #[test]
  fn test_sqlite_roundtrip_and_replace() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteCacheStore::open(&dir.path().join("shell-cache.db")).unwrap();
    let u = url("http://panel.test/index.html");

    assert!(store.get("seedbox-v1", &u).unwrap().is_none());

    store.put("seedbox-v1", &u, &snapshot("one")).unwrap();
    let hit = store.get("seedbox-v1", &u).unwrap().unwrap();
    assert_eq!(hit.body, b"one");
    assert_eq!(hit.status, 200);

    // Same key replaces
    store.put("seedbox-v1", &u, &snapshot("two")).unwrap();
    let hit = store.get("seedbox-v1", &u).unwrap().unwrap();
    assert_eq!(hit.body, b"two");

    // Other generations don't see the entry
    assert!(store.get("seedbox-v2", &u).unwrap().is_none());
  }

  #[test]
  fn test_sqlite_generation_listing_and_deletion() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteCacheStore::open(&dir.path().join("shell-cache.db")).unwrap();
    let u = url("http://panel.test/");

    store.put("seedbox-v0", &u, &snapshot("old")).unwrap();
    store.put("seedbox-v1", &u, &snapshot("new")).unwrap();

    assert_eq!(store.generations().unwrap(), vec!["seedbox-v0", "seedbox-v1"]);

    store.delete_generation("seedbox-v0").unwrap();
    assert_eq!(store.generations().unwrap(), vec!["seedbox-v1"]);
    assert!(store.get("seedbox-v0", &u).unwrap().is_none());
    assert!(store.get("seedbox-v1", &u).unwrap().is_some());
  }

  #[test]
  fn test_memory_store_matches_contract() {
    let store = MemoryCacheStore::new();
    let u = url("http://panel.test/manifest.json");

    store.put("seedbox-v1", &u, &snapshot("{}")).unwrap();
    assert!(store.get("seedbox-v1", &u).unwrap().is_some());
    assert_eq!(store.generations().unwrap(), vec!["seedbox-v1"]);

    store.delete_generation("seedbox-v1").unwrap();
    assert!(store.get("seedbox-v1", &u).unwrap().is_none());
  }
}
