//! Session token persistence.
//!
//! The panel issues an access/refresh token pair on login. Tokens are stored
//! under two fixed keys in a small SQLite database so independent `sbx`
//! invocations share a session, the same way the browser panel keeps them in
//! local storage.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::error::{ApiError, Result};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Durable storage for the session token pair.
pub trait TokenStore: Send + Sync {
  fn access_token(&self) -> Result<Option<String>>;

  fn refresh_token(&self) -> Result<Option<String>>;

  /// Overwrite the access token only (used after a refresh).
  fn set_access_token(&self, token: &str) -> Result<()>;

  /// Store both tokens (used after a login).
  fn set_tokens(&self, access: &str, refresh: &str) -> Result<()>;

  /// Remove both tokens (used on logout).
  fn clear(&self) -> Result<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
  tokens: Mutex<(Option<String>, Option<String>)>,
}

#[allow(dead_code)]
impl MemoryTokenStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
    Self {
      tokens: Mutex::new((access.map(String::from), refresh.map(String::from))),
    }
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, (Option<String>, Option<String>)>> {
    self
      .tokens
      .lock()
      .map_err(|e| ApiError::TokenStore(format!("Lock poisoned: {}", e)))
  }
}

impl TokenStore for MemoryTokenStore {
  fn access_token(&self) -> Result<Option<String>> {
    Ok(self.lock()?.0.clone())
  }

  fn refresh_token(&self) -> Result<Option<String>> {
    Ok(self.lock()?.1.clone())
  }

  fn set_access_token(&self, token: &str) -> Result<()> {
    self.lock()?.0 = Some(token.to_string());
    Ok(())
  }

  fn set_tokens(&self, access: &str, refresh: &str) -> Result<()> {
    *self.lock()? = (Some(access.to_string()), Some(refresh.to_string()));
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    *self.lock()? = (None, None);
    Ok(())
  }
}

/// SQLite-backed token store.
pub struct SqliteTokenStore {
  conn: Mutex<Connection>,
}

/// Schema for the token table.
const TOKEN_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tokens (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

impl SqliteTokenStore {
  /// Open or create the token database at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| ApiError::TokenStore(format!("Failed to create token directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      ApiError::TokenStore(format!("Failed to open token database at {}: {}", path.display(), e))
    })?;

    conn
      .execute_batch(TOKEN_SCHEMA)
      .map_err(|e| ApiError::TokenStore(format!("Failed to run token migrations: {}", e)))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| ApiError::TokenStore(format!("Lock poisoned: {}", e)))
  }

  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;

    conn
      .query_row("SELECT value FROM tokens WHERE key = ?", params![key], |row| {
        row.get(0)
      })
      .optional()
      .map_err(|e| ApiError::TokenStore(format!("Failed to read token: {}", e)))
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO tokens (key, value) VALUES (?, ?)",
        params![key, value],
      )
      .map_err(|e| ApiError::TokenStore(format!("Failed to store token: {}", e)))?;

    Ok(())
  }
}

impl TokenStore for SqliteTokenStore {
  fn access_token(&self) -> Result<Option<String>> {
    self.get(ACCESS_TOKEN_KEY)
  }

  fn refresh_token(&self) -> Result<Option<String>> {
    self.get(REFRESH_TOKEN_KEY)
  }

  fn set_access_token(&self, token: &str) -> Result<()> {
    self.set(ACCESS_TOKEN_KEY, token)
  }

  // The pair is written in one transaction so a failure can't leave a new
  // access token alongside a stale refresh token.
  fn set_tokens(&self, access: &str, refresh: &str) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| ApiError::TokenStore(format!("Failed to start transaction: {}", e)))?;

    for (key, value) in [(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)] {
      tx.execute(
        "INSERT OR REPLACE INTO tokens (key, value) VALUES (?, ?)",
        params![key, value],
      )
      .map_err(|e| ApiError::TokenStore(format!("Failed to store token: {}", e)))?;
    }

    tx.commit()
      .map_err(|e| ApiError::TokenStore(format!("Failed to commit tokens: {}", e)))
  }

  fn clear(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "DELETE FROM tokens WHERE key IN (?, ?)",
        params![ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY],
      )
      .map_err(|e| ApiError::TokenStore(format!("Failed to clear tokens: {}", e)))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteTokenStore::open(&dir.path().join("tokens.db")).unwrap();

    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);

    store.set_tokens("access-1", "refresh-1").unwrap();
    assert_eq!(store.access_token().unwrap().as_deref(), Some("access-1"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));

    // Refresh overwrites the access token only
    store.set_access_token("access-2").unwrap();
    assert_eq!(store.access_token().unwrap().as_deref(), Some("access-2"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));

    store.clear().unwrap();
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
  }

  #[test]
  fn test_sqlite_replaces_pair_together() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteTokenStore::open(&dir.path().join("tokens.db")).unwrap();

    store.set_tokens("access-1", "refresh-1").unwrap();
    store.set_tokens("access-2", "refresh-2").unwrap();

    // A login overwrites both tokens as a unit, never just one
    assert_eq!(store.access_token().unwrap().as_deref(), Some("access-2"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-2"));
  }

  #[test]
  fn test_sqlite_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.db");

    {
      let store = SqliteTokenStore::open(&path).unwrap();
      store.set_tokens("a", "r").unwrap();
    }

    let store = SqliteTokenStore::open(&path).unwrap();
    assert_eq!(store.access_token().unwrap().as_deref(), Some("a"));
  }

  #[test]
  fn test_memory_store() {
    let store = MemoryTokenStore::with_tokens(Some("a"), None);
    assert_eq!(store.access_token().unwrap().as_deref(), Some("a"));
    assert_eq!(store.refresh_token().unwrap(), None);

    store.clear().unwrap();
    assert_eq!(store.access_token().unwrap(), None);
  }
}
