//! Cache generation and entry operations.
//!
//! Provides functions for creating and deleting named cache generations
//! and for reading and writing the response entries inside them.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Delivery classification of a fetched response.
///
/// `Basic` responses came from the page's own origin; everything else is
/// `Cors`. Only `Basic` responses are eligible for opportunistic caching on
/// the serve path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Basic,
    Cors,
}

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::Basic => "basic",
            ResponseKind::Cors => "cors",
        }
    }

    fn from_db(s: &str) -> Self {
        // Rows only ever hold values we wrote; anything unrecognized is
        // treated as cross-origin, which the serve policy never re-caches.
        match s {
            "basic" => ResponseKind::Basic,
            _ => ResponseKind::Cors,
        }
    }
}

/// A cached response entry.
///
/// An immutable snapshot of a prior response, addressed by its request key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub key: String,
    pub url: String,
    pub status: u16,
    pub kind: ResponseKind,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoreDb {
    /// Create a named cache generation if it doesn't already exist.
    pub async fn open_cache(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update a response entry in a named cache.
    ///
    /// Uses UPSERT semantics: inserts if the key doesn't exist, replaces the
    /// stored response if it does. Creates the cache row on demand so callers
    /// don't have to open the cache first.
    pub async fn put_response(&self, cache: &str, entry: &CachedResponse) -> Result<(), Error> {
        let cache = cache.to_string();
        let entry = entry.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![cache, now],
                )?;
                conn.execute(
                    "INSERT INTO entries (
                    cache, key, url, status, kind, content_type,
                    headers_json, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(cache, key) DO UPDATE SET
                    url = excluded.url,
                    status = excluded.status,
                    kind = excluded.kind,
                    content_type = excluded.content_type,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &cache,
                        &entry.key,
                        &entry.url,
                        i32::from(entry.status),
                        entry.kind.as_str(),
                        &entry.content_type,
                        &entry.headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a response entry by request key.
    ///
    /// Returns None if the key doesn't exist in the named cache.
    pub async fn get_response(&self, cache: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let cache = cache.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, url, status, kind, content_type, headers_json, body, stored_at
                FROM entries WHERE cache = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![cache, key], |row| {
                    Ok(CachedResponse {
                        key: row.get(0)?,
                        url: row.get(1)?,
                        status: row.get::<_, i32>(2)? as u16,
                        kind: ResponseKind::from_db(&row.get::<_, String>(3)?),
                        content_type: row.get(4)?,
                        headers_json: row.get(5)?,
                        body: row.get(6)?,
                        stored_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a cache generation and all of its entries.
    ///
    /// Returns true if the cache existed.
    pub async fn delete_cache(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List all cache generation names, ordered by name.
    pub async fn list_caches(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Count the entries in a named cache.
    pub async fn count_entries(&self, cache: &str) -> Result<u64, Error> {
        let cache = cache.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE cache = ?1",
                    params![cache],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
