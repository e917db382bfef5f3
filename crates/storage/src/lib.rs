use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::StatusCode;
use offline_cache::CacheStorage;
use shared::domain::{CacheKey, FetchResponse};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, SqliteConnection,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use url::Url;

/// SQLite-backed cache buckets that survive process restarts.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub name: String,
    pub entries: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub key: CacheKey,
    pub response: FetchResponse,
    pub stored_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every in-memory connection is its own database, so keep exactly one alive.
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open cache database '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn bucket_summaries(&self) -> Result<Vec<BucketSummary>> {
        let rows = sqlx::query(
            "SELECT b.name, b.created_at, COUNT(e.request_key) AS entries
             FROM cache_buckets b
             LEFT JOIN cache_entries e ON e.bucket = b.name
             GROUP BY b.name, b.created_at
             ORDER BY b.created_at, b.name",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to summarize cache buckets")?;

        rows.into_iter()
            .map(|row| {
                Ok(BucketSummary {
                    name: row.try_get("name")?,
                    entries: row.try_get("entries")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Like `match_entry`, but also reports when the entry was written.
    pub async fn load_entry(&self, bucket: &str, key: &CacheKey) -> Result<Option<StoredEntry>> {
        let row = sqlx::query(
            "SELECT response_url, status, headers_json, body, stored_at
             FROM cache_entries
             WHERE bucket = ? AND request_key = ?",
        )
        .bind(bucket)
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load cache entry {key} from {bucket}"))?;

        row.map(|row| {
            Ok(StoredEntry {
                key: key.clone(),
                stored_at: row.try_get("stored_at")?,
                response: response_from_row(&row)?,
            })
        })
        .transpose()
    }
}

async fn upsert_bucket(conn: &mut SqliteConnection, bucket: &str) -> Result<()> {
    sqlx::query("INSERT INTO cache_buckets (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
        .bind(bucket)
        .execute(conn)
        .await
        .with_context(|| format!("failed to create cache bucket {bucket}"))?;
    Ok(())
}

async fn upsert_entry(
    conn: &mut SqliteConnection,
    bucket: &str,
    key: &CacheKey,
    response: &FetchResponse,
) -> Result<()> {
    let headers_json = serde_json::to_string(&response.header_pairs())?;
    sqlx::query(
        "INSERT INTO cache_entries (bucket, request_key, response_url, status, headers_json, body, stored_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(bucket, request_key) DO UPDATE SET
            response_url = excluded.response_url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
    )
    .bind(bucket)
    .bind(key.as_str())
    .bind(response.url.as_str())
    .bind(i64::from(response.status.as_u16()))
    .bind(headers_json)
    .bind(response.body.as_ref())
    .bind(Utc::now())
    .execute(conn)
    .await
    .with_context(|| format!("failed to store cache entry {key} in {bucket}"))?;
    Ok(())
}

fn response_from_row(row: &SqliteRow) -> Result<FetchResponse> {
    let url: String = row.try_get("response_url")?;
    let status: i64 = row.try_get("status")?;
    let headers_json: String = row.try_get("headers_json")?;
    let body: Vec<u8> = row.try_get("body")?;

    let url = Url::parse(&url).with_context(|| format!("stored response url '{url}' is invalid"))?;
    let status = u16::try_from(status)
        .ok()
        .and_then(|status| StatusCode::from_u16(status).ok())
        .with_context(|| format!("stored status {status} is invalid"))?;
    let headers: Vec<(String, String)> =
        serde_json::from_str(&headers_json).context("stored headers are not valid JSON")?;

    Ok(FetchResponse::new(url, status, body).with_header_pairs(&headers))
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[async_trait]
impl CacheStorage for Storage {
    async fn open(&self, bucket: &str) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        upsert_bucket(&mut conn, bucket).await
    }

    async fn match_entry(&self, bucket: &str, key: &CacheKey) -> Result<Option<FetchResponse>> {
        Ok(self
            .load_entry(bucket, key)
            .await?
            .map(|entry| entry.response))
    }

    async fn put(&self, bucket: &str, key: &CacheKey, response: &FetchResponse) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        upsert_bucket(&mut tx, bucket).await?;
        upsert_entry(&mut tx, bucket, key, response).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn put_all(&self, bucket: &str, entries: &[(CacheKey, FetchResponse)]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        upsert_bucket(&mut tx, bucket).await?;
        for (key, response) in entries {
            upsert_entry(&mut tx, bucket, key, response).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &CacheKey) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM cache_entries WHERE bucket = ? AND request_key = ?")
            .bind(bucket)
            .bind(key.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<CacheKey>> {
        let rows = sqlx::query(
            "SELECT request_key FROM cache_entries WHERE bucket = ? ORDER BY request_key",
        )
        .bind(bucket)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| Ok(CacheKey::from_stored(row.try_get::<String, _>(0)?)))
            .collect()
    }

    async fn bucket_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM cache_buckets ORDER BY created_at, name")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| Ok(row.try_get::<String, _>(0)?))
            .collect()
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cache_entries WHERE bucket = ?")
            .bind(bucket)
            .execute(&mut *tx)
            .await?;
        let buckets = sqlx::query("DELETE FROM cache_buckets WHERE name = ?")
            .bind(bucket)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(buckets > 0)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
