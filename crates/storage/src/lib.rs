use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::DashboardSnapshot;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::RwLock;

/// Completion flag written next to the snapshot; the snapshot is only trusted when it reads `"true"`.
pub const ANALYSIS_COMPLETE_KEY: &str = "analysisComplete";
pub const DASHBOARD_SNAPSHOT_KEY: &str = "dashboardData";

pub const IN_MEMORY_SESSION_URL: &str = "sqlite::memory:";

/// Session-scoped string key/value store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// SQLite-backed session store. With `sqlite::memory:` the data lives exactly as long as the pool.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid session database url '{database_url}'"))?
            .create_if_missing(true);

        // An in-memory database is private to its connection, so pin exactly one forever.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(connect_options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_entries (
                key        TEXT PRIMARY KEY NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to prepare session_entries table")?;

        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM session_entries WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to read session key '{key}'"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO session_entries (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write session key '{key}'"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_entries WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove session key '{key}'"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotLoad {
    Found(DashboardSnapshot),
    Absent,
    Malformed(String),
}

/// Reads the stored dashboard snapshot. Parse failures are reported as
/// `Malformed` rather than as errors; only store IO failures return `Err`.
pub async fn load_snapshot(store: &dyn SessionStore) -> Result<SnapshotLoad> {
    let complete = store.get(ANALYSIS_COMPLETE_KEY).await?;
    if complete.as_deref() != Some("true") {
        return Ok(SnapshotLoad::Absent);
    }

    let Some(raw) = store.get(DASHBOARD_SNAPSHOT_KEY).await? else {
        return Ok(SnapshotLoad::Absent);
    };

    match serde_json::from_str::<DashboardSnapshot>(&raw) {
        Ok(mut snapshot) => {
            // The completion flag is authoritative for older blobs without `hasAnalysis`.
            snapshot.has_analysis = true;
            Ok(SnapshotLoad::Found(snapshot))
        }
        Err(err) => {
            tracing::warn!(key = DASHBOARD_SNAPSHOT_KEY, %err, "stored dashboard snapshot is malformed");
            Ok(SnapshotLoad::Malformed(err.to_string()))
        }
    }
}

pub async fn save_snapshot(store: &dyn SessionStore, snapshot: &DashboardSnapshot) -> Result<()> {
    let raw = serde_json::to_string(snapshot).context("failed to serialize dashboard snapshot")?;
    store.set(DASHBOARD_SNAPSHOT_KEY, &raw).await?;
    store.set(ANALYSIS_COMPLETE_KEY, "true").await?;
    Ok(())
}

pub async fn clear_snapshot(store: &dyn SessionStore) -> Result<()> {
    store.remove(ANALYSIS_COMPLETE_KEY).await?;
    store.remove(DASHBOARD_SNAPSHOT_KEY).await?;
    Ok(())
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with(IN_MEMORY_SESSION_URL) || database_url.contains("mode=memory")
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
    if is_in_memory(database_url) || !database_url.starts_with("sqlite:") {
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

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
