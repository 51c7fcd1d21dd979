//! Subscription store: durable mapping from chat id to subscription metadata.

use std::{path::Path, str::FromStr};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::{
    domain::{ChatId, Subscription, UserId},
    errors::Error,
    Result,
};

/// Persistence port for subscriptions.
///
/// Every operation is a single statement; callers rely on the storage engine for atomicity
/// and never hold a read across a write.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Upsert keyed on `chat_id`. Re-adding overwrites title, author and timestamp.
    async fn add_or_replace(&self, chat_id: ChatId, title: &str, added_by: UserId) -> Result<()>;

    /// Delete the subscription for `chat_id`. Missing chats are not an error.
    async fn remove(&self, chat_id: ChatId) -> Result<()>;

    /// All subscriptions, ordered by surrogate id.
    async fn list_all(&self) -> Result<Vec<Subscription>>;

    async fn is_subscribed(&self, chat_id: ChatId) -> Result<bool>;
}

/// SQLite-backed store (sqlx pool).
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path` and apply migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::StorageInit(format!("create db directory {}: {e}", parent.display()))
            })?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|e| Error::StorageInit(format!("open {}: {e}", path.display())))?;

        Self::migrated(pool).await
    }

    /// Private in-memory database; lives as long as the store.
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::StorageInit(e.to_string()))?;

        // One connection: every new in-memory connection is a different database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|e| Error::StorageInit(format!("open in-memory db: {e}")))?;

        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "migration failed");
                Error::StorageInit(format!("migrate: {e}"))
            })?;
        Ok(Self { pool })
    }

    /// Wait for in-flight queries and close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SubscriptionStore for SqliteStore {
    async fn add_or_replace(&self, chat_id: ChatId, title: &str, added_by: UserId) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO subscriptions (chat_id, title, added_by, created_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(chat_id) DO UPDATE SET
                   title = excluded.title,
                   added_by = excluded.added_by,
                   created_at = excluded.created_at"#,
        )
        .bind(chat_id.0)
        .bind(title)
        .bind(added_by.0)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, chat_id: ChatId) -> Result<()> {
        sqlx::query("DELETE FROM subscriptions WHERE chat_id = ?")
            .bind(chat_id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, Subscription>(
            "SELECT id, chat_id, title, added_by, created_at FROM subscriptions ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn is_subscribed(&self, chat_id: ChatId) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE chat_id = ?",
        )
        .bind(chat_id.0)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}
