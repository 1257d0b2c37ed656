//! SQLite-backed chat and link store using sqlx.

use std::str::FromStr;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    linktrack_common::{Chat, ChatId, Link, time},
    sqlx::{
        Row, Sqlite, SqlitePool, Transaction,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    },
    tracing::debug,
    url::Url,
};

use crate::{
    Error, Result,
    store::{ChatRepository, LinkRepository},
};

/// SQLite-backed persistence for chats, links, and associations.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `database_url` and run migrations.
    ///
    /// In-memory URLs get a single long-lived connection, since every new
    /// connection would otherwise see its own empty database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        crate::run_migrations(&pool).await?;
        debug!(database_url, "sqlite store ready");

        Ok(Self { pool })
    }

    /// Create a store using an existing pool (migrations must already be run).
    ///
    /// Call [`crate::run_migrations`] before using this constructor.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a transaction that holds the write lock from its first
    /// statement. A deferred transaction that reads before writing cannot
    /// wait out a concurrent writer and fails with `SQLITE_BUSY` instead.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn map_unique(err: sqlx::Error, entity: &'static str, key: impl std::fmt::Display) -> Error {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::duplicate(entity, key),
        other => Error::Sqlx(other),
    }
}

fn chat_from_row(row: &SqliteRow) -> Chat {
    Chat {
        id: row.get("id"),
        registered_at: time::from_millis(row.get("registered_at")),
    }
}

fn link_from_row(row: &SqliteRow) -> Result<Link> {
    let raw: String = row.get("url");
    let url = Url::parse(&raw).map_err(|source| Error::InvalidUrl {
        url: raw.clone(),
        source,
    })?;
    Ok(Link {
        id: row.get("id"),
        url,
        last_update: time::from_millis(row.get("last_update")),
    })
}

fn links_from_rows(rows: &[SqliteRow]) -> Result<Vec<Link>> {
    rows.iter().map(link_from_row).collect()
}

#[async_trait]
impl ChatRepository for SqliteStore {
    async fn add(&self, chat_id: ChatId) -> Result<Chat> {
        let chat = Chat {
            id: chat_id,
            registered_at: time::now(),
        };
        sqlx::query("INSERT INTO chat (id, registered_at) VALUES (?, ?)")
            .bind(chat.id)
            .bind(chat.registered_at.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique(e, "chat", chat_id))?;
        Ok(chat)
    }

    async fn remove(&self, chat_id: ChatId) -> Result<Chat> {
        let mut tx = self.begin_write().await?;

        let row = sqlx::query("SELECT id, registered_at FROM chat WHERE id = ?")
            .bind(chat_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::not_found("chat", chat_id))?;
        let chat = chat_from_row(&row);

        sqlx::query("DELETE FROM chat_link WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM chat WHERE id = ?")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(chat)
    }

    async fn find_by_id(&self, chat_id: ChatId) -> Result<Option<Chat>> {
        let row = sqlx::query("SELECT id, registered_at FROM chat WHERE id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(chat_from_row))
    }

    async fn find_all_chats_by_url(&self, url: &Url) -> Result<Vec<ChatId>> {
        let rows = sqlx::query(
            "SELECT cl.chat_id
             FROM chat_link cl
             JOIN link l ON l.id = cl.link_id
             WHERE l.url = ?
             ORDER BY cl.chat_id",
        )
        .bind(url.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get("chat_id")).collect())
    }
}

#[async_trait]
impl LinkRepository for SqliteStore {
    async fn add(&self, chat_id: ChatId, url: &Url) -> Result<Link> {
        let mut tx = self.begin_write().await?;

        sqlx::query("SELECT id FROM chat WHERE id = ?")
            .bind(chat_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::not_found("chat", chat_id))?;

        sqlx::query(
            "INSERT INTO link (url, last_update) VALUES (?, ?)
             ON CONFLICT(url) DO NOTHING",
        )
        .bind(url.as_str())
        .bind(time::now_ms())
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query("SELECT id, url, last_update FROM link WHERE url = ?")
            .bind(url.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let link = link_from_row(&row)?;

        sqlx::query("INSERT INTO chat_link (chat_id, link_id) VALUES (?, ?)")
            .bind(chat_id)
            .bind(link.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique(e, "chat link", format!("{chat_id} -> {url}")))?;

        tx.commit().await?;
        Ok(link)
    }

    async fn remove(&self, chat_id: ChatId, url: &Url) -> Result<Link> {
        let mut tx = self.begin_write().await?;

        let row = sqlx::query("SELECT id, url, last_update FROM link WHERE url = ?")
            .bind(url.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::not_found("link", url))?;
        let link = link_from_row(&row)?;

        let result = sqlx::query("DELETE FROM chat_link WHERE chat_id = ? AND link_id = ?")
            .bind(chat_id)
            .bind(link.id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("chat link", format!("{chat_id} -> {url}")));
        }

        tx.commit().await?;
        Ok(link)
    }

    async fn find_all(&self) -> Result<Vec<Link>> {
        let rows = sqlx::query("SELECT id, url, last_update FROM link ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        links_from_rows(&rows)
    }

    async fn find_all_links_by_chat_id(&self, chat_id: ChatId) -> Result<Vec<Link>> {
        let rows = sqlx::query(
            "SELECT l.id, l.url, l.last_update
             FROM chat_link cl
             JOIN link l ON l.id = cl.link_id
             WHERE cl.chat_id = ?
             ORDER BY cl.id",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        links_from_rows(&rows)
    }

    async fn find_by_url(&self, url: &Url) -> Result<Link> {
        let row = sqlx::query("SELECT id, url, last_update FROM link WHERE url = ?")
            .bind(url.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("link", url))?;
        link_from_row(&row)
    }

    async fn find_by_oldest_updates(&self, limit: usize) -> Result<Vec<Link>> {
        let rows = sqlx::query(
            "SELECT id, url, last_update FROM link
             ORDER BY last_update ASC, id ASC
             LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        links_from_rows(&rows)
    }

    async fn set_last_update(&self, url: &Url, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE link SET last_update = ? WHERE url = ?")
            .bind(at.timestamp_millis())
            .bind(url.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("link", url));
        }
        Ok(())
    }

    async fn remove_unused_links(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM link
             WHERE NOT EXISTS (SELECT 1 FROM chat_link WHERE chat_link.link_id = link.id)",
        )
        .execute(&self.pool)
        .await?;
        let removed = result.rows_affected();
        if removed > 0 {
            debug!(removed, "purged unreferenced links");
        }
        Ok(removed)
    }
}
