//! Persistence contracts for chats, links, and their associations.
//!
//! Two backends implement [`ChatRepository`] and [`LinkRepository`]:
//! [`store_memory::InMemoryStore`] for tests and ephemeral runs, and
//! [`store_sqlite::SqliteStore`] for everything else.

pub mod error;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    store::{ChatRepository, LinkRepository},
};

/// Run database migrations for the storage crate.
///
/// This creates the `chat`, `link`, and `chat_link` tables. Should be called
/// at application startup when using [`store_sqlite::SqliteStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
