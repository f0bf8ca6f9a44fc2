//! `SQLite` backend.
//!
//! Projects and tasks live in two tables joined by a cascading foreign key,
//! the theme in a one-row `preferences` table. The CLI opens the database
//! for a single command and exits, so the pool stays small.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::Storage;

mod mapping;
mod migrate;
mod preferences_repo;
mod project_repo;
mod task_repo;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 4;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// A private `:memory:` database exists once per connection, so it must not
/// be spread over a pool. Shared-cache memory URLs and files can.
fn pool_size_for(database_url: &str) -> u32 {
    let private_memory = database_url == "sqlite::memory:"
        || (database_url.contains(":memory:") && !database_url.contains("cache=shared"));
    if private_memory { 1 } else { MAX_CONNECTIONS }
}

impl SqliteRepository {
    /// Open (creating if needed) the database at `database_url`.
    ///
    /// Every connection enforces foreign keys, which is what makes
    /// `delete_project` remove a project's tasks. WAL lets `list` run while
    /// another process writes; the busy timeout covers the write-write case.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is invalid or the database
    /// cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let max_connections = pool_size_for(database_url);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;
        tracing::debug!(database_url, max_connections, "sqlite pool ready");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the schema up to the latest version.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration step fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Connect, migrate and wire the `SQLite` repository into all three roles.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations fail.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self::from_repository(repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{NewProjectRecord, ProjectRepository};
    use taskboard_core::time::fixed_now;

    #[test]
    fn private_memory_databases_get_one_connection() {
        assert_eq!(pool_size_for("sqlite::memory:"), 1);
        assert_eq!(
            pool_size_for("sqlite:file:board?mode=memory&cache=shared"),
            MAX_CONNECTIONS
        );
        assert_eq!(pool_size_for("sqlite:///tmp/taskboard.sqlite3"), MAX_CONNECTIONS);
    }

    #[tokio::test]
    async fn plain_memory_url_keeps_data_between_queries() {
        let repo = SqliteRepository::connect("sqlite::memory:").await.unwrap();
        repo.migrate().await.unwrap();
        repo.insert_new_project(NewProjectRecord {
            title: "Inbox".into(),
            description: None,
            created_at: fixed_now(),
        })
        .await
        .unwrap();

        let listed = repo.list_projects().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title(), "Inbox");
    }

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let repo = SqliteRepository::connect("sqlite::memory:").await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
