//! SQLite connection pools for `parley.db`.
//!
//! Reads go through a read-only pool; every write goes through a pool with a
//! single connection, so SQLite never sees two writers. The database runs in
//! WAL mode with foreign keys on, which is what makes deleting a chat cascade
//! to its messages.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::filesystem::resolve_data_dir;

const DATABASE_FILE: &str = "parley.db";
const READER_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reader and writer pools over the same database file.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) the database at `database_url` and bring the
    /// schema up to date.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = connect_options(database_url)?;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        // The reader pool opens read-only, so the file must exist with its schema first.
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(options.read_only(true))
            .await?;

        tracing::debug!(database_url, "Database opened");
        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for in-flight queries to finish.
    pub async fn close(&self) {
        self.reader.close().await;
        self.writer.close().await;
    }
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(true))
}

/// Database URL for `{data_dir}/parley.db`.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join(DATABASE_FILE).display())
}

/// Database URL under the resolved data directory
/// (`PARLEY_DATA_DIR`, else `~/.parley`).
pub fn default_database_url() -> String {
    database_url(&resolve_data_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(dir: &tempfile::TempDir) -> DatabasePool {
        DatabasePool::new(&database_url(dir.path())).await.unwrap()
    }

    #[tokio::test]
    async fn test_schema_is_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir).await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\'",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();
        let tables: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        for expected in [
            "profiles",
            "user_settings",
            "chat_folders",
            "chats",
            "messages",
            "model_usage_stats",
        ] {
            assert!(tables.contains(&expected), "{expected} table missing");
        }

        let columns: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info('chats')")
            .fetch_all(&pool.reader)
            .await
            .unwrap();
        let columns: Vec<&str> = columns.iter().map(|c| c.0.as_str()).collect();
        assert!(columns.contains(&"summary"));
        assert!(columns.contains(&"summary_covers_up_to"));
    }

    #[tokio::test]
    async fn test_writer_runs_wal_with_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir).await;

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let (fk,): (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[tokio::test]
    async fn test_reader_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir).await;

        let result = sqlx::query("DELETE FROM chats").execute(&pool.reader).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reopen_keeps_data_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let pool = open(&dir).await;
        sqlx::query("INSERT INTO profiles (id, email, role, created_at) VALUES ('u1', 'a@b.c', 'user', '2026-01-01T00:00:00Z')")
            .execute(&pool.writer)
            .await
            .unwrap();
        pool.close().await;

        let pool = open(&dir).await;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_database_url() {
        let url = database_url(Path::new("/var/lib/parley"));
        assert_eq!(url, "sqlite:///var/lib/parley/parley.db");
        assert!(default_database_url().ends_with(DATABASE_FILE));
    }
}
