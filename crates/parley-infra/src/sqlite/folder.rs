//! SQLite folder repository implementation.

use parley_core::chat::repository::FolderRepository;
use parley_types::chat::ChatFolder;
use parley_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::chat::{format_datetime, parse_datetime, parse_uuid};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `FolderRepository`.
pub struct SqliteFolderRepository {
    pool: DatabasePool,
}

impl SqliteFolderRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct FolderRow {
    id: String,
    user_id: String,
    name: String,
    color: String,
    icon_url: Option<String>,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl FolderRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            color: row.try_get("color")?,
            icon_url: row.try_get("icon_url")?,
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_folder(self) -> Result<ChatFolder, RepositoryError> {
        Ok(ChatFolder {
            id: parse_uuid(&self.id, "folder id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            name: self.name,
            color: self.color,
            icon_url: self.icon_url,
            position: self.position,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl FolderRepository for SqliteFolderRepository {
    async fn create_folder(&self, folder: &ChatFolder) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_folders (id, user_id, name, color, icon_url, position, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(folder.id.to_string())
        .bind(folder.user_id.to_string())
        .bind(&folder.name)
        .bind(&folder.color)
        .bind(&folder.icon_url)
        .bind(folder.position)
        .bind(format_datetime(&folder.created_at))
        .bind(format_datetime(&folder.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_folder(&self, folder_id: &Uuid) -> Result<Option<ChatFolder>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_folders WHERE id = ?")
            .bind(folder_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|row| {
            FolderRow::from_row(&row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_folder()
        })
        .transpose()
    }

    async fn list_folders(&self, user_id: &Uuid) -> Result<Vec<ChatFolder>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_folders WHERE user_id = ? ORDER BY position ASC, created_at ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut folders = Vec::with_capacity(rows.len());
        for row in &rows {
            let folder_row =
                FolderRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            folders.push(folder_row.into_folder()?);
        }

        Ok(folders)
    }

    async fn update_folder(&self, folder: &ChatFolder) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE chat_folders
               SET name = ?, color = ?, icon_url = ?, position = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&folder.name)
        .bind(&folder.color)
        .bind(&folder.icon_url)
        .bind(folder.position)
        .bind(format_datetime(&folder.updated_at))
        .bind(folder.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_folder(&self, folder_id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chat_folders WHERE id = ?")
            .bind(folder_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
