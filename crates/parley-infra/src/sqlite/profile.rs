//! SQLite profile repository: profiles, settings, usage counters and activity stats.

use chrono::{DateTime, NaiveDate, Utc};
use parley_core::profile::repository::ProfileRepository;
use parley_types::error::RepositoryError;
use parley_types::profile::{DailyActivity, ModelUsage, Profile, UserRole, UserSettings};
use sqlx::Row;
use uuid::Uuid;

use super::chat::{format_datetime, parse_datetime, parse_uuid};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `ProfileRepository`.
pub struct SqliteProfileRepository {
    pool: DatabasePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ProfileRow {
    id: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    avatar_url: Option<String>,
    role: String,
    created_at: String,
}

impl ProfileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            avatar_url: row.try_get("avatar_url")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_profile(self) -> Result<Profile, RepositoryError> {
        let role: UserRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Profile {
            id: parse_uuid(&self.id, "profile id")?,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            avatar_url: self.avatar_url,
            role,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct SettingsRow {
    user_id: String,
    daily_message_limit: i64,
    messages_sent_today: i64,
    last_message_date: Option<String>,
    chat_background: Option<String>,
}

impl SettingsRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            daily_message_limit: row.try_get("daily_message_limit")?,
            messages_sent_today: row.try_get("messages_sent_today")?,
            last_message_date: row.try_get("last_message_date")?,
            chat_background: row.try_get("chat_background")?,
        })
    }

    fn into_settings(self) -> Result<UserSettings, RepositoryError> {
        Ok(UserSettings {
            user_id: parse_uuid(&self.user_id, "user_id")?,
            daily_message_limit: self.daily_message_limit as u32,
            messages_sent_today: self.messages_sent_today as u32,
            last_message_date: self.last_message_date.as_deref().map(parse_date).transpose()?,
            chat_background: self.chat_background,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| RepositoryError::Query(format!("invalid date '{s}': {e}")))
}

impl ProfileRepository for SqliteProfileRepository {
    async fn create_profile(&self, profile: &Profile) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO profiles (id, email, first_name, last_name, avatar_url, role, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(profile.id.to_string())
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar_url)
        .bind(profile.role.to_string())
        .bind(format_datetime(&profile.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("profile {} already exists", profile.id))
            }
            other => RepositoryError::Query(other.to_string()),
        })?;

        Ok(())
    }

    async fn get_profile(&self, user_id: &Uuid) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let profile_row =
                    ProfileRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(profile_row.into_profile()?))
            }
            None => Ok(None),
        }
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM profiles ORDER BY created_at ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut profiles = Vec::with_capacity(rows.len());
        for row in &rows {
            let profile_row =
                ProfileRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            profiles.push(profile_row.into_profile()?);
        }

        Ok(profiles)
    }

    async fn set_role(&self, user_id: &Uuid, role: UserRole) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE profiles SET role = ? WHERE id = ?")
            .bind(role.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_settings(&self, user_id: &Uuid) -> Result<Option<UserSettings>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM user_settings WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let settings_row =
                    SettingsRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(settings_row.into_settings()?))
            }
            None => Ok(None),
        }
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO user_settings
                   (user_id, daily_message_limit, messages_sent_today, last_message_date, chat_background, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   daily_message_limit = excluded.daily_message_limit,
                   messages_sent_today = excluded.messages_sent_today,
                   last_message_date = excluded.last_message_date,
                   chat_background = excluded.chat_background,
                   updated_at = excluded.updated_at"#,
        )
        .bind(settings.user_id.to_string())
        .bind(settings.daily_message_limit as i64)
        .bind(settings.messages_sent_today as i64)
        .bind(settings.last_message_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&settings.chat_background)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn increment_model_usage(&self, user_id: &Uuid, model_name: &str) -> Result<(), RepositoryError> {
        let now = format_datetime(&Utc::now());
        sqlx::query(
            r#"INSERT INTO model_usage_stats (user_id, model_name, usage_count, created_at, updated_at)
               VALUES (?, ?, 1, ?, ?)
               ON CONFLICT(user_id, model_name) DO UPDATE SET
                   usage_count = usage_count + 1,
                   updated_at = excluded.updated_at"#,
        )
        .bind(user_id.to_string())
        .bind(model_name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn model_usage(&self, user_id: &Uuid) -> Result<Vec<ModelUsage>, RepositoryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT model_name, usage_count FROM model_usage_stats
               WHERE user_id = ?
               ORDER BY usage_count DESC, model_name ASC"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(model_name, count)| ModelUsage {
                model_name,
                usage_count: count as u64,
            })
            .collect())
    }

    async fn count_chats(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }

    async fn count_messages(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM messages m
               JOIN chats c ON c.id = m.chat_id
               WHERE c.user_id = ?"#,
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }

    async fn daily_message_counts(
        &self,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyActivity>, RepositoryError> {
        // Timestamps are stored as UTC RFC 3339, so the first ten characters are the UTC day.
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT substr(m.created_at, 1, 10) AS day, COUNT(*) AS messages
               FROM messages m
               JOIN chats c ON c.id = m.chat_id
               WHERE c.user_id = ? AND m.created_at >= ?
               GROUP BY day
               ORDER BY day ASC"#,
        )
        .bind(user_id.to_string())
        .bind(format_datetime(&since))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.into_iter()
            .map(|(day, messages)| {
                Ok(DailyActivity {
                    date: parse_date(&day)?,
                    messages: messages as u64,
                })
            })
            .collect()
    }
}
