//! ProfileRepository trait definition.

use chrono::{DateTime, Utc};
use parley_types::error::RepositoryError;
use parley_types::profile::{DailyActivity, ModelUsage, Profile, UserRole, UserSettings};
use uuid::Uuid;

/// Persistence for profiles, per-user settings and usage counters.
///
/// Implementations live in parley-infra (e.g., `SqliteProfileRepository`).
pub trait ProfileRepository: Send + Sync {
    fn create_profile(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_profile(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// All profiles, oldest first.
    fn list_profiles(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Profile>, RepositoryError>> + Send;

    /// Returns `NotFound` for unknown users.
    fn set_role(
        &self,
        user_id: &Uuid,
        role: UserRole,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_settings(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<UserSettings>, RepositoryError>> + Send;

    /// Insert or replace the user's settings row.
    fn save_settings(
        &self,
        settings: &UserSettings,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn increment_model_usage(
        &self,
        user_id: &Uuid,
        model_name: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Per-model counters, most used first.
    fn model_usage(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ModelUsage>, RepositoryError>> + Send;

    fn count_chats(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Messages across all of the user's chats.
    fn count_messages(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Messages per UTC day since `since`. Days without messages are omitted.
    fn daily_message_counts(
        &self,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<DailyActivity>, RepositoryError>> + Send;
}
