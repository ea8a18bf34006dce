//! Profile service: roles, daily quotas, and usage statistics.
//!
//! Authentication happens elsewhere; callers pass the id of the user they
//! already authenticated.

use chrono::{Days, NaiveDate, Utc};
use parley_types::error::ProfileError;
use parley_types::profile::{DailyActivity, Profile, UserRole, UserSettings, UserStats};
use tracing::{info, warn};
use uuid::Uuid;

use crate::profile::repository::ProfileRepository;

/// Days covered by the activity chart, today included.
const ACTIVITY_DAYS: u64 = 7;

pub struct ProfileService<P: ProfileRepository> {
    repo: P,
    default_daily_limit: u32,
}

impl<P: ProfileRepository> ProfileService<P> {
    pub fn new(repo: P, default_daily_limit: u32) -> Self {
        Self {
            repo,
            default_daily_limit,
        }
    }

    pub fn repo(&self) -> &P {
        &self.repo
    }

    /// Return the user's profile, creating it and its settings on first sight.
    pub async fn ensure_profile(&self, user_id: Uuid, email: &str) -> Result<Profile, ProfileError> {
        if let Some(profile) = self.repo.get_profile(&user_id).await? {
            return Ok(profile);
        }
        let profile = Profile {
            id: user_id,
            email: email.to_string(),
            first_name: None,
            last_name: None,
            avatar_url: None,
            role: UserRole::User,
            created_at: Utc::now(),
        };
        self.repo.create_profile(&profile).await?;
        self.repo
            .save_settings(&UserSettings::new(user_id, self.default_daily_limit))
            .await?;
        info!(user_id = %user_id, "Profile created");
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, ProfileError> {
        self.repo
            .get_profile(&user_id)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    async fn require_admin(&self, actor_id: Uuid) -> Result<Profile, ProfileError> {
        let actor = self.get_profile(actor_id).await?;
        if actor.is_admin() {
            Ok(actor)
        } else {
            Err(ProfileError::Forbidden("admin role required".to_string()))
        }
    }

    pub async fn list_profiles_as(&self, actor_id: Uuid) -> Result<Vec<Profile>, ProfileError> {
        self.require_admin(actor_id).await?;
        Ok(self.repo.list_profiles().await?)
    }

    pub async fn set_role_as(
        &self,
        actor_id: Uuid,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<Profile, ProfileError> {
        self.require_admin(actor_id).await?;
        self.repo.set_role(&target_id, role).await?;
        info!(actor = %actor_id, target = %target_id, role = %role, "Role changed");
        self.get_profile(target_id).await
    }

    /// Current settings, falling back to defaults for users without a row.
    pub async fn settings(&self, user_id: Uuid) -> Result<UserSettings, ProfileError> {
        Ok(self
            .repo
            .get_settings(&user_id)
            .await?
            .unwrap_or_else(|| UserSettings::new(user_id, self.default_daily_limit)))
    }

    /// Fails with `DailyLimitReached` once today's quota is used up.
    pub async fn check_daily_limit(&self, user_id: Uuid) -> Result<UserSettings, ProfileError> {
        self.check_daily_limit_on(user_id, today()).await
    }

    async fn check_daily_limit_on(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<UserSettings, ProfileError> {
        let settings = self.settings(user_id).await?;
        if settings.can_send_on(today) {
            Ok(settings)
        } else {
            warn!(user_id = %user_id, limit = settings.daily_message_limit, "Daily message limit reached");
            Err(ProfileError::DailyLimitReached {
                limit: settings.daily_message_limit,
            })
        }
    }

    pub async fn record_message_sent(&self, user_id: Uuid) -> Result<UserSettings, ProfileError> {
        self.record_message_sent_on(user_id, today()).await
    }

    async fn record_message_sent_on(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<UserSettings, ProfileError> {
        let mut settings = self.settings(user_id).await?;
        settings.record_sent_on(today);
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }

    pub async fn record_model_usage(&self, user_id: Uuid, model: &str) -> Result<(), ProfileError> {
        Ok(self.repo.increment_model_usage(&user_id, model).await?)
    }

    pub async fn user_stats(&self, user_id: Uuid) -> Result<UserStats, ProfileError> {
        self.user_stats_on(user_id, today()).await
    }

    async fn user_stats_on(&self, user_id: Uuid, today: NaiveDate) -> Result<UserStats, ProfileError> {
        let first_day = today
            .checked_sub_days(Days::new(ACTIVITY_DAYS - 1))
            .unwrap_or(today);
        let since = first_day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();

        let total_chats = self.repo.count_chats(&user_id).await?;
        let total_messages = self.repo.count_messages(&user_id).await?;
        let model_usage = self.repo.model_usage(&user_id).await?;
        let counts = self.repo.daily_message_counts(&user_id, since).await?;

        let last_7_days = first_day
            .iter_days()
            .take(ACTIVITY_DAYS as usize)
            .map(|date| DailyActivity {
                date,
                messages: counts
                    .iter()
                    .find(|c| c.date == date)
                    .map_or(0, |c| c.messages),
            })
            .collect();

        Ok(UserStats {
            total_chats,
            total_messages,
            model_usage,
            last_7_days,
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryProfileRepository;
    use parley_types::profile::ModelUsage;

    fn service() -> ProfileService<InMemoryProfileRepository> {
        ProfileService::new(InMemoryProfileRepository::default(), 3)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_ensure_profile_is_idempotent() {
        let svc = service();
        let id = Uuid::now_v7();
        let first = svc.ensure_profile(id, "ann@example.com").await.unwrap();
        let second = svc.ensure_profile(id, "other@example.com").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.role, UserRole::User);
        assert_eq!(svc.settings(id).await.unwrap().daily_message_limit, 3);
    }

    #[tokio::test]
    async fn test_admin_gating() {
        let svc = service();
        let admin = Uuid::now_v7();
        let user = Uuid::now_v7();
        svc.ensure_profile(admin, "admin@example.com").await.unwrap();
        svc.ensure_profile(user, "user@example.com").await.unwrap();

        let err = svc.list_profiles_as(user).await.unwrap_err();
        assert!(matches!(err, ProfileError::Forbidden(_)));

        svc.repo().set_role(&admin, UserRole::Admin).await.unwrap();
        assert_eq!(svc.list_profiles_as(admin).await.unwrap().len(), 2);

        let promoted = svc.set_role_as(admin, user, UserRole::Admin).await.unwrap();
        assert!(promoted.is_admin());

        let err = svc
            .set_role_as(admin, Uuid::now_v7(), UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NotFound));
    }

    #[tokio::test]
    async fn test_daily_limit_and_reset() {
        let svc = service();
        let id = Uuid::now_v7();
        svc.ensure_profile(id, "ann@example.com").await.unwrap();

        for _ in 0..3 {
            svc.check_daily_limit_on(id, day(1)).await.unwrap();
            svc.record_message_sent_on(id, day(1)).await.unwrap();
        }
        let err = svc.check_daily_limit_on(id, day(1)).await.unwrap_err();
        assert!(matches!(err, ProfileError::DailyLimitReached { limit: 3 }));

        // A new day starts from zero.
        svc.check_daily_limit_on(id, day(2)).await.unwrap();
        let settings = svc.record_message_sent_on(id, day(2)).await.unwrap();
        assert_eq!(settings.messages_sent_today, 1);
    }

    #[tokio::test]
    async fn test_user_stats_fills_seven_days() {
        let svc = service();
        let id = Uuid::now_v7();
        svc.repo().seed_activity(
            &id,
            2,
            9,
            vec![
                DailyActivity { date: day(4), messages: 5 },
                DailyActivity { date: day(7), messages: 4 },
            ],
        );
        svc.record_model_usage(id, "openai/o3").await.unwrap();
        svc.record_model_usage(id, "openai/o3").await.unwrap();
        svc.record_model_usage(id, "deepseek/deepseek-chat").await.unwrap();

        let stats = svc.user_stats_on(id, day(7)).await.unwrap();
        assert_eq!(stats.total_chats, 2);
        assert_eq!(stats.total_messages, 9);
        assert_eq!(stats.last_7_days.len(), 7);
        assert_eq!(stats.last_7_days[0].date, day(1));
        assert_eq!(stats.last_7_days[3].messages, 5);
        assert_eq!(stats.last_7_days[6].messages, 4);
        assert_eq!(stats.last_7_days[1].messages, 0);
        assert_eq!(
            stats.model_usage[0],
            ModelUsage { model_name: "openai/o3".into(), usage_count: 2 }
        );
    }
}
