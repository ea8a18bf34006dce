//! User profile, role, quota, and usage-statistics types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Access level of a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("invalid user role: '{other}'")),
        }
    }
}

/// Profile of an authenticated user. Identity comes from outside Parley.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

/// Per-user settings and the daily message counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: Uuid,
    pub daily_message_limit: u32,
    pub messages_sent_today: u32,
    pub last_message_date: Option<NaiveDate>,
    pub chat_background: Option<String>,
}

impl UserSettings {
    pub fn new(user_id: Uuid, daily_message_limit: u32) -> Self {
        Self {
            user_id,
            daily_message_limit,
            messages_sent_today: 0,
            last_message_date: None,
            chat_background: None,
        }
    }

    /// Messages sent on `today`; a counter from an earlier day reads as zero.
    pub fn sent_on(&self, today: NaiveDate) -> u32 {
        match self.last_message_date {
            Some(date) if date >= today => self.messages_sent_today,
            _ => 0,
        }
    }

    pub fn can_send_on(&self, today: NaiveDate) -> bool {
        self.sent_on(today) < self.daily_message_limit
    }

    /// Bump the counter for `today`, resetting it on a new day.
    pub fn record_sent_on(&mut self, today: NaiveDate) {
        self.messages_sent_today = self.sent_on(today) + 1;
        self.last_message_date = Some(today);
    }
}

/// How often one user picked one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub model_name: String,
    pub usage_count: u64,
}

/// Message count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub messages: u64,
}

/// Aggregate usage statistics for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_chats: u64,
    pub total_messages: u64,
    pub model_usage: Vec<ModelUsage>,
    /// Oldest day first, one entry per day including empty days.
    pub last_7_days: Vec<DailyActivity>,
}
