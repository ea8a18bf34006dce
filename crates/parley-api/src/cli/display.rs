//! Formatting helpers shared by the CLI commands.

use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

/// Steady-ticking spinner with a message, cleared by the caller.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    format_relative_time_at(dt, Utc::now())
}

fn format_relative_time_at(dt: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

/// First eight characters of an id, enough to tell rows apart.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Truncate to at most `max` characters, appending "..." when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(format_relative_time_at(&now, now), "just now");
        assert_eq!(
            format_relative_time_at(&(now - TimeDelta::minutes(5)), now),
            "5m ago"
        );
        assert_eq!(
            format_relative_time_at(&(now - TimeDelta::hours(3)), now),
            "3h ago"
        );
        assert_eq!(
            format_relative_time_at(&(now - TimeDelta::days(2)), now),
            "2d ago"
        );
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Привет, как дела?", 10), "Привет,...");
    }

    #[test]
    fn test_short_id() {
        let id = Uuid::nil();
        assert_eq!(short_id(&id), "00000000");
    }
}
