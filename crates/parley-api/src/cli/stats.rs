//! `parley stats`: totals, per-model usage, and the last seven days.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use parley_types::model::find_model;
use parley_types::profile::DailyActivity;

use crate::state::AppState;

/// Widest bar in the activity chart.
const BAR_WIDTH: u64 = 30;

pub async fn show_stats(state: &AppState, json: bool) -> Result<()> {
    let user = state.current_user().await?;
    let stats = state.profile_service.user_stats(user.id).await?;
    let settings = state.profile_service.settings(user.id).await?;
    let today = chrono::Utc::now().date_naive();

    if json {
        let body = serde_json::json!({
            "stats": stats,
            "messages_sent_today": settings.sent_on(today),
            "daily_message_limit": settings.daily_message_limit,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Stats for").bold(),
        style(user.display_name()).cyan().bold()
    );
    println!();
    println!("  {}     {}", style("Chats:").bold(), stats.total_chats);
    println!("  {}  {}", style("Messages:").bold(), stats.total_messages);
    println!(
        "  {}     {}/{}",
        style("Today:").bold(),
        settings.sent_on(today),
        settings.daily_message_limit
    );
    println!();

    if !stats.model_usage.is_empty() {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Model").fg(Color::White),
            Cell::new("Requests").fg(Color::White),
        ]);
        for usage in &stats.model_usage {
            let label = find_model(&usage.model_name)
                .map(|m| m.name.to_string())
                .unwrap_or_else(|| usage.model_name.clone());
            table.add_row(vec![
                Cell::new(label).fg(Color::Cyan),
                Cell::new(usage.usage_count),
            ]);
        }
        println!("{table}");
        println!();
    }

    println!("  {}", style("── Last 7 days ──").dim());
    for line in activity_chart(&stats.last_7_days) {
        println!("  {line}");
    }
    println!();
    Ok(())
}

/// One line per day, bars scaled to the busiest day.
fn activity_chart(days: &[DailyActivity]) -> Vec<String> {
    let peak = days.iter().map(|d| d.messages).max().unwrap_or(0).max(1);
    days.iter()
        .map(|day| {
            let width = (day.messages * BAR_WIDTH).div_ceil(peak) as usize;
            format!(
                "{} {:<width$} {}",
                day.date.format("%a %d"),
                "█".repeat(width),
                day.messages,
                width = BAR_WIDTH as usize
            )
        })
        .collect()
}
