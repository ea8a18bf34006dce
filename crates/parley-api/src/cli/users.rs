//! Admin commands: list users and change roles.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use parley_types::profile::UserRole;

use super::display::format_relative_time;
use crate::state::AppState;

pub async fn list_users(state: &AppState, json: bool) -> Result<()> {
    let actor = state.current_user().await?;
    let profiles = state.profile_service.list_profiles_as(actor.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Email").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Joined").fg(Color::White),
    ]);

    for profile in &profiles {
        let role = match profile.role {
            UserRole::Admin => Cell::new("admin").fg(Color::Yellow),
            UserRole::User => Cell::new("user"),
        };
        table.add_row(vec![
            Cell::new(profile.display_name()).fg(Color::Cyan),
            Cell::new(&profile.email),
            role,
            Cell::new(profile.id.to_string()).fg(Color::DarkGrey),
            Cell::new(format_relative_time(&profile.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn set_role(state: &AppState, target: Uuid, role: &str, json: bool) -> Result<()> {
    let role: UserRole = role.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let actor = state.current_user().await?;
    let profile = state
        .profile_service
        .set_role_as(actor.id, target, role)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!(
            "  {} {} is now {}",
            style("✓").green().bold(),
            style(profile.display_name()).cyan(),
            style(profile.role).bold()
        );
    }
    Ok(())
}
