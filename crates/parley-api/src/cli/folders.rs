//! Folder management commands: list, create, rename, delete.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use parley_types::chat::{ChatOrder, FolderUpdate};

use super::display::spinner;
use crate::state::AppState;

pub async fn list_folders(state: &AppState, json: bool) -> Result<()> {
    let user = state.current_user().await?;
    let folders = state.chat_service.list_folders(user.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
        return Ok(());
    }

    if folders.is_empty() {
        println!();
        println!(
            "  {} No folders. Create one with: {}",
            style("i").blue().bold(),
            style("parley folders create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let chats = state
        .chat_service
        .list_chats(user.id, ChatOrder::Position)
        .await?;

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Color").fg(Color::White),
        Cell::new("Chats").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for folder in &folders {
        let count = chats
            .iter()
            .filter(|c| c.folder_id == Some(folder.id))
            .count();
        let name_cell = match parse_hex_color(&folder.color) {
            Some((r, g, b)) => Cell::new(&folder.name).fg(Color::Rgb { r, g, b }),
            None => Cell::new(&folder.name),
        };
        table.add_row(vec![
            name_cell,
            Cell::new(&folder.color),
            Cell::new(count),
            Cell::new(folder.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

pub async fn create_folder(
    state: &AppState,
    name: &str,
    color: Option<String>,
    icon: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(c) = color.as_deref()
        && parse_hex_color(c).is_none()
    {
        anyhow::bail!("'{c}' is not a #RRGGBB color");
    }

    let user = state.current_user().await?;
    let folder = state
        .chat_service
        .create_folder(user.id, name, color, icon)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&folder)?);
    } else {
        println!(
            "  {} Folder '{}' created",
            style("✓").green().bold(),
            style(&folder.name).cyan()
        );
        println!("  {}  {}", style("ID:").bold(), style(folder.id).dim());
    }
    Ok(())
}

pub async fn rename_folder(state: &AppState, id: Uuid, name: &str, json: bool) -> Result<()> {
    let user = state.current_user().await?;
    let update = FolderUpdate {
        name: Some(name.trim().to_string()),
        ..Default::default()
    };
    let folder = state.chat_service.update_folder(user.id, id, update).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&folder)?);
    } else {
        println!(
            "  {} Folder renamed to '{}'",
            style("✓").green().bold(),
            style(&folder.name).cyan()
        );
    }
    Ok(())
}

/// Delete a folder; its chats move out of it.
pub async fn delete_folder(state: &AppState, id: Uuid, force: bool, json: bool) -> Result<()> {
    let user = state.current_user().await?;
    let folder = state.chat_service.get_folder(user.id, id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete folder '{}'? Its chats will be kept.",
                style(&folder.name).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let progress = spinner(format!("Deleting {}...", folder.name));
    let detached = state.chat_service.delete_folder(user.id, id).await?;
    progress.finish_and_clear();

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "id": id, "chats_detached": detached})
        );
    } else {
        println!(
            "  {} Folder '{}' deleted, {} chat{} moved out",
            style("✓").red().bold(),
            folder.name,
            detached,
            if detached == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

/// Parse `#RRGGBB` into its components.
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
