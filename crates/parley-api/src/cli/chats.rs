//! Chat management commands: list, rename, delete, move.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use parley_types::chat::{Chat, ChatFolder, ChatOrder};

use super::SortOrder;
use super::display::{format_relative_time, short_id, spinner, truncate};
use crate::state::AppState;

impl From<SortOrder> for ChatOrder {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Position => ChatOrder::Position,
            SortOrder::Recent => ChatOrder::Recent,
        }
    }
}

/// List the current user's chats in a table.
pub async fn list_chats(
    state: &AppState,
    sort: SortOrder,
    folder: Option<Uuid>,
    json: bool,
) -> Result<()> {
    let user = state.current_user().await?;
    let mut chats = state.chat_service.list_chats(user.id, sort.into()).await?;
    if let Some(folder_id) = folder {
        chats.retain(|c| c.folder_id == Some(folder_id));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!();
        println!(
            "  {} No chats yet. Start one with: {}",
            style("i").blue().bold(),
            style("parley chat").yellow()
        );
        println!();
        return Ok(());
    }

    let folders = state.chat_service.list_folders(user.id).await?;

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Folder").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for chat in &chats {
        table.add_row(vec![
            Cell::new(truncate(&chat.title, 50)).fg(Color::Cyan),
            Cell::new(folder_label(chat, &folders)),
            Cell::new(chat.id.to_string()).fg(Color::DarkGrey),
            Cell::new(format_relative_time(&chat.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} chat{}",
        style(chats.len()).bold(),
        if chats.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn folder_label(chat: &Chat, folders: &[ChatFolder]) -> String {
    match chat.folder_id {
        Some(id) => folders
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| short_id(&id)),
        None => "-".to_string(),
    }
}

pub async fn rename_chat(state: &AppState, id: Uuid, title: &str, json: bool) -> Result<()> {
    let user = state.current_user().await?;
    let chat = state.chat_service.rename_chat(user.id, id, title).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chat)?);
    } else {
        println!(
            "  {} Chat renamed to '{}'",
            style("✓").green().bold(),
            style(&chat.title).cyan()
        );
    }
    Ok(())
}

/// Delete a chat after confirmation (skipped with `--force` or `--json`).
pub async fn delete_chat(state: &AppState, id: Uuid, force: bool, json: bool) -> Result<()> {
    let user = state.current_user().await?;
    let chat = state.chat_service.get_chat(user.id, id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete chat '{}' and all its messages?",
                style(&chat.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let progress = spinner(format!("Deleting {}...", chat.title));
    state.chat_service.delete_chat(user.id, id).await?;
    progress.finish_and_clear();

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!(
            "  {} Chat '{}' deleted.",
            style("✓").red().bold(),
            chat.title
        );
    }
    Ok(())
}

pub async fn move_chat(
    state: &AppState,
    id: Uuid,
    folder: Option<Uuid>,
    json: bool,
) -> Result<()> {
    let user = state.current_user().await?;
    let chat = state
        .chat_service
        .move_chat_to_folder(user.id, id, folder)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chat)?);
        return Ok(());
    }

    match folder {
        Some(folder_id) => {
            let target = state.chat_service.get_folder(user.id, folder_id).await?;
            println!(
                "  {} Moved '{}' to {}",
                style("✓").green().bold(),
                chat.title,
                style(&target.name).cyan()
            );
        }
        None => println!(
            "  {} Moved '{}' out of its folder",
            style("✓").green().bold(),
            chat.title
        ),
    }
    Ok(())
}
