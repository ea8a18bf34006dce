//! Main chat loop orchestration.
//!
//! Resolves the user and chat, prints the banner, then reads input until
//! Ctrl+D or `/exit`. Each message runs one dialog turn; slash commands
//! switch models, show history and the digest, or stage attachments.

use std::path::PathBuf;
use std::time::Instant;

use console::style;
use tracing::{info, warn};
use uuid::Uuid;

use parley_core::context::CompactionOutcome;
use parley_infra::filesystem::load_attachment;
use parley_types::chat::DEFAULT_CHAT_TITLE;
use parley_types::context::TurnRole;
use parley_types::error::{ChatError, ContextError, ProfileError};
use parley_types::llm::Attachment;
use parley_types::model::{MODEL_CATALOG, find_model};

use crate::cli::display::{spinner, truncate};
use crate::state::{AppState, ConcreteDialogService};

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

/// Longest title derived from the first message.
const AUTO_TITLE_CHARS: usize = 50;

/// Everything the loop needs for one chat.
struct ChatSession<'a> {
    state: &'a AppState,
    dialog: ConcreteDialogService,
    user_id: Uuid,
    chat_id: Uuid,
    title: String,
    pending_attachments: Vec<Attachment>,
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(
    state: &AppState,
    chat_id: Option<Uuid>,
    model: Option<String>,
) -> anyhow::Result<()> {
    let user = state.current_user().await?;
    let dialog = state.dialog_service()?;

    let (chat, resumed) = match chat_id {
        Some(id) => (state.chat_service.get_chat(user.id, id).await?, true),
        None => (state.chat_service.create_chat(user.id, None).await?, false),
    };

    let mut session = ChatSession {
        state,
        dialog,
        user_id: user.id,
        chat_id: chat.id,
        title: chat.title.clone(),
        pending_attachments: Vec::new(),
    };

    if let Some(model) = model {
        warn_unknown_model(&model);
        session.switch_model(&model).await?;
    }
    let current_model = session.dialog.current_model(user.id, chat.id).await?;
    print_welcome_banner(&chat.title, &current_model, &chat.id, resumed);

    let renderer = ChatRenderer::new();
    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }
                if let Some(cmd) = commands::parse(&text) {
                    if cmd == ChatCommand::Exit {
                        println!("\n  {}", style("Session ended.").dim());
                        break;
                    }
                    if cmd == ChatCommand::Clear {
                        chat_input.clear();
                        continue;
                    }
                    if let Err(e) = session.run_command(cmd, &renderer).await {
                        println!("\n  {} {e}\n", style("!").red().bold());
                    }
                    continue;
                }
                session.send(&text, &renderer).await;
            }
        }
    }

    chat_input.flush();
    info!(chat_id = %session.chat_id, "Chat session ended");
    Ok(())
}

fn warn_unknown_model(model: &str) {
    if find_model(model).is_none() {
        println!(
            "  {} '{}' is not in the model catalog; the gateway may reject it.",
            style("!").yellow().bold(),
            model
        );
    }
}

impl ChatSession<'_> {
    /// Run one dialog turn and print the reply or the failure.
    async fn send(&mut self, text: &str, renderer: &ChatRenderer) {
        let attachments = std::mem::take(&mut self.pending_attachments);
        let progress = spinner("thinking...");
        let start = Instant::now();
        let result = self
            .dialog
            .send_message(self.user_id, self.chat_id, text, attachments.clone(), None)
            .await;
        progress.finish_and_clear();

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                print_turn_error(&e);
                // Attachments were not consumed unless the message was stored.
                if matches!(
                    e,
                    ChatError::Context(ContextError::Busy(_))
                        | ChatError::Profile(ProfileError::DailyLimitReached { .. })
                        | ChatError::InvalidInput(_)
                ) {
                    self.pending_attachments = attachments;
                }
                return;
            }
        };

        let model = reply.message.model.clone().unwrap_or_default();
        println!("\n  {}", style("Assistant").cyan().bold());
        println!("  {}", renderer.render_final(&reply.message.content).trim());
        renderer.print_stats_footer(
            reply.usage.input_tokens,
            reply.usage.output_tokens,
            start.elapsed().as_millis() as u64,
            &model,
        );
        if reply.compacted {
            println!(
                "  {}",
                style("Earlier turns were folded into a summary (/summary to view).").dim()
            );
        }
        println!();

        if self.title == DEFAULT_CHAT_TITLE && !text.trim().is_empty() {
            let title = truncate(text.trim(), AUTO_TITLE_CHARS);
            match self
                .state
                .chat_service
                .rename_chat(self.user_id, self.chat_id, &title)
                .await
            {
                Ok(chat) => self.title = chat.title,
                Err(e) => warn!(error = %e, "Failed to set chat title"),
            }
        }
    }

    async fn run_command(&mut self, cmd: ChatCommand, renderer: &ChatRenderer) -> anyhow::Result<()> {
        match cmd {
            ChatCommand::Help => commands::print_help(),
            ChatCommand::Model(None) => {
                let model = self.dialog.current_model(self.user_id, self.chat_id).await?;
                let name = find_model(&model).map(|m| m.name).unwrap_or("custom model");
                println!("\n  {} {} ({})\n", style("Model:").bold(), style(&model).cyan(), name);
            }
            ChatCommand::Model(Some(model)) => {
                warn_unknown_model(&model);
                self.switch_model(&model).await?;
            }
            ChatCommand::Models => {
                let current = self.dialog.current_model(self.user_id, self.chat_id).await?;
                println!();
                for model in MODEL_CATALOG {
                    let marker = if model.id == current { "*" } else { " " };
                    println!(
                        "  {} {:<36} {}",
                        style(marker).green().bold(),
                        style(model.id).cyan(),
                        style(model.name).dim()
                    );
                }
                println!();
            }
            ChatCommand::History => {
                let messages = self
                    .state
                    .chat_service
                    .messages(self.user_id, self.chat_id)
                    .await?;
                println!();
                if messages.is_empty() {
                    println!("  {}", style("No messages yet.").dim());
                }
                for msg in &messages {
                    let label = match msg.role {
                        TurnRole::User => style("You").green().bold(),
                        TurnRole::Assistant => style("Assistant").cyan().bold(),
                    };
                    let clip = if msg.attachments.is_empty() {
                        String::new()
                    } else {
                        format!(" [{} file(s)]", msg.attachments.len())
                    };
                    println!("  {label} {}{}", truncate(&msg.content, 100), style(clip).dim());
                }
                println!();
            }
            ChatCommand::Summary => {
                match self.dialog.digest(self.user_id, self.chat_id).await? {
                    Some(digest) => {
                        println!(
                            "\n  {} (covers the first {} turns)\n",
                            style("Summary").bold(),
                            digest.covers_up_to
                        );
                        println!("  {}\n", renderer.render_final(&digest.text).trim());
                    }
                    None => println!("\n  {}\n", style("No summary yet.").dim()),
                }
            }
            ChatCommand::Attach(path) => {
                let path = expand_home(&path);
                let attachment = load_attachment(&path).await?;
                println!(
                    "\n  {} {}\n",
                    style("+").green().bold(),
                    style(attachment.describe()).dim()
                );
                self.pending_attachments.push(attachment);
            }
            ChatCommand::Unknown(name) => {
                println!(
                    "\n  {} Unknown command: {}. Type /help for available commands.\n",
                    style("?").yellow().bold(),
                    style(name).dim()
                );
            }
            ChatCommand::Exit | ChatCommand::Clear => {}
        }
        Ok(())
    }

    async fn switch_model(&mut self, model: &str) -> anyhow::Result<()> {
        let progress = spinner("switching model...");
        let outcome = self
            .dialog
            .switch_model(self.user_id, self.chat_id, model)
            .await;
        progress.finish_and_clear();

        match outcome? {
            CompactionOutcome::Skipped => {
                println!("\n  {} Using {}\n", style("*").cyan(), style(model).cyan());
            }
            CompactionOutcome::Compacted { covers_up_to, persisted } => {
                println!(
                    "\n  {} Switched to {}; {} earlier turns summarized.",
                    style("✓").green().bold(),
                    style(model).cyan(),
                    covers_up_to
                );
                if !persisted {
                    println!("  {}", style("The summary could not be saved and lives in memory only.").dim());
                }
                println!();
            }
            CompactionOutcome::Failed(e) => {
                println!(
                    "\n  {} Switched to {}, but summarizing failed ({e}). It will be retried on your next message.\n",
                    style("!").yellow().bold(),
                    style(model).cyan()
                );
            }
        }
        Ok(())
    }
}

fn print_turn_error(err: &ChatError) {
    match err {
        ChatError::Profile(ProfileError::DailyLimitReached { limit }) => {
            eprintln!(
                "\n  {} Daily limit of {limit} messages reached. Try again tomorrow.\n",
                style("!").yellow().bold()
            );
        }
        ChatError::Context(ContextError::Busy(_)) => {
            eprintln!(
                "\n  {} This chat is busy with another request.\n",
                style("!").yellow().bold()
            );
        }
        ChatError::Completion(e) => {
            eprintln!("\n  {} LLM error: {e}", style("!").red().bold());
            eprintln!(
                "  {}\n",
                style("Your message was saved. Type a message to retry, /exit to quit.").dim()
            );
        }
        other => eprintln!("\n  {} {other}\n", style("!").red().bold()),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
        assert_eq!(expand_home("rel/a.png"), PathBuf::from("rel/a.png"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a.png"), home.join("a.png"));
        }
    }
}
