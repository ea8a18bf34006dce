//! Welcome banner display for chat sessions.

use console::style;
use uuid::Uuid;

use crate::cli::display::short_id;

/// Print the welcome banner at the start of a chat session.
pub fn print_welcome_banner(title: &str, model: &str, chat_id: &Uuid, resumed: bool) {
    println!();
    println!("  {} {}", style("*").cyan(), style(title).cyan().bold());
    if resumed {
        println!("  {}", style("Continuing an earlier conversation").dim());
    }
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model).dim());
    println!("  {}   {}", style("Chat:").bold(), style(short_id(chat_id)).dim());
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
