//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls: switching models,
//! inspecting history and the current digest, attaching files.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Show the current model, or switch to another one.
    Model(Option<String>),
    /// List selectable models.
    Models,
    /// Show the messages of this chat.
    History,
    /// Show the digest standing in for older turns.
    Summary,
    /// Attach a local file to the next message.
    Attach(String),
    /// Unknown command or missing argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd.to_lowercase(), Some(rest.trim()).filter(|a| !a.is_empty())),
        None => (trimmed.to_lowercase(), None),
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/model" | "/m" => ChatCommand::Model(arg.map(str::to_string)),
        "/models" => ChatCommand::Models,
        "/history" => ChatCommand::History,
        "/summary" | "/digest" => ChatCommand::Summary,
        "/attach" | "/a" => match arg {
            Some(path) => ChatCommand::Attach(path.to_string()),
            None => ChatCommand::Unknown("/attach requires a file path".to_string()),
        },
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/model [id]", "Show or switch the model (folds history into a summary)"),
        ("/models", "List available models"),
        ("/history", "Show the messages of this chat"),
        ("/summary", "Show the summary of earlier turns"),
        ("/attach <path>", "Attach a file to your next message"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat session"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, description) in rows {
        println!("  {:<16} {}", style(cmd).cyan(), description);
    }
    println!();
    println!(
        "  {}",
        style("Ctrl+D to exit, Ctrl+C safe (no message loss)").dim()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/q"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_model() {
        assert_eq!(parse("/model"), Some(ChatCommand::Model(None)));
        assert_eq!(
            parse("/model   openai/o3 "),
            Some(ChatCommand::Model(Some("openai/o3".to_string())))
        );
        assert_eq!(parse("/models"), Some(ChatCommand::Models));
    }

    #[test]
    fn test_parse_summary_aliases() {
        assert_eq!(parse("/summary"), Some(ChatCommand::Summary));
        assert_eq!(parse("/digest"), Some(ChatCommand::Summary));
        assert_eq!(parse("/HISTORY"), Some(ChatCommand::History));
    }

    #[test]
    fn test_parse_attach() {
        assert_eq!(
            parse("/attach ~/pics/cat 1.png"),
            Some(ChatCommand::Attach("~/pics/cat 1.png".to_string()))
        );
        assert!(matches!(parse("/attach"), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
        assert_eq!(parse("  what is 1/2?"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
