//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a noun-verb
//! pattern (e.g., `parley chats list`, `parley folders create`).

pub mod chat;
pub mod chats;
pub mod display;
pub mod folders;
pub mod models;
pub mod stats;
pub mod users;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use uuid::Uuid;

/// Chat with LLMs through a managed conversation context.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Continue an existing chat instead of creating one.
        #[arg(long)]
        chat: Option<Uuid>,

        /// Model to use (see `parley models`).
        #[arg(long, short)]
        model: Option<String>,
    },

    /// Manage chats.
    Chats {
        #[command(subcommand)]
        action: ChatsAction,
    },

    /// Manage chat folders.
    Folders {
        #[command(subcommand)]
        action: FoldersAction,
    },

    /// List the selectable models.
    Models,

    /// Show your usage statistics.
    Stats,

    /// Administer user roles (admin only).
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Start the HTTP proxy.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8787")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Chat list ordering.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortOrder {
    /// Folder view order.
    #[default]
    Position,
    /// Most recently active first.
    Recent,
}

#[derive(Subcommand)]
pub enum ChatsAction {
    /// List your chats.
    #[command(alias = "ls")]
    List {
        #[arg(long, value_enum, default_value_t = SortOrder::Position)]
        sort: SortOrder,

        /// Only chats in this folder.
        #[arg(long)]
        folder: Option<Uuid>,
    },

    /// Rename a chat.
    Rename { id: Uuid, title: String },

    /// Delete a chat with its messages and digest.
    #[command(alias = "rm")]
    Delete {
        id: Uuid,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Move a chat into a folder, or out of any folder when omitted.
    Move {
        id: Uuid,

        #[arg(long)]
        folder: Option<Uuid>,
    },
}

#[derive(Subcommand)]
pub enum FoldersAction {
    /// List your folders.
    #[command(alias = "ls")]
    List,

    /// Create a folder.
    Create {
        name: String,

        /// Hex color, e.g. #3B82F6.
        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// Rename a folder.
    Rename { id: Uuid, name: String },

    /// Delete a folder. Its chats are kept and moved out of it.
    #[command(alias = "rm")]
    Delete {
        id: Uuid,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List all users.
    #[command(alias = "ls")]
    List,

    /// Change a user's role.
    Promote {
        id: Uuid,

        /// Role to assign: user or admin.
        #[arg(long, default_value = "admin")]
        role: String,
    },
}
