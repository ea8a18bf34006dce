//! Interactive CLI chat for Parley.
//!
//! Implements the chat loop: markdown rendering of replies, a thinking
//! spinner, the welcome banner, slash commands (model switching, history,
//! digest inspection, attachments). Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
