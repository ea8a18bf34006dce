//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`:
//! SQLite storage, the OpenAI-compatible gateway client, the config loader,
//! and filesystem helpers.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod sqlite;
