//! Chats, folders, messages, and the per-turn dialog flow.
//!
//! - `repository`: persistence ports implemented by parley-infra
//! - `service`: user-scoped CRUD and conversation loading
//! - `dialog`: one user turn end to end

pub mod dialog;
pub mod repository;
pub mod service;
