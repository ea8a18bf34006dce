//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across Parley:
//! conversation turns and digests, chats and folders, user profiles,
//! LLM request/response shapes, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod model;
pub mod profile;
