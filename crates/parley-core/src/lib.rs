//! Business logic and repository trait definitions for Parley.
//!
//! This crate holds the conversation context manager and defines the
//! "ports" (repository, store, and provider traits) that the infrastructure
//! layer implements. It depends only on `parley-types` -- never on
//! `parley-infra` or any database/IO crate.

pub mod chat;
pub mod context;
pub mod llm;
pub mod profile;

#[cfg(test)]
pub(crate) mod testing;
