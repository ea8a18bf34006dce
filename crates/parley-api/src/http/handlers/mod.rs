//! HTTP handler modules, one per resource.

pub mod chat;
pub mod conversation;
pub mod health;
pub mod models;
