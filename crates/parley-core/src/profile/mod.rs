//! User profiles, roles, and daily quotas.

pub mod repository;
pub mod service;
