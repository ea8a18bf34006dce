//! HTTP proxy layer for Parley.
//!
//! Axum-based API at `/api/v1/` with permissive CORS. `/chat` forwards a
//! caller-managed history to the gateway; `/conversations` keeps history
//! server-side and compacts it with the context manager.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod state;
