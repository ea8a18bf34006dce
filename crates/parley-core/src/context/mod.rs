//! Conversation context management.
//!
//! - `estimator`: size measures for the compaction trigger
//! - `summarizer`: digest generation through the LLM gateway
//! - `assembler`: builds the outbound message list
//! - `store`: digest persistence port
//! - `manager`: compaction policy and per-conversation state machine
//! - `registry`: per-conversation locks

pub mod assembler;
pub mod conversation;
pub mod estimator;
pub mod manager;
pub mod registry;
pub mod store;
pub mod summarizer;

pub use conversation::{Conversation, ConversationState};
pub use manager::{CompactionOutcome, ContextManager, ContextManagerConfig};
pub use registry::{ConversationLease, ConversationRegistry};
pub use store::{InMemorySummaryStore, SummaryStore};
pub use summarizer::{LlmSummarizer, Summarizer};
