//! Conversation size estimation.
//!
//! Estimates are deterministic and never decrease when a turn is appended,
//! so the compaction trigger can compare them against a fixed threshold.

use parley_types::config::EstimatorKind;
use parley_types::context::Turn;

/// Approximate characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Fixed per-message overhead added by chat formatting.
pub const PER_TURN_OVERHEAD: usize = 4;

/// Size measure used by the compaction trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeEstimator {
    #[default]
    TurnCount,
    ApproxTokens,
}

impl From<EstimatorKind> for SizeEstimator {
    fn from(kind: EstimatorKind) -> Self {
        match kind {
            EstimatorKind::TurnCount => SizeEstimator::TurnCount,
            EstimatorKind::ApproxTokens => SizeEstimator::ApproxTokens,
        }
    }
}

impl SizeEstimator {
    pub fn estimate(&self, turns: &[Turn]) -> usize {
        match self {
            SizeEstimator::TurnCount => turns.len(),
            SizeEstimator::ApproxTokens => turns.iter().map(estimate_turn_tokens).sum(),
        }
    }
}

/// Rough token count for one turn: `ceil(chars / 4)` plus overhead.
pub fn estimate_turn_tokens(turn: &Turn) -> usize {
    turn.content.chars().count().div_ceil(CHARS_PER_TOKEN) + PER_TURN_OVERHEAD
}
