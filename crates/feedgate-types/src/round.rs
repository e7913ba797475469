//! Round-indexed feed readings

use serde::{Deserialize, Serialize};

/// Round identifier assigned by a data source
pub type RoundId = u64;

/// Signed feed value
pub type Answer = i128;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// One published reading
///
/// Produced and owned by the data source. The proxy only relays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Round {
    /// Round identifier
    pub round_id: RoundId,
    /// Reported value
    pub answer: Answer,
    /// When the round started
    pub started_at: Timestamp,
    /// When the round was last updated
    pub updated_at: Timestamp,
}

impl Round {
    /// Create a round
    #[inline]
    #[must_use]
    pub const fn new(
        round_id: RoundId,
        answer: Answer,
        started_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            round_id,
            answer,
            started_at,
            updated_at,
        }
    }
}
