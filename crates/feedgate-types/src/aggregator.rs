//! Data source contract
//!
//! An [`Aggregator`] is the external collaborator that publishes rounds. The proxy consumes this
//! interface and relays results unchanged, errors included.

use crate::address::Address;
use crate::round::{Answer, Round, RoundId, Timestamp};

/// Errors raised by a data source
///
/// The proxy never reinterprets these; they reach the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Nothing has been published yet
    #[error("no data present")]
    NoData,

    /// The requested round was never published
    #[error("round {0} not found")]
    RoundNotFound(RoundId),

    /// The source could not answer
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

/// Round-indexed data source
pub trait Aggregator: Send + Sync {
    /// Identity of this source
    fn address(&self) -> Address;

    /// Answer of the latest round
    fn latest_answer(&self) -> Result<Answer, SourceError>;

    /// Update time of the latest round
    fn latest_timestamp(&self) -> Result<Timestamp, SourceError>;

    /// Identifier of the latest round
    fn latest_round(&self) -> Result<RoundId, SourceError>;

    /// Answer of a specific round
    fn get_answer(&self, round_id: RoundId) -> Result<Answer, SourceError>;

    /// Update time of a specific round
    fn get_timestamp(&self, round_id: RoundId) -> Result<Timestamp, SourceError>;

    /// Full data of the latest round
    fn latest_round_data(&self) -> Result<Round, SourceError>;

    /// Full data of a specific round
    fn get_round_data(&self, round_id: RoundId) -> Result<Round, SourceError>;

    /// Number of decimals in answers
    fn decimals(&self) -> Result<u8, SourceError>;

    /// Human-readable feed description
    fn description(&self) -> Result<String, SourceError>;

    /// Source implementation version
    fn version(&self) -> Result<u64, SourceError>;
}
