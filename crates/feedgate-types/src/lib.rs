//! Feedgate Types
//!
//! Shared vocabulary for the feedgate proxy:
//! - [`Address`]: 20-byte identities for callers and collaborators
//! - [`Round`]: one published feed reading
//! - [`Aggregator`]: the data source contract the proxy forwards to
//! - [`Whitelist`]: the membership oracle the proxy consults before reads
//!
//! # Example
//!
//! ```rust
//! use feedgate_types::{Address, Aggregator, MemoryAggregator};
//!
//! let source = MemoryAggregator::new(Address::from_low_u64(1), 8);
//! let round_id = source.publish(54321, 677, 678);
//! assert_eq!(source.get_answer(round_id), Ok(54321));
//! ```

#![warn(missing_docs)]

pub mod address;
pub mod aggregator;
pub mod memory;
pub mod round;
pub mod whitelist;

// Re-exports
pub use address::{Address, AddressParseError, ADDRESS_LEN};
pub use aggregator::{Aggregator, SourceError};
pub use memory::{MemoryAggregator, MemoryWhitelist, WhitelistAdminError};
pub use round::{Answer, Round, RoundId, Timestamp};
pub use whitelist::Whitelist;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
