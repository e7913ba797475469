//! Feedgate Proxy
//!
//! Whitelist-gated indirection in front of a round-indexed data feed, with a two-phase
//! (propose, confirm) protocol for swapping the backing source:
//! 1. **Reads**: whitelist gate, then exact pass-through to the active (or proposed) source
//! 2. **Administration**: owner or maintainer check, then an atomic state change recorded in
//!    the audit journal
//!
//! # Quick Start
//!
//! ```rust
//! use feedgate_proxy::prelude::*;
//! use feedgate_types::{Address, MemoryAggregator, MemoryWhitelist};
//! use std::sync::Arc;
//!
//! let owner = Address::from_low_u64(1);
//! let reader = Address::from_low_u64(2);
//!
//! let feed_a = Arc::new(MemoryAggregator::new(Address::from_low_u64(0xa), 8));
//! feed_a.publish(54321, 677, 678);
//! let whitelist = Arc::new(MemoryWhitelist::new(Address::from_low_u64(0xc), owner).with_members([reader]));
//!
//! let proxy = WhitelistedFeedProxy::new(feed_a, whitelist, owner);
//! assert_eq!(proxy.latest_answer(&reader), Ok(54321));
//!
//! let feed_b = Arc::new(MemoryAggregator::new(Address::from_low_u64(0xb), 8));
//! proxy.propose_aggregator(&owner, feed_b).unwrap();
//! proxy.confirm_aggregator(&owner, &Address::from_low_u64(0xb)).unwrap();
//! assert_eq!(proxy.aggregator(), Address::from_low_u64(0xb));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod binding;
pub mod config;
pub mod error;
pub mod journal;
pub mod migration;
pub mod proxy;
pub mod simulator;

// Re-exports
pub use binding::DataSourceBinding;
pub use config::ProxyConfig;
pub use error::{ConfigError, JournalError, ProxyError};
pub use journal::{EventJournal, JournalEntry, ProxyEvent};
pub use migration::{MigrationState, Promotion, Proposal};
pub use proxy::{ProxySnapshot, WhitelistedFeedProxy};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the proxy
    pub use crate::{
        MigrationState, ProxyConfig, ProxyError, ProxyEvent, ProxySnapshot, WhitelistedFeedProxy,
    };
    pub use feedgate_access::AccessError;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
