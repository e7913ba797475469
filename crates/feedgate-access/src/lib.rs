//! Feedgate Access Control
//!
//! Privilege checks for the feedgate proxy:
//! - [`Ownership`]: single owner with two-step (nominate, accept) transfer
//! - [`MaintainerRole`]: identity allowed to swap the whitelist
//! - [`WhitelistGate`]: fail-closed read gate over a [`feedgate_types::Whitelist`]
//!
//! The three checks are independent; none implies another.

#![warn(missing_docs)]

pub mod error;
pub mod gate;
pub mod maintainer;
pub mod ownership;

// Re-exports
pub use error::AccessError;
pub use gate::WhitelistGate;
pub use maintainer::MaintainerRole;
pub use ownership::{Ownership, OwnershipHandoff};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
