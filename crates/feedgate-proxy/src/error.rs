//! Error types for the feedgate proxy
//!
//! Covers:
//! - Authorization failures (whitelist, owner, maintainer)
//! - Migration protocol violations
//! - Data source errors, relayed unchanged
//! - Configuration and audit journal failures

use crate::migration::MigrationState;
use feedgate_access::AccessError;
use feedgate_types::{Address, SourceError};

/// Main proxy error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// Caller failed an access check
    #[error(transparent)]
    Access(#[from] AccessError),

    /// A proposed-source read with nothing proposed
    #[error("no aggregator proposal is pending")]
    NoProposalPending,

    /// Confirmation named a different source than the one pending
    #[error("confirmation of {expected} does not match pending proposal {pending:?}")]
    ProposalMismatch {
        /// Address the caller tried to confirm
        expected: Address,
        /// Address actually pending, if any
        pending: Option<Address>,
    },

    /// Proposal of the source that is already active
    #[error("aggregator {0} is already the active source")]
    AlreadyActive(Address),

    /// Migration state machine refused a transition
    #[error("illegal migration transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// State before
        from: MigrationState,
        /// Requested state
        to: MigrationState,
    },

    /// Error raised by the backing data source
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ProxyError {
    /// Check if the caller lacked the required privilege
    #[inline]
    #[must_use]
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::Access(_))
    }

    /// Check if the failure came from the data source rather than the proxy
    #[inline]
    #[must_use]
    pub fn is_source_failure(&self) -> bool {
        matches!(self, Self::Source(_))
    }

    /// Check if this is a whitelist denial
    #[inline]
    #[must_use]
    pub fn is_not_whitelisted(&self) -> bool {
        matches!(self, Self::Access(AccessError::NotWhitelisted { .. }))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`crate::ProxyConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but violates a constraint
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Audit journal errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalError {
    /// Hash chain broken at the given sequence number
    #[error("journal integrity violation at sequence {sequence}")]
    IntegrityViolation {
        /// First entry that failed verification
        sequence: u64,
    },
}
