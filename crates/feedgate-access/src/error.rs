//! Authorization errors

use feedgate_types::Address;

/// Authorization failure on a gated call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Caller failed the whitelist check on a read
    #[error("{caller} is not whitelisted")]
    NotWhitelisted {
        /// Rejected caller
        caller: Address,
    },

    /// Caller is not the owner
    #[error("{caller} is not the owner")]
    NotOwner {
        /// Rejected caller
        caller: Address,
    },

    /// Caller is not the whitelist maintainer
    #[error("{caller} is not the whitelist maintainer")]
    NotMaintainer {
        /// Rejected caller
        caller: Address,
    },

    /// Caller is not the pending ownership transferee
    #[error("{caller} is not the pending owner")]
    NotPendingOwner {
        /// Rejected caller
        caller: Address,
    },

    /// Ownership transfer to the current owner
    #[error("cannot transfer ownership to self")]
    SelfTransfer,

    /// Maintainer reassignment is switched off by policy
    #[error("maintainer reassignment is disabled")]
    MaintainerReassignmentDisabled,
}

impl AccessError {
    /// Caller that was rejected, if the error names one
    #[must_use]
    pub fn caller(&self) -> Option<Address> {
        match self {
            Self::NotWhitelisted { caller }
            | Self::NotOwner { caller }
            | Self::NotMaintainer { caller }
            | Self::NotPendingOwner { caller } => Some(*caller),
            Self::SelfTransfer | Self::MaintainerReassignmentDisabled => None,
        }
    }

    /// Check if this is a read-side rejection
    #[inline]
    #[must_use]
    pub fn is_read_denial(&self) -> bool {
        matches!(self, Self::NotWhitelisted { .. })
    }
}
