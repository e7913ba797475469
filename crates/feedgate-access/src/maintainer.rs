//! Whitelist maintainer role
//!
//! Independent of ownership: the maintainer may coincide with the owner but is checked on its
//! own.

use crate::error::AccessError;
use feedgate_types::Address;
use serde::{Deserialize, Serialize};

/// Identity allowed to replace the whitelist reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintainerRole {
    maintainer: Address,
}

impl MaintainerRole {
    /// Create with an initial maintainer
    #[inline]
    #[must_use]
    pub fn new(maintainer: Address) -> Self {
        Self { maintainer }
    }

    /// Current maintainer
    #[inline]
    #[must_use]
    pub fn maintainer(&self) -> Address {
        self.maintainer
    }

    /// Check if `caller` is the maintainer
    #[inline]
    #[must_use]
    pub fn is_maintainer(&self, caller: &Address) -> bool {
        self.maintainer == *caller
    }

    /// Fail with [`AccessError::NotMaintainer`] unless `caller` is the maintainer
    pub fn require_maintainer(&self, caller: &Address) -> Result<(), AccessError> {
        if self.is_maintainer(caller) {
            Ok(())
        } else {
            Err(AccessError::NotMaintainer { caller: *caller })
        }
    }

    /// Replace the maintainer, returning the previous one
    ///
    /// Authorization is the caller's job; see the proxy's `set_whitelist_maintainer`.
    pub fn reassign(&mut self, maintainer: Address) -> Address {
        std::mem::replace(&mut self.maintainer, maintainer)
    }
}
