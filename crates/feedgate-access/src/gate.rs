//! Whitelist gate
//!
//! Fails closed: a caller is admitted only when the membership oracle says so.

use crate::error::AccessError;
use feedgate_types::{Address, Whitelist};
use std::fmt;
use std::sync::Arc;

/// Read gate backed by a [`Whitelist`] collaborator
#[derive(Clone)]
pub struct WhitelistGate {
    whitelist: Arc<dyn Whitelist>,
}

impl WhitelistGate {
    /// Wrap a whitelist
    #[inline]
    #[must_use]
    pub fn new(whitelist: Arc<dyn Whitelist>) -> Self {
        Self { whitelist }
    }

    /// Identity of the consulted whitelist
    #[inline]
    #[must_use]
    pub fn address(&self) -> Address {
        self.whitelist.address()
    }

    /// Membership check, delegated verbatim
    #[inline]
    #[must_use]
    pub fn is_whitelisted(&self, caller: &Address) -> bool {
        self.whitelist.is_whitelisted(caller)
    }

    /// Fail with [`AccessError::NotWhitelisted`] unless `caller` is a member
    pub fn require_whitelisted(&self, caller: &Address) -> Result<(), AccessError> {
        if self.is_whitelisted(caller) {
            Ok(())
        } else {
            tracing::warn!(%caller, whitelist = %self.address(), "read denied");
            Err(AccessError::NotWhitelisted { caller: *caller })
        }
    }

    /// Swap in a different whitelist, returning the previous one
    pub fn replace(&mut self, whitelist: Arc<dyn Whitelist>) -> Arc<dyn Whitelist> {
        std::mem::replace(&mut self.whitelist, whitelist)
    }
}

impl fmt::Debug for WhitelistGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhitelistGate")
            .field("whitelist", &self.address())
            .finish()
    }
}
