//! Two-step ownership
//!
//! The owner nominates a successor with [`Ownership::transfer`]; nothing changes until the
//! nominee calls [`Ownership::accept`]. Control can never land on an identity that is unable
//! to act.

use crate::error::AccessError;
use feedgate_types::Address;
use serde::{Deserialize, Serialize};

/// Owner slot plus pending transferee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: Address,
    pending: Option<Address>,
}

/// Completed ownership handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipHandoff {
    /// Owner before the handoff
    pub previous: Address,
    /// Owner after the handoff
    pub current: Address,
}

impl Ownership {
    /// Create with an initial owner and no pending transfer
    #[inline]
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            pending: None,
        }
    }

    /// Current owner
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Pending transferee
    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<Address> {
        self.pending
    }

    /// Check if `caller` is the owner
    #[inline]
    #[must_use]
    pub fn is_owner(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    /// Fail with [`AccessError::NotOwner`] unless `caller` is the owner
    pub fn require_owner(&self, caller: &Address) -> Result<(), AccessError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(AccessError::NotOwner { caller: *caller })
        }
    }

    /// Nominate `candidate` as the next owner
    ///
    /// Owner-only. Replaces any earlier nomination.
    pub fn transfer(&mut self, caller: &Address, candidate: Address) -> Result<(), AccessError> {
        self.require_owner(caller)?;
        if candidate == self.owner {
            return Err(AccessError::SelfTransfer);
        }
        self.pending = Some(candidate);
        Ok(())
    }

    /// Complete a nomination
    ///
    /// Only the pending transferee may call this.
    pub fn accept(&mut self, caller: &Address) -> Result<OwnershipHandoff, AccessError> {
        match self.pending {
            Some(pending) if pending == *caller => {
                let previous = self.owner;
                self.owner = pending;
                self.pending = None;
                Ok(OwnershipHandoff {
                    previous,
                    current: pending,
                })
            }
            _ => Err(AccessError::NotPendingOwner { caller: *caller }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn transfer_does_not_change_owner() {
        let mut ownership = Ownership::new(addr(1));
        ownership.transfer(&addr(1), addr(2)).unwrap();
        assert_eq!(ownership.owner(), addr(1));
        assert_eq!(ownership.pending(), Some(addr(2)));
    }

    #[test]
    fn accept_completes_transfer() {
        let mut ownership = Ownership::new(addr(1));
        ownership.transfer(&addr(1), addr(2)).unwrap();

        let handoff = ownership.accept(&addr(2)).unwrap();
        assert_eq!(handoff.previous, addr(1));
        assert_eq!(handoff.current, addr(2));
        assert_eq!(ownership.owner(), addr(2));
        assert_eq!(ownership.pending(), None);
    }

    #[test]
    fn non_owner_cannot_nominate() {
        let mut ownership = Ownership::new(addr(1));
        let err = ownership.transfer(&addr(3), addr(3)).unwrap_err();
        assert_eq!(err, AccessError::NotOwner { caller: addr(3) });
        assert_eq!(ownership.pending(), None);
    }

    #[test]
    fn only_nominee_can_accept() {
        let mut ownership = Ownership::new(addr(1));
        ownership.transfer(&addr(1), addr(2)).unwrap();

        assert_eq!(
            ownership.accept(&addr(3)),
            Err(AccessError::NotPendingOwner { caller: addr(3) })
        );
        assert_eq!(
            ownership.accept(&addr(1)),
            Err(AccessError::NotPendingOwner { caller: addr(1) })
        );
        assert_eq!(ownership.owner(), addr(1));
    }

    #[test]
    fn accept_without_nomination_fails() {
        let mut ownership = Ownership::new(addr(1));
        assert!(ownership.accept(&addr(1)).is_err());
    }

    #[test]
    fn later_nomination_replaces_earlier() {
        let mut ownership = Ownership::new(addr(1));
        ownership.transfer(&addr(1), addr(2)).unwrap();
        ownership.transfer(&addr(1), addr(3)).unwrap();

        assert!(ownership.accept(&addr(2)).is_err());
        assert!(ownership.accept(&addr(3)).is_ok());
    }

    #[test]
    fn self_transfer_rejected() {
        let mut ownership = Ownership::new(addr(1));
        assert_eq!(
            ownership.transfer(&addr(1), addr(1)),
            Err(AccessError::SelfTransfer)
        );
    }
}
