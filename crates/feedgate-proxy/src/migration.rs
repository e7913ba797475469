//! Two-phase source migration
//!
//! `Stable` (nothing proposed) and `Proposed` (a candidate awaits confirmation). Proposing is
//! allowed from either state and the last proposal wins. Confirming names the expected source so
//! a confirmation racing a newer proposal is refused instead of promoting the wrong feed.
//!
//! Authorization is checked by the facade before these functions run.

use crate::binding::DataSourceBinding;
use crate::error::ProxyError;
use feedgate_types::{Address, Aggregator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Migration sub-state of a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MigrationState {
    /// No proposal pending
    Stable,
    /// A candidate source awaits confirmation
    Proposed,
}

/// Validates a migration state transition
pub fn validate_transition(from: MigrationState, to: MigrationState) -> Result<(), ProxyError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ProxyError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: MigrationState) -> Vec<MigrationState> {
    use MigrationState::*;
    match from {
        Stable => vec![Proposed],
        Proposed => vec![Proposed, Stable],
    }
}

/// Outcome of a successful proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    /// Active source, unchanged by the proposal
    pub current: Address,
    /// Newly proposed source
    pub proposed: Address,
    /// Earlier proposal that was overwritten
    pub displaced: Option<Address>,
}

/// Outcome of a successful confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    /// Source that was active before
    pub previous: Address,
    /// Source that is active now
    pub current: Address,
}

/// Put `candidate` in the proposal slot
///
/// # Errors
/// - `ProxyError::AlreadyActive` if `candidate` is the active source
pub fn propose(
    binding: &mut DataSourceBinding,
    candidate: Arc<dyn Aggregator>,
) -> Result<Proposal, ProxyError> {
    let proposed = candidate.address();
    let current = binding.current_address();
    if proposed == current {
        return Err(ProxyError::AlreadyActive(proposed));
    }
    validate_transition(binding.migration_state(), MigrationState::Proposed)?;

    let displaced = binding.set_proposed(candidate).map(|old| old.address());
    Ok(Proposal {
        current,
        proposed,
        displaced,
    })
}

/// Promote the pending proposal, provided it is `expected`
///
/// # Errors
/// - `ProxyError::ProposalMismatch` if nothing is pending or a different source is pending
pub fn confirm(binding: &mut DataSourceBinding, expected: &Address) -> Result<Promotion, ProxyError> {
    let pending = binding.proposed_address();
    if pending != Some(*expected) {
        return Err(ProxyError::ProposalMismatch {
            expected: *expected,
            pending,
        });
    }
    validate_transition(binding.migration_state(), MigrationState::Stable)?;

    let previous = binding
        .promote()
        .map(|old| old.address())
        .ok_or(ProxyError::NoProposalPending)?;
    Ok(Promotion {
        previous,
        current: binding.current_address(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedgate_types::MemoryAggregator;

    fn source(n: u64) -> Arc<MemoryAggregator> {
        Arc::new(MemoryAggregator::new(Address::from_low_u64(n), 8))
    }

    #[test]
    fn transition_table() {
        assert!(validate_transition(MigrationState::Stable, MigrationState::Proposed).is_ok());
        assert!(validate_transition(MigrationState::Proposed, MigrationState::Proposed).is_ok());
        assert!(validate_transition(MigrationState::Proposed, MigrationState::Stable).is_ok());
        assert_eq!(
            validate_transition(MigrationState::Stable, MigrationState::Stable),
            Err(ProxyError::IllegalTransition {
                from: MigrationState::Stable,
                to: MigrationState::Stable,
            })
        );
    }

    #[test]
    fn propose_then_confirm() {
        let mut binding = DataSourceBinding::new(source(1));
        let proposal = propose(&mut binding, source(2)).unwrap();
        assert_eq!(proposal.displaced, None);
        assert_eq!(binding.current_address(), Address::from_low_u64(1));

        let promotion = confirm(&mut binding, &Address::from_low_u64(2)).unwrap();
        assert_eq!(promotion.previous, Address::from_low_u64(1));
        assert_eq!(promotion.current, Address::from_low_u64(2));
        assert_eq!(binding.migration_state(), MigrationState::Stable);
    }

    #[test]
    fn last_proposal_wins() {
        let mut binding = DataSourceBinding::new(source(1));
        propose(&mut binding, source(2)).unwrap();
        let proposal = propose(&mut binding, source(3)).unwrap();

        assert_eq!(proposal.displaced, Some(Address::from_low_u64(2)));
        assert_eq!(binding.proposed_address(), Some(Address::from_low_u64(3)));
    }

    #[test]
    fn stale_confirmation_rejected() {
        let mut binding = DataSourceBinding::new(source(1));
        propose(&mut binding, source(2)).unwrap();
        propose(&mut binding, source(3)).unwrap();

        let err = confirm(&mut binding, &Address::from_low_u64(2)).unwrap_err();
        assert_eq!(
            err,
            ProxyError::ProposalMismatch {
                expected: Address::from_low_u64(2),
                pending: Some(Address::from_low_u64(3)),
            }
        );
        assert_eq!(binding.current_address(), Address::from_low_u64(1));
        assert_eq!(binding.proposed_address(), Some(Address::from_low_u64(3)));
    }

    #[test]
    fn confirm_while_stable_rejected() {
        let mut binding = DataSourceBinding::new(source(1));
        let err = confirm(&mut binding, &Address::from_low_u64(1)).unwrap_err();
        assert!(matches!(err, ProxyError::ProposalMismatch { pending: None, .. }));
    }

    #[test]
    fn proposing_active_source_rejected() {
        let mut binding = DataSourceBinding::new(source(1));
        assert_eq!(
            propose(&mut binding, source(1)).unwrap_err(),
            ProxyError::AlreadyActive(Address::from_low_u64(1))
        );
        assert_eq!(binding.migration_state(), MigrationState::Stable);
    }
}
