//! Whitelisted feed proxy
//!
//! Public surface of the crate. Reads pass the whitelist gate and then forward to the bound
//! source; administrative calls pass the owner or maintainer check and then mutate state under
//! a single write guard, recording an audit event before the guard is released.
//!
//! Every read takes one consistent snapshot of gate and binding, so a read racing a migration
//! sees either the old source or the new one, never a mix.

use crate::binding::DataSourceBinding;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::journal::{EventJournal, ProxyEvent};
use crate::migration::{self, MigrationState, Promotion, Proposal};
use feedgate_access::{AccessError, MaintainerRole, Ownership, OwnershipHandoff, WhitelistGate};
use feedgate_types::{Address, Aggregator, Answer, Round, RoundId, Timestamp, Whitelist};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct ProxyState {
    binding: DataSourceBinding,
    gate: WhitelistGate,
    ownership: Ownership,
    maintainer: MaintainerRole,
}

/// Public configuration of a proxy at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySnapshot {
    pub aggregator: Address,
    pub proposed_aggregator: Option<Address>,
    pub whitelist: Address,
    pub whitelist_maintainer: Address,
    pub owner: Address,
    pub pending_owner: Option<Address>,
    pub migration_state: MigrationState,
}

/// Access-controlled, migratable proxy in front of a data feed
pub struct WhitelistedFeedProxy {
    state: RwLock<ProxyState>,
    config: ProxyConfig,
    journal: EventJournal,
}

impl WhitelistedFeedProxy {
    /// Create with default policy; `owner` is also the initial maintainer
    #[must_use]
    pub fn new(source: Arc<dyn Aggregator>, whitelist: Arc<dyn Whitelist>, owner: Address) -> Self {
        Self::from_config(ProxyConfig::new(owner), source, whitelist)
    }

    /// Create from a configuration
    #[must_use]
    pub fn from_config(
        config: ProxyConfig,
        source: Arc<dyn Aggregator>,
        whitelist: Arc<dyn Whitelist>,
    ) -> Self {
        let state = ProxyState {
            binding: DataSourceBinding::new(source),
            gate: WhitelistGate::new(whitelist),
            ownership: Ownership::new(config.owner),
            maintainer: MaintainerRole::new(config.initial_maintainer()),
        };
        tracing::info!(
            aggregator = %state.binding.current_address(),
            whitelist = %state.gate.address(),
            owner = %config.owner,
            maintainer = %config.initial_maintainer(),
            "feed proxy initialized"
        );
        Self {
            state: RwLock::new(state),
            journal: EventJournal::with_capacity(config.journal_capacity),
            config,
        }
    }

    // ------------------------------------------------------------------
    // Reads (whitelist-gated)
    // ------------------------------------------------------------------

    pub fn latest_answer(&self, caller: &Address) -> Result<Answer, ProxyError> {
        self.admit(caller)?.read_latest_answer()
    }

    pub fn latest_timestamp(&self, caller: &Address) -> Result<Timestamp, ProxyError> {
        self.admit(caller)?.read_latest_timestamp()
    }

    pub fn latest_round(&self, caller: &Address) -> Result<RoundId, ProxyError> {
        self.admit(caller)?.read_latest_round_id()
    }

    pub fn get_answer(&self, caller: &Address, round_id: RoundId) -> Result<Answer, ProxyError> {
        self.admit(caller)?.read_answer(round_id)
    }

    pub fn get_timestamp(
        &self,
        caller: &Address,
        round_id: RoundId,
    ) -> Result<Timestamp, ProxyError> {
        self.admit(caller)?.read_timestamp(round_id)
    }

    pub fn latest_round_data(&self, caller: &Address) -> Result<Round, ProxyError> {
        self.admit(caller)?.read_latest_round_data()
    }

    pub fn get_round_data(&self, caller: &Address, round_id: RoundId) -> Result<Round, ProxyError> {
        self.admit(caller)?.read_round_data(round_id)
    }

    /// Latest round of the proposed source
    ///
    /// Lets consumers inspect a candidate before it goes live.
    pub fn proposed_latest_round_data(&self, caller: &Address) -> Result<Round, ProxyError> {
        self.admit(caller)?.read_proposed_latest_round_data()
    }

    /// Specific round of the proposed source
    pub fn proposed_get_round_data(
        &self,
        caller: &Address,
        round_id: RoundId,
    ) -> Result<Round, ProxyError> {
        self.admit(caller)?.read_proposed_round_data(round_id)
    }

    pub fn decimals(&self, caller: &Address) -> Result<u8, ProxyError> {
        self.admit(caller)?.current_decimals()
    }

    pub fn description(&self, caller: &Address) -> Result<String, ProxyError> {
        self.admit(caller)?.current_description()
    }

    pub fn version(&self, caller: &Address) -> Result<u64, ProxyError> {
        self.admit(caller)?.current_version()
    }

    fn admit(&self, caller: &Address) -> Result<DataSourceBinding, ProxyError> {
        let state = self.state.read();
        let bypass = self.config.owner_bypasses_whitelist && state.ownership.is_owner(caller);
        if !bypass {
            state.gate.require_whitelisted(caller)?;
        }
        tracing::trace!(%caller, bypass, "read admitted");
        Ok(state.binding.clone())
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Propose a replacement source
    ///
    /// Owner-only. Overwrites any earlier proposal.
    ///
    /// # Errors
    /// - `AccessError::NotOwner` if `caller` is not the owner
    /// - `ProxyError::AlreadyActive` if `candidate` is the active source
    pub fn propose_aggregator(
        &self,
        caller: &Address,
        candidate: Arc<dyn Aggregator>,
    ) -> Result<Proposal, ProxyError> {
        let mut state = self.state.write();
        state
            .ownership
            .require_owner(caller)
            .map_err(|e| rejected("propose_aggregator", e))?;

        let proposal = migration::propose(&mut state.binding, candidate)?;
        self.journal.append(ProxyEvent::AggregatorProposed {
            current: proposal.current,
            proposed: proposal.proposed,
            displaced: proposal.displaced,
        });
        tracing::info!(
            current = %proposal.current,
            proposed = %proposal.proposed,
            displaced = ?proposal.displaced,
            "aggregator proposed"
        );
        Ok(proposal)
    }

    /// Promote the pending proposal
    ///
    /// Owner-only. `expected` must name the pending source; a stale confirmation fails and
    /// changes nothing.
    ///
    /// # Errors
    /// - `AccessError::NotOwner` if `caller` is not the owner
    /// - `ProxyError::ProposalMismatch` if `expected` is not the pending proposal
    pub fn confirm_aggregator(
        &self,
        caller: &Address,
        expected: &Address,
    ) -> Result<Promotion, ProxyError> {
        let mut state = self.state.write();
        state
            .ownership
            .require_owner(caller)
            .map_err(|e| rejected("confirm_aggregator", e))?;

        let promotion = migration::confirm(&mut state.binding, expected).map_err(|e| {
            tracing::warn!(%expected, error = %e, "aggregator confirmation refused");
            e
        })?;
        self.journal.append(ProxyEvent::AggregatorConfirmed {
            previous: promotion.previous,
            latest: promotion.current,
        });
        tracing::info!(
            previous = %promotion.previous,
            current = %promotion.current,
            "aggregator confirmed"
        );
        Ok(promotion)
    }

    /// Replace the whitelist reference; returns the previous whitelist address
    ///
    /// Maintainer-only. Governs every read issued after it returns.
    pub fn set_whitelist(
        &self,
        caller: &Address,
        whitelist: Arc<dyn Whitelist>,
    ) -> Result<Address, ProxyError> {
        let mut state = self.state.write();
        state
            .maintainer
            .require_maintainer(caller)
            .map_err(|e| rejected("set_whitelist", e))?;

        let previous = state.gate.replace(whitelist).address();
        let latest = state.gate.address();
        self.journal
            .append(ProxyEvent::WhitelistSet { previous, latest });
        tracing::info!(%previous, %latest, "whitelist set");
        Ok(previous)
    }

    /// Replace the whitelist maintainer; returns the previous maintainer
    ///
    /// Owner-only, and only while `allow_maintainer_reassignment` is on.
    pub fn set_whitelist_maintainer(
        &self,
        caller: &Address,
        maintainer: Address,
    ) -> Result<Address, ProxyError> {
        let mut state = self.state.write();
        state
            .ownership
            .require_owner(caller)
            .map_err(|e| rejected("set_whitelist_maintainer", e))?;
        if !self.config.allow_maintainer_reassignment {
            return Err(rejected(
                "set_whitelist_maintainer",
                AccessError::MaintainerReassignmentDisabled,
            ));
        }

        let previous = state.maintainer.reassign(maintainer);
        self.journal.append(ProxyEvent::WhitelistMaintainerSet {
            previous,
            latest: maintainer,
        });
        tracing::info!(%previous, latest = %maintainer, "whitelist maintainer set");
        Ok(previous)
    }

    /// Nominate the next owner
    pub fn transfer_ownership(&self, caller: &Address, candidate: Address) -> Result<(), ProxyError> {
        let mut state = self.state.write();
        state
            .ownership
            .transfer(caller, candidate)
            .map_err(|e| rejected("transfer_ownership", e))?;

        self.journal.append(ProxyEvent::OwnershipTransferRequested {
            from: *caller,
            to: candidate,
        });
        tracing::info!(from = %caller, to = %candidate, "ownership transfer requested");
        Ok(())
    }

    /// Accept a pending nomination
    pub fn accept_ownership(&self, caller: &Address) -> Result<OwnershipHandoff, ProxyError> {
        let mut state = self.state.write();
        let handoff = state
            .ownership
            .accept(caller)
            .map_err(|e| rejected("accept_ownership", e))?;

        self.journal.append(ProxyEvent::OwnershipTransferred {
            from: handoff.previous,
            to: handoff.current,
        });
        tracing::info!(from = %handoff.previous, to = %handoff.current, "ownership transferred");
        Ok(handoff)
    }

    // ------------------------------------------------------------------
    // Public configuration (unauthenticated)
    // ------------------------------------------------------------------

    /// Active source
    #[must_use]
    pub fn aggregator(&self) -> Address {
        self.state.read().binding.current_address()
    }

    /// Pending source, if any
    #[must_use]
    pub fn proposed_aggregator(&self) -> Option<Address> {
        self.state.read().binding.proposed_address()
    }

    /// Consulted whitelist
    #[must_use]
    pub fn whitelist(&self) -> Address {
        self.state.read().gate.address()
    }

    #[must_use]
    pub fn whitelist_maintainer(&self) -> Address {
        self.state.read().maintainer.maintainer()
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.state.read().ownership.owner()
    }

    #[must_use]
    pub fn pending_owner(&self) -> Option<Address> {
        self.state.read().ownership.pending()
    }

    /// Membership of `account` in the current whitelist
    ///
    /// Answers the whitelist's question only; the owner bypass policy is not applied.
    #[must_use]
    pub fn whitelisted(&self, account: &Address) -> bool {
        self.state.read().gate.is_whitelisted(account)
    }

    #[must_use]
    pub fn migration_state(&self) -> MigrationState {
        self.state.read().binding.migration_state()
    }

    /// All public configuration read under one guard
    #[must_use]
    pub fn snapshot(&self) -> ProxySnapshot {
        let state = self.state.read();
        ProxySnapshot {
            aggregator: state.binding.current_address(),
            proposed_aggregator: state.binding.proposed_address(),
            whitelist: state.gate.address(),
            whitelist_maintainer: state.maintainer.maintainer(),
            owner: state.ownership.owner(),
            pending_owner: state.ownership.pending(),
            migration_state: state.binding.migration_state(),
        }
    }

    /// Policy this proxy was built with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Audit trail of administrative changes
    #[inline]
    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }
}

impl fmt::Debug for WhitelistedFeedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhitelistedFeedProxy")
            .field("state", &self.snapshot())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn rejected(operation: &'static str, error: AccessError) -> ProxyError {
    tracing::warn!(operation, error = %error, "administrative call rejected");
    error.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedgate_types::{MemoryAggregator, MemoryWhitelist};

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    fn proxy() -> WhitelistedFeedProxy {
        let source = MemoryAggregator::new(addr(100), 8);
        source.publish(42, 1, 2);
        let whitelist = MemoryWhitelist::new(addr(200), addr(1)).with_members([addr(3)]);
        WhitelistedFeedProxy::new(Arc::new(source), Arc::new(whitelist), addr(1))
    }

    #[test]
    fn owner_is_initial_maintainer() {
        let proxy = proxy();
        assert_eq!(proxy.owner(), addr(1));
        assert_eq!(proxy.whitelist_maintainer(), addr(1));
        assert_eq!(proxy.pending_owner(), None);
    }

    #[test]
    fn reads_are_gated() {
        let proxy = proxy();
        assert_eq!(proxy.latest_answer(&addr(3)), Ok(42));
        assert!(proxy.latest_answer(&addr(4)).unwrap_err().is_not_whitelisted());
    }

    #[test]
    fn owner_not_implicitly_whitelisted() {
        let proxy = proxy();
        assert!(proxy.latest_answer(&addr(1)).unwrap_err().is_not_whitelisted());
    }

    #[test]
    fn admin_calls_are_journaled() {
        let proxy = proxy();
        proxy.transfer_ownership(&addr(1), addr(5)).unwrap();
        proxy.accept_ownership(&addr(5)).unwrap();

        let names: Vec<_> = proxy.journal().entries().iter().map(|e| e.event.name()).collect();
        assert_eq!(names, ["ownership_transfer_requested", "ownership_transferred"]);
        assert!(proxy.journal().verify_integrity().is_ok());
    }

    #[test]
    fn rejected_calls_are_not_journaled() {
        let proxy = proxy();
        assert!(proxy.transfer_ownership(&addr(3), addr(5)).is_err());
        assert!(proxy.confirm_aggregator(&addr(1), &addr(9)).is_err());
        assert!(proxy.journal().is_empty());
    }

    #[test]
    fn snapshot_matches_queries() {
        let proxy = proxy();
        let snapshot = proxy.snapshot();
        assert_eq!(snapshot.aggregator, proxy.aggregator());
        assert_eq!(snapshot.whitelist, proxy.whitelist());
        assert_eq!(snapshot.migration_state, MigrationState::Stable);
    }
}
