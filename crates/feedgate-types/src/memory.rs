//! In-memory collaborators
//!
//! Reference [`Aggregator`] and [`Whitelist`] implementations used by the simulator, the CLI
//! and tests. Both are safe to share across threads.

use crate::address::Address;
use crate::aggregator::{Aggregator, SourceError};
use crate::round::{Answer, Round, RoundId, Timestamp};
use crate::whitelist::Whitelist;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};

/// Data source backed by an ordered map of published rounds
///
/// Rounds are immutable once published; the latest round is the one with the highest id.
#[derive(Debug)]
pub struct MemoryAggregator {
    address: Address,
    decimals: u8,
    description: String,
    version: u64,
    rounds: RwLock<BTreeMap<RoundId, Round>>,
}

impl MemoryAggregator {
    /// Create an empty source
    #[must_use]
    pub fn new(address: Address, decimals: u8) -> Self {
        Self {
            address,
            decimals,
            description: String::new(),
            version: 1,
            rounds: RwLock::new(BTreeMap::new()),
        }
    }

    /// With feed description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With implementation version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Publish a round under the next id (1 for an empty source)
    pub fn publish(&self, answer: Answer, started_at: Timestamp, updated_at: Timestamp) -> RoundId {
        let mut rounds = self.rounds.write();
        let round_id = rounds.keys().next_back().map_or(1, |last| last + 1);
        rounds.insert(round_id, Round::new(round_id, answer, started_at, updated_at));
        tracing::trace!(source = %self.address, round_id, "published round");
        round_id
    }

    /// Publish a round with an explicit id
    ///
    /// Returns `false` and leaves the source untouched if the id is already taken.
    pub fn publish_round(&self, round: Round) -> bool {
        let mut rounds = self.rounds.write();
        if rounds.contains_key(&round.round_id) {
            return false;
        }
        rounds.insert(round.round_id, round);
        true
    }

    /// Number of published rounds
    #[must_use]
    pub fn round_count(&self) -> usize {
        self.rounds.read().len()
    }

    fn latest(&self) -> Result<Round, SourceError> {
        self.rounds
            .read()
            .values()
            .next_back()
            .copied()
            .ok_or(SourceError::NoData)
    }

    fn round(&self, round_id: RoundId) -> Result<Round, SourceError> {
        self.rounds
            .read()
            .get(&round_id)
            .copied()
            .ok_or(SourceError::RoundNotFound(round_id))
    }
}

impl Aggregator for MemoryAggregator {
    fn address(&self) -> Address {
        self.address
    }

    fn latest_answer(&self) -> Result<Answer, SourceError> {
        self.latest().map(|r| r.answer)
    }

    fn latest_timestamp(&self) -> Result<Timestamp, SourceError> {
        self.latest().map(|r| r.updated_at)
    }

    fn latest_round(&self) -> Result<RoundId, SourceError> {
        self.latest().map(|r| r.round_id)
    }

    fn get_answer(&self, round_id: RoundId) -> Result<Answer, SourceError> {
        self.round(round_id).map(|r| r.answer)
    }

    fn get_timestamp(&self, round_id: RoundId) -> Result<Timestamp, SourceError> {
        self.round(round_id).map(|r| r.updated_at)
    }

    fn latest_round_data(&self) -> Result<Round, SourceError> {
        self.latest()
    }

    fn get_round_data(&self, round_id: RoundId) -> Result<Round, SourceError> {
        self.round(round_id)
    }

    fn decimals(&self) -> Result<u8, SourceError> {
        Ok(self.decimals)
    }

    fn description(&self) -> Result<String, SourceError> {
        Ok(self.description.clone())
    }

    fn version(&self) -> Result<u64, SourceError> {
        Ok(self.version)
    }
}

/// Errors from whitelist administration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WhitelistAdminError {
    /// Caller is not the whitelist's admin
    #[error("{0} is not the whitelist admin")]
    NotAdmin(Address),
}

/// Whitelist backed by a hash set, administered by a single admin identity
#[derive(Debug)]
pub struct MemoryWhitelist {
    address: Address,
    admin: Address,
    members: RwLock<HashSet<Address>>,
}

impl MemoryWhitelist {
    /// Create an empty whitelist
    #[must_use]
    pub fn new(address: Address, admin: Address) -> Self {
        Self {
            address,
            admin,
            members: RwLock::new(HashSet::new()),
        }
    }

    /// With initial members
    #[must_use]
    pub fn with_members(self, members: impl IntoIterator<Item = Address>) -> Self {
        self.members.write().extend(members);
        self
    }

    /// Admin identity
    #[inline]
    #[must_use]
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Admit `account`; returns whether it was newly added
    pub fn add(&self, caller: &Address, account: Address) -> Result<bool, WhitelistAdminError> {
        self.require_admin(caller)?;
        let added = self.members.write().insert(account);
        tracing::debug!(whitelist = %self.address, %account, added, "whitelist add");
        Ok(added)
    }

    /// Revoke `account`; returns whether it was a member
    pub fn remove(&self, caller: &Address, account: &Address) -> Result<bool, WhitelistAdminError> {
        self.require_admin(caller)?;
        let removed = self.members.write().remove(account);
        tracing::debug!(whitelist = %self.address, %account, removed, "whitelist remove");
        Ok(removed)
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// Check if there are no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    fn require_admin(&self, caller: &Address) -> Result<(), WhitelistAdminError> {
        if *caller == self.admin {
            Ok(())
        } else {
            Err(WhitelistAdminError::NotAdmin(*caller))
        }
    }
}

impl Whitelist for MemoryWhitelist {
    fn address(&self) -> Address {
        self.address
    }

    fn is_whitelisted(&self, account: &Address) -> bool {
        self.members.read().contains(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn empty_source_reports_no_data() {
        let source = MemoryAggregator::new(addr(1), 8);
        assert_eq!(source.latest_answer(), Err(SourceError::NoData));
        assert_eq!(source.latest_round_data(), Err(SourceError::NoData));
    }

    #[test]
    fn publish_assigns_sequential_ids() {
        let source = MemoryAggregator::new(addr(1), 8);
        assert_eq!(source.publish(100, 10, 11), 1);
        assert_eq!(source.publish(101, 12, 13), 2);
        assert_eq!(source.latest_round(), Ok(2));
        assert_eq!(source.latest_answer(), Ok(101));
        assert_eq!(source.latest_timestamp(), Ok(13));
        assert_eq!(source.get_answer(1), Ok(100));
    }

    #[test]
    fn explicit_round_is_immutable() {
        let source = MemoryAggregator::new(addr(1), 8);
        assert!(source.publish_round(Round::new(17, 54321, 677, 678)));
        assert!(!source.publish_round(Round::new(17, 1, 1, 1)));
        assert_eq!(source.get_round_data(17), Ok(Round::new(17, 54321, 677, 678)));
        assert_eq!(source.publish(5, 700, 701), 18);
    }

    #[test]
    fn unknown_round_is_reported() {
        let source = MemoryAggregator::new(addr(1), 8);
        source.publish(1, 1, 1);
        assert_eq!(source.get_timestamp(9), Err(SourceError::RoundNotFound(9)));
    }

    #[test]
    fn metadata_is_configurable() {
        let source = MemoryAggregator::new(addr(1), 18)
            .with_description("ETH / USD")
            .with_version(4);
        assert_eq!(source.decimals(), Ok(18));
        assert_eq!(source.description().as_deref(), Ok("ETH / USD"));
        assert_eq!(source.version(), Ok(4));
    }

    #[test]
    fn whitelist_admin_controls_membership() {
        let list = MemoryWhitelist::new(addr(10), addr(1));
        assert_eq!(list.add(&addr(1), addr(5)), Ok(true));
        assert!(list.is_whitelisted(&addr(5)));
        assert_eq!(list.add(&addr(2), addr(6)), Err(WhitelistAdminError::NotAdmin(addr(2))));
        assert!(!list.is_whitelisted(&addr(6)));
        assert_eq!(list.remove(&addr(1), &addr(5)), Ok(true));
        assert!(list.is_empty());
    }
}
