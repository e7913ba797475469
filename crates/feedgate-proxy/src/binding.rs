//! Data source binding
//!
//! Holds the active source and, optionally, a proposed replacement. Reads are exact
//! pass-through: values and source errors come back as the source produced them.

use crate::error::ProxyError;
use crate::migration::MigrationState;
use feedgate_types::{Address, Aggregator, Answer, Round, RoundId, Timestamp};
use std::fmt;
use std::sync::Arc;

/// Active and proposed data source references
#[derive(Clone)]
pub struct DataSourceBinding {
    current: Arc<dyn Aggregator>,
    proposed: Option<Arc<dyn Aggregator>>,
}

impl DataSourceBinding {
    /// Bind to an initial source with nothing proposed
    #[inline]
    #[must_use]
    pub fn new(current: Arc<dyn Aggregator>) -> Self {
        Self {
            current,
            proposed: None,
        }
    }

    /// Address of the active source
    #[inline]
    #[must_use]
    pub fn current_address(&self) -> Address {
        self.current.address()
    }

    /// Address of the proposed source
    #[inline]
    #[must_use]
    pub fn proposed_address(&self) -> Option<Address> {
        self.proposed.as_ref().map(|p| p.address())
    }

    /// Migration state implied by the proposal slot
    #[inline]
    #[must_use]
    pub fn migration_state(&self) -> MigrationState {
        if self.proposed.is_some() {
            MigrationState::Proposed
        } else {
            MigrationState::Stable
        }
    }

    pub fn read_latest_answer(&self) -> Result<Answer, ProxyError> {
        Ok(self.current.latest_answer()?)
    }

    pub fn read_latest_timestamp(&self) -> Result<Timestamp, ProxyError> {
        Ok(self.current.latest_timestamp()?)
    }

    pub fn read_latest_round_id(&self) -> Result<RoundId, ProxyError> {
        Ok(self.current.latest_round()?)
    }

    pub fn read_latest_round_data(&self) -> Result<Round, ProxyError> {
        Ok(self.current.latest_round_data()?)
    }

    pub fn read_answer(&self, round_id: RoundId) -> Result<Answer, ProxyError> {
        Ok(self.current.get_answer(round_id)?)
    }

    pub fn read_timestamp(&self, round_id: RoundId) -> Result<Timestamp, ProxyError> {
        Ok(self.current.get_timestamp(round_id)?)
    }

    pub fn read_round_data(&self, round_id: RoundId) -> Result<Round, ProxyError> {
        Ok(self.current.get_round_data(round_id)?)
    }

    /// Round data from the proposed source
    ///
    /// # Errors
    /// - `ProxyError::NoProposalPending` when nothing is proposed
    pub fn read_proposed_round_data(&self, round_id: RoundId) -> Result<Round, ProxyError> {
        Ok(self.proposed()?.get_round_data(round_id)?)
    }

    /// Latest round data from the proposed source
    ///
    /// # Errors
    /// - `ProxyError::NoProposalPending` when nothing is proposed
    pub fn read_proposed_latest_round_data(&self) -> Result<Round, ProxyError> {
        Ok(self.proposed()?.latest_round_data()?)
    }

    pub fn current_decimals(&self) -> Result<u8, ProxyError> {
        Ok(self.current.decimals()?)
    }

    pub fn current_description(&self) -> Result<String, ProxyError> {
        Ok(self.current.description()?)
    }

    pub fn current_version(&self) -> Result<u64, ProxyError> {
        Ok(self.current.version()?)
    }

    fn proposed(&self) -> Result<&Arc<dyn Aggregator>, ProxyError> {
        self.proposed.as_ref().ok_or(ProxyError::NoProposalPending)
    }

    /// Fill the proposal slot, returning whatever it held
    pub(crate) fn set_proposed(
        &mut self,
        candidate: Arc<dyn Aggregator>,
    ) -> Option<Arc<dyn Aggregator>> {
        self.proposed.replace(candidate)
    }

    /// Move the proposal into the active slot, returning the displaced source
    ///
    /// `None` (and no change) when nothing is proposed.
    pub(crate) fn promote(&mut self) -> Option<Arc<dyn Aggregator>> {
        let next = self.proposed.take()?;
        Some(std::mem::replace(&mut self.current, next))
    }
}

impl fmt::Debug for DataSourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceBinding")
            .field("current", &self.current_address())
            .field("proposed", &self.proposed_address())
            .finish()
    }
}
