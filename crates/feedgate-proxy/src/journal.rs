//! Audit journal
//!
//! Every successful administrative call is recorded as a [`ProxyEvent`] in a SHA-256 hash
//! chain. Entries are appended under the proxy's write guard, so journal order is state order.

use crate::error::JournalError;
use chrono::{DateTime, Utc};
use feedgate_types::Address;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use uuid::Uuid;

/// Administrative state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProxyEvent {
    /// Owner nominated a successor
    OwnershipTransferRequested { from: Address, to: Address },
    /// Nominee accepted ownership
    OwnershipTransferred { from: Address, to: Address },
    /// A candidate source was proposed
    AggregatorProposed {
        current: Address,
        proposed: Address,
        displaced: Option<Address>,
    },
    /// The pending source became active
    AggregatorConfirmed { previous: Address, latest: Address },
    /// The whitelist reference was replaced
    WhitelistSet { previous: Address, latest: Address },
    /// The whitelist maintainer was replaced
    WhitelistMaintainerSet { previous: Address, latest: Address },
}

impl ProxyEvent {
    /// Short name used in logs and reports
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OwnershipTransferRequested { .. } => "ownership_transfer_requested",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
            Self::AggregatorProposed { .. } => "aggregator_proposed",
            Self::AggregatorConfirmed { .. } => "aggregator_confirmed",
            Self::WhitelistSet { .. } => "whitelist_set",
            Self::WhitelistMaintainerSet { .. } => "whitelist_maintainer_set",
        }
    }

    fn digest_into(&self, hasher: &mut Sha256) {
        let (tag, addresses): (u8, [Option<Address>; 3]) = match *self {
            Self::OwnershipTransferRequested { from, to } => (1, [Some(from), Some(to), None]),
            Self::OwnershipTransferred { from, to } => (2, [Some(from), Some(to), None]),
            Self::AggregatorProposed {
                current,
                proposed,
                displaced,
            } => (3, [Some(current), Some(proposed), displaced]),
            Self::AggregatorConfirmed { previous, latest } => (4, [Some(previous), Some(latest), None]),
            Self::WhitelistSet { previous, latest } => (5, [Some(previous), Some(latest), None]),
            Self::WhitelistMaintainerSet { previous, latest } => {
                (6, [Some(previous), Some(latest), None])
            }
        };
        hasher.update([tag]);
        for address in addresses {
            match address {
                Some(a) => {
                    hasher.update([1]);
                    hasher.update(a.as_bytes());
                }
                None => hasher.update([0]),
            }
        }
    }
}

/// One recorded event with its chain link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub event_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub event: ProxyEvent,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl JournalEntry {
    /// Hex form of this entry's hash
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

#[derive(Debug, Default)]
struct JournalInner {
    entries: VecDeque<JournalEntry>,
    next_sequence: u64,
    last_hash: [u8; 32],
}

/// Hash-chained, optionally bounded event journal
#[derive(Debug, Default)]
pub struct EventJournal {
    inner: Mutex<JournalInner>,
    capacity: usize,
}

impl EventJournal {
    /// Create an unbounded journal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a journal keeping at most `capacity` newest entries (0 = unbounded)
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::default(),
            capacity,
        }
    }

    /// Append an event, returning the recorded entry
    pub fn append(&self, event: ProxyEvent) -> JournalEntry {
        let mut guard = self.inner.lock();
        let mut entry = JournalEntry {
            sequence: guard.next_sequence,
            event_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            event,
            prev_hash: guard.last_hash,
            hash: [0u8; 32],
        };
        entry.hash = compute_hash(&entry);

        guard.next_sequence += 1;
        guard.last_hash = entry.hash;
        guard.entries.push_back(entry.clone());
        if self.capacity > 0 && guard.entries.len() > self.capacity {
            guard.entries.pop_front();
        }
        entry
    }

    /// Retained entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<JournalEntry> {
        self.inner.lock().entries.back().cloned()
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if nothing is retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Re-derive the hash chain over retained entries
    pub fn verify_integrity(&self) -> Result<(), JournalError> {
        let entries = self.entries();
        verify_entries(&entries)
    }
}

/// Verify a contiguous run of entries
///
/// The chain is anchored at the first entry's `prev_hash`; it must be all zeros when the run
/// starts at sequence 0.
pub fn verify_entries(entries: &[JournalEntry]) -> Result<(), JournalError> {
    let Some(first) = entries.first() else {
        return Ok(());
    };
    if first.sequence == 0 && first.prev_hash != [0u8; 32] {
        return Err(JournalError::IntegrityViolation { sequence: 0 });
    }

    let mut prev = first.prev_hash;
    let mut expected_sequence = first.sequence;
    for entry in entries {
        if entry.sequence != expected_sequence
            || entry.prev_hash != prev
            || entry.hash != compute_hash(entry)
        {
            return Err(JournalError::IntegrityViolation {
                sequence: entry.sequence,
            });
        }
        prev = entry.hash;
        expected_sequence += 1;
    }
    Ok(())
}

fn compute_hash(entry: &JournalEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.event_id.as_bytes());
    hasher.update(entry.recorded_at.timestamp_micros().to_le_bytes());
    entry.event.digest_into(&mut hasher);
    hasher.update(entry.prev_hash);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirmed(n: u64) -> ProxyEvent {
        ProxyEvent::AggregatorConfirmed {
            previous: Address::from_low_u64(n),
            latest: Address::from_low_u64(n + 1),
        }
    }

    #[test]
    fn chain_links_entries() {
        let journal = EventJournal::new();
        let first = journal.append(confirmed(1));
        let second = journal.append(confirmed(2));

        assert_eq!(first.sequence, 0);
        assert_eq!(first.prev_hash, [0u8; 32]);
        assert_eq!(second.prev_hash, first.hash);
        assert!(journal.verify_integrity().is_ok());
    }

    #[test]
    fn tampered_event_detected() {
        let journal = EventJournal::new();
        journal.append(confirmed(1));
        journal.append(confirmed(2));
        journal.append(confirmed(3));

        let mut entries = journal.entries();
        entries[1].event = confirmed(9);
        assert_eq!(
            verify_entries(&entries),
            Err(JournalError::IntegrityViolation { sequence: 1 })
        );
    }

    #[test]
    fn dropped_entry_detected() {
        let journal = EventJournal::new();
        for n in 0..4 {
            journal.append(confirmed(n));
        }
        let mut entries = journal.entries();
        entries.remove(2);
        assert!(verify_entries(&entries).is_err());
    }

    #[test]
    fn bounded_journal_keeps_newest_and_verifies() {
        let journal = EventJournal::with_capacity(2);
        for n in 0..5 {
            journal.append(confirmed(n));
        }
        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, 3);
        assert_eq!(journal.last().map(|e| e.sequence), Some(4));
        assert!(journal.verify_integrity().is_ok());
    }

    #[test]
    fn event_serializes_with_kind_tag() {
        let json = serde_json::to_value(confirmed(1)).unwrap();
        assert_eq!(json["kind"], "aggregator_confirmed");
    }
}
