//! Testing utilities for feedgate workspace
//!
//! Shared identities, feeds and whitelists.

#![allow(missing_docs)]

use feedgate_types::{Address, Answer, MemoryAggregator, MemoryWhitelist, Round, RoundId};
use std::sync::Arc;

pub const DECIMALS: u8 = 8;

pub fn addr(n: u64) -> Address {
    Address::from_low_u64(n)
}

pub fn owner() -> Address {
    addr(0x0a)
}

pub fn maintainer() -> Address {
    addr(0x0b)
}

pub fn reader() -> Address {
    addr(0x0c)
}

pub fn stranger() -> Address {
    addr(0x0d)
}

pub fn whitelist_admin() -> Address {
    addr(0x0e)
}

pub fn source_address_a() -> Address {
    addr(0xa000)
}

pub fn source_address_b() -> Address {
    addr(0xb000)
}

pub fn whitelist_address() -> Address {
    addr(0xc000)
}

pub fn empty_source(address: Address) -> Arc<MemoryAggregator> {
    Arc::new(MemoryAggregator::new(address, DECIMALS))
}

pub fn source_with_answers(address: Address, answers: &[Answer]) -> Arc<MemoryAggregator> {
    let source = MemoryAggregator::new(address, DECIMALS);
    for (i, answer) in answers.iter().enumerate() {
        let at = 1_000 + i as u64 * 10;
        source.publish(*answer, at, at + 1);
    }
    Arc::new(source)
}

pub const SCENARIO_ROUND: RoundId = 17;

pub fn scenario_round() -> Round {
    Round::new(SCENARIO_ROUND, 54321, 677, 678)
}

/// Source A: round 17 holds 54321, started at 677, updated at 678
pub fn scenario_source_a() -> Arc<MemoryAggregator> {
    let source = MemoryAggregator::new(source_address_a(), DECIMALS).with_description("A / USD");
    source.publish_round(scenario_round());
    Arc::new(source)
}

/// Source B: a few rounds, the latest answering 54320
pub fn scenario_source_b() -> Arc<MemoryAggregator> {
    let source = MemoryAggregator::new(source_address_b(), DECIMALS)
        .with_description("B / USD")
        .with_version(2);
    source.publish(54000, 900, 901);
    source.publish(54100, 910, 911);
    source.publish(54320, 920, 921);
    Arc::new(source)
}

pub fn whitelist_with(address: Address, members: &[Address]) -> Arc<MemoryWhitelist> {
    Arc::new(MemoryWhitelist::new(address, whitelist_admin()).with_members(members.iter().copied()))
}

/// Whitelist at [`whitelist_address`] admitting [`reader`]
pub fn reader_whitelist() -> Arc<MemoryWhitelist> {
    whitelist_with(whitelist_address(), &[reader()])
}
