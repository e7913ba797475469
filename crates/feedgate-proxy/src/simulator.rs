//! Feedgate Simulator - randomized invariant checking
//!
//! Drives a proxy through seeded random reads and administrative calls from random callers,
//! mirroring every call against a shadow model of the expected state.
//!
//! Key invariants tested:
//! - No read is admitted for a caller outside the whitelist
//! - No migration, whitelist or ownership change is admitted for the wrong caller
//! - Admitted reads return exactly what the backing source returns
//! - Public configuration always matches the model
//! - The audit journal chain verifies and holds one entry per applied change

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::migration::MigrationState;
use crate::proxy::{ProxySnapshot, WhitelistedFeedProxy};
use feedgate_types::{
    Address, Aggregator, Answer, MemoryAggregator, MemoryWhitelist, Round, RoundId, Whitelist,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;

const CALLER_COUNT: u64 = 6;
const SOURCE_COUNT: usize = 4;
const WHITELIST_COUNT: usize = 3;
const ROUNDS_PER_SOURCE: u64 = 5;

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to run
    pub operations: u64,
    /// Stop conditions
    pub stop_on_first_violation: bool,
    /// Run the proxy with the owner whitelist bypass enabled
    pub owner_bypasses_whitelist: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            operations: 1000,
            stop_on_first_violation: true,
            owner_bypasses_whitelist: false,
        }
    }
}

/// Gated read kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadKind {
    LatestAnswer,
    LatestRoundData,
    RoundData(RoundId),
    ProposedLatestRoundData,
    ProposedRoundData(RoundId),
    Decimals,
}

/// Test operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulatedOperation {
    Read { caller: Address, kind: ReadKind },
    Propose { caller: Address, source: usize },
    Confirm { caller: Address, source: usize },
    SetWhitelist { caller: Address, whitelist: usize },
    TransferOwnership { caller: Address, candidate: Address },
    AcceptOwnership { caller: Address },
}

/// A violation detected during simulation
#[derive(Debug, Clone, Serialize)]
pub enum Violation {
    /// Read admitted for a caller the model says is not whitelisted
    UnauthorizedRead { operation: SimulatedOperation },
    /// Read denied for a caller the model says is whitelisted
    AuthorizedReadDenied { operation: SimulatedOperation, error: String },
    /// Read returned something other than what the source returns
    ForwardingMismatch {
        operation: SimulatedOperation,
        expected: String,
        actual: String,
    },
    /// Administrative call admitted when the model says it must fail
    UnauthorizedMutation { operation: SimulatedOperation },
    /// Administrative call failed when the model says it must succeed
    UnexpectedRejection { operation: SimulatedOperation, error: String },
    /// Public configuration differs from the model
    StateDivergence { operation: SimulatedOperation, detail: String },
    /// Journal chain broken or out of step with applied changes
    JournalMismatch { detail: String },
}

/// Statistics for simulation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatorStats {
    pub reads_attempted: u64,
    pub reads_admitted: u64,
    pub reads_denied: u64,
    pub admin_attempted: u64,
    pub admin_applied: u64,
    pub admin_rejected: u64,
    pub migrations_confirmed: u64,
}

/// Final report from simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
    pub final_state: ProxySnapshot,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Feedgate Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Owner Bypass: {}\n", self.config.owner_bypasses_whitelist));
        report.push_str(&format!("Reads Attempted: {}\n", self.stats.reads_attempted));
        report.push_str(&format!("Reads Admitted: {}\n", self.stats.reads_admitted));
        report.push_str(&format!("Reads Denied: {}\n", self.stats.reads_denied));
        report.push_str(&format!("Admin Calls Attempted: {}\n", self.stats.admin_attempted));
        report.push_str(&format!("Admin Calls Applied: {}\n", self.stats.admin_applied));
        report.push_str(&format!("Admin Calls Rejected: {}\n", self.stats.admin_rejected));
        report.push_str(&format!("Migrations Confirmed: {}\n", self.stats.migrations_confirmed));
        report.push_str(&format!("Final Aggregator: {}\n", self.final_state.aggregator));
        report.push_str(&format!("Final Owner: {}\n", self.final_state.owner));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Expected state of the proxy
#[derive(Debug, Clone)]
struct Model {
    current: usize,
    proposed: Option<usize>,
    whitelist: usize,
    owner: Address,
    pending_owner: Option<Address>,
    maintainer: Address,
}

struct World {
    sources: Vec<Arc<MemoryAggregator>>,
    whitelists: Vec<Arc<MemoryWhitelist>>,
    callers: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReadValue {
    Answer(Answer),
    Round(Round),
    Decimals(u8),
}

/// Run the feedgate simulator
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let world = build_world(&mut rng);

    let owner = world.callers[0];
    let maintainer = world.callers[1];
    let proxy_config = ProxyConfig::new(owner)
        .with_maintainer(maintainer)
        .with_owner_bypass(config.owner_bypasses_whitelist);
    let proxy = WhitelistedFeedProxy::from_config(
        proxy_config,
        world.sources[0].clone(),
        world.whitelists[0].clone(),
    );

    let mut model = Model {
        current: 0,
        proposed: None,
        whitelist: 0,
        owner,
        pending_owner: None,
        maintainer,
    };
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    for _ in 0..config.operations {
        let operation = generate_operation(&mut rng, &world, &model);
        let before = violations.len();

        execute_operation(
            &operation,
            &proxy,
            &world,
            &mut model,
            &config,
            &mut stats,
            &mut violations,
        );
        if let Some(detail) = diverges(&proxy.snapshot(), &model, &world) {
            violations.push(Violation::StateDivergence { operation, detail });
        }

        if config.stop_on_first_violation && violations.len() > before {
            break;
        }
    }

    if let Err(e) = proxy.journal().verify_integrity() {
        violations.push(Violation::JournalMismatch {
            detail: e.to_string(),
        });
    }
    let journaled = proxy.journal().len() as u64;
    if journaled != stats.admin_applied {
        violations.push(Violation::JournalMismatch {
            detail: format!("{journaled} entries for {} applied changes", stats.admin_applied),
        });
    }

    tracing::debug!(seed = config.seed, violations = violations.len(), "simulation finished");
    SimulatorReport {
        final_state: proxy.snapshot(),
        config,
        stats,
        violations,
    }
}

fn build_world(rng: &mut StdRng) -> World {
    let callers = (1..=CALLER_COUNT).map(Address::from_low_u64).collect::<Vec<_>>();

    let sources = (0..SOURCE_COUNT)
        .map(|i| {
            let source = MemoryAggregator::new(Address::from_low_u64(0x1000 + i as u64), 8)
                .with_description(format!("feed-{i}"));
            for round in 0..ROUNDS_PER_SOURCE {
                let at = 1_000 + round * 60;
                source.publish(rng.gen_range(-1_000_000..1_000_000), at, at + 5);
            }
            Arc::new(source)
        })
        .collect();

    let whitelists = (0..WHITELIST_COUNT)
        .map(|i| {
            let members = callers
                .iter()
                .copied()
                .filter(|_| rng.gen_bool(0.5))
                .collect::<Vec<_>>();
            Arc::new(
                MemoryWhitelist::new(Address::from_low_u64(0x2000 + i as u64), callers[0])
                    .with_members(members),
            )
        })
        .collect();

    World {
        sources,
        whitelists,
        callers,
    }
}

/// Generate a random operation, biased towards callers likely to be authorized
fn generate_operation(rng: &mut StdRng, world: &World, model: &Model) -> SimulatedOperation {
    let random_caller = |rng: &mut StdRng| world.callers[rng.gen_range(0..world.callers.len())];
    let round_id = |rng: &mut StdRng| rng.gen_range(0..=ROUNDS_PER_SOURCE + 1);

    match rng.gen_range(0..10) {
        0..=4 => {
            let kind = match rng.gen_range(0..6) {
                0 => ReadKind::LatestAnswer,
                1 => ReadKind::LatestRoundData,
                2 => ReadKind::RoundData(round_id(rng)),
                3 => ReadKind::ProposedLatestRoundData,
                4 => ReadKind::ProposedRoundData(round_id(rng)),
                _ => ReadKind::Decimals,
            };
            SimulatedOperation::Read {
                caller: random_caller(rng),
                kind,
            }
        }
        5 => SimulatedOperation::Propose {
            caller: if rng.gen_bool(0.7) { model.owner } else { random_caller(rng) },
            source: rng.gen_range(0..world.sources.len()),
        },
        6 => SimulatedOperation::Confirm {
            caller: if rng.gen_bool(0.7) { model.owner } else { random_caller(rng) },
            source: match model.proposed {
                Some(p) if rng.gen_bool(0.7) => p,
                _ => rng.gen_range(0..world.sources.len()),
            },
        },
        7 => SimulatedOperation::SetWhitelist {
            caller: if rng.gen_bool(0.6) { model.maintainer } else { random_caller(rng) },
            whitelist: rng.gen_range(0..world.whitelists.len()),
        },
        8 => SimulatedOperation::TransferOwnership {
            caller: if rng.gen_bool(0.6) { model.owner } else { random_caller(rng) },
            candidate: random_caller(rng),
        },
        _ => SimulatedOperation::AcceptOwnership {
            caller: match model.pending_owner {
                Some(p) if rng.gen_bool(0.6) => p,
                _ => random_caller(rng),
            },
        },
    }
}

fn execute_operation(
    operation: &SimulatedOperation,
    proxy: &WhitelistedFeedProxy,
    world: &World,
    model: &mut Model,
    config: &SimulatorConfig,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) {
    let operation = *operation;
    match operation {
        SimulatedOperation::Read { caller, kind } => {
            stats.reads_attempted += 1;
            let admitted = world.whitelists[model.whitelist].is_whitelisted(&caller)
                || (config.owner_bypasses_whitelist && caller == model.owner);
            let actual = perform_read(proxy, &caller, kind);

            if !admitted {
                stats.reads_denied += 1;
                if !matches!(&actual, Err(e) if e.is_not_whitelisted()) {
                    violations.push(Violation::UnauthorizedRead { operation });
                }
                return;
            }

            stats.reads_admitted += 1;
            let expected = expected_read(world, model, kind);
            match &actual {
                Err(e) if e.is_not_whitelisted() => {
                    violations.push(Violation::AuthorizedReadDenied {
                        operation,
                        error: e.to_string(),
                    });
                }
                _ if actual != expected => {
                    violations.push(Violation::ForwardingMismatch {
                        operation,
                        expected: format!("{expected:?}"),
                        actual: format!("{actual:?}"),
                    });
                }
                _ => {}
            }
        }
        SimulatedOperation::Propose { caller, source } => {
            let should_apply = caller == model.owner && source != model.current;
            let actual = proxy
                .propose_aggregator(&caller, world.sources[source].clone())
                .map(|_| ());
            if record_admin(operation, should_apply, actual, stats, violations) {
                model.proposed = Some(source);
            }
        }
        SimulatedOperation::Confirm { caller, source } => {
            let should_apply = caller == model.owner && model.proposed == Some(source);
            let actual = proxy
                .confirm_aggregator(&caller, &world.sources[source].address())
                .map(|_| ());
            if record_admin(operation, should_apply, actual, stats, violations) {
                model.current = source;
                model.proposed = None;
                stats.migrations_confirmed += 1;
            }
        }
        SimulatedOperation::SetWhitelist { caller, whitelist } => {
            let should_apply = caller == model.maintainer;
            let actual = proxy
                .set_whitelist(&caller, world.whitelists[whitelist].clone())
                .map(|_| ());
            if record_admin(operation, should_apply, actual, stats, violations) {
                model.whitelist = whitelist;
            }
        }
        SimulatedOperation::TransferOwnership { caller, candidate } => {
            let should_apply = caller == model.owner && candidate != model.owner;
            let actual = proxy.transfer_ownership(&caller, candidate);
            if record_admin(operation, should_apply, actual, stats, violations) {
                model.pending_owner = Some(candidate);
            }
        }
        SimulatedOperation::AcceptOwnership { caller } => {
            let should_apply = model.pending_owner == Some(caller);
            let actual = proxy.accept_ownership(&caller).map(|_| ());
            if record_admin(operation, should_apply, actual, stats, violations) {
                model.owner = caller;
                model.pending_owner = None;
            }
        }
    }
}

/// Compare an administrative outcome with the model; returns whether it applied
fn record_admin(
    operation: SimulatedOperation,
    should_apply: bool,
    actual: Result<(), ProxyError>,
    stats: &mut SimulatorStats,
    violations: &mut Vec<Violation>,
) -> bool {
    stats.admin_attempted += 1;
    match (should_apply, actual) {
        (true, Ok(())) => {
            stats.admin_applied += 1;
            true
        }
        (true, Err(e)) => {
            stats.admin_rejected += 1;
            violations.push(Violation::UnexpectedRejection {
                operation,
                error: e.to_string(),
            });
            false
        }
        (false, Ok(())) => {
            // Applied anyway; count it so the journal check stays meaningful
            stats.admin_applied += 1;
            violations.push(Violation::UnauthorizedMutation { operation });
            false
        }
        (false, Err(_)) => {
            stats.admin_rejected += 1;
            false
        }
    }
}

fn perform_read(
    proxy: &WhitelistedFeedProxy,
    caller: &Address,
    kind: ReadKind,
) -> Result<ReadValue, ProxyError> {
    match kind {
        ReadKind::LatestAnswer => proxy.latest_answer(caller).map(ReadValue::Answer),
        ReadKind::LatestRoundData => proxy.latest_round_data(caller).map(ReadValue::Round),
        ReadKind::RoundData(r) => proxy.get_round_data(caller, r).map(ReadValue::Round),
        ReadKind::ProposedLatestRoundData => {
            proxy.proposed_latest_round_data(caller).map(ReadValue::Round)
        }
        ReadKind::ProposedRoundData(r) => {
            proxy.proposed_get_round_data(caller, r).map(ReadValue::Round)
        }
        ReadKind::Decimals => proxy.decimals(caller).map(ReadValue::Decimals),
    }
}

/// What an admitted read must return, asked of the source directly
fn expected_read(world: &World, model: &Model, kind: ReadKind) -> Result<ReadValue, ProxyError> {
    let current = &world.sources[model.current];
    let proposed = model
        .proposed
        .map(|p| &world.sources[p])
        .ok_or(ProxyError::NoProposalPending);

    match kind {
        ReadKind::LatestAnswer => Ok(ReadValue::Answer(current.latest_answer()?)),
        ReadKind::LatestRoundData => Ok(ReadValue::Round(current.latest_round_data()?)),
        ReadKind::RoundData(r) => Ok(ReadValue::Round(current.get_round_data(r)?)),
        ReadKind::ProposedLatestRoundData => Ok(ReadValue::Round(proposed?.latest_round_data()?)),
        ReadKind::ProposedRoundData(r) => Ok(ReadValue::Round(proposed?.get_round_data(r)?)),
        ReadKind::Decimals => Ok(ReadValue::Decimals(current.decimals()?)),
    }
}

fn diverges(snapshot: &ProxySnapshot, model: &Model, world: &World) -> Option<String> {
    let expected_state = if model.proposed.is_some() {
        MigrationState::Proposed
    } else {
        MigrationState::Stable
    };
    let checks = [
        (
            "aggregator",
            snapshot.aggregator == world.sources[model.current].address(),
        ),
        (
            "proposed_aggregator",
            snapshot.proposed_aggregator == model.proposed.map(|p| world.sources[p].address()),
        ),
        (
            "whitelist",
            snapshot.whitelist == world.whitelists[model.whitelist].address(),
        ),
        ("owner", snapshot.owner == model.owner),
        ("pending_owner", snapshot.pending_owner == model.pending_owner),
        ("whitelist_maintainer", snapshot.whitelist_maintainer == model.maintainer),
        ("migration_state", snapshot.migration_state == expected_state),
    ];
    checks
        .iter()
        .find(|(_, ok)| !ok)
        .map(|(field, _)| format!("{field} differs from model"))
}
