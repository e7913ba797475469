use feedgate_proxy::migration::{allowed_transitions, validate_transition};
use feedgate_proxy::{MigrationState, ProxyError, ProxyEvent, WhitelistedFeedProxy};
use feedgate_test_utils::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn scenario_proxy() -> WhitelistedFeedProxy {
    WhitelistedFeedProxy::new(scenario_source_a(), reader_whitelist(), owner())
}

#[test]
fn test_scenario_a_to_b() {
    let proxy = scenario_proxy();
    let reader = reader();

    assert_eq!(proxy.get_round_data(&reader, SCENARIO_ROUND), Ok(scenario_round()));

    let source_b = scenario_source_b();
    let latest_b = feedgate_types::Aggregator::latest_round(&*source_b).unwrap();
    proxy.propose_aggregator(&owner(), source_b).unwrap();
    assert_eq!(proxy.migration_state(), MigrationState::Proposed);

    let proposed = proxy.proposed_get_round_data(&reader, latest_b).unwrap();
    assert_eq!(proposed.round_id, latest_b);
    assert_eq!(proposed.answer, 54320);
    assert_eq!(proxy.proposed_latest_round_data(&reader), Ok(proposed));

    // Active reads are untouched while the proposal is pending
    assert_eq!(proxy.get_round_data(&reader, SCENARIO_ROUND), Ok(scenario_round()));
    assert_eq!(proxy.aggregator(), source_address_a());

    proxy.confirm_aggregator(&owner(), &source_address_b()).unwrap();
    assert_eq!(proxy.aggregator(), source_address_b());
    assert_eq!(proxy.proposed_aggregator(), None);
    assert_eq!(proxy.migration_state(), MigrationState::Stable);
    assert_eq!(proxy.latest_answer(&reader), Ok(54320));
    assert_eq!(proxy.description(&reader).as_deref(), Ok("B / USD"));
    assert_eq!(proxy.version(&reader), Ok(2));
}

#[test]
fn test_scenario_journal() {
    let proxy = scenario_proxy();
    proxy.propose_aggregator(&owner(), scenario_source_b()).unwrap();
    proxy.confirm_aggregator(&owner(), &source_address_b()).unwrap();

    let events: Vec<ProxyEvent> = proxy.journal().entries().into_iter().map(|e| e.event).collect();
    assert_eq!(
        events,
        vec![
            ProxyEvent::AggregatorProposed {
                current: source_address_a(),
                proposed: source_address_b(),
                displaced: None,
            },
            ProxyEvent::AggregatorConfirmed {
                previous: source_address_a(),
                latest: source_address_b(),
            },
        ]
    );
    assert!(proxy.journal().verify_integrity().is_ok());
}

#[test]
fn test_reproposal_displaces_earlier_candidate() {
    let proxy = scenario_proxy();
    let c = addr(0xd000);

    proxy.propose_aggregator(&owner(), scenario_source_b()).unwrap();
    let proposal = proxy.propose_aggregator(&owner(), empty_source(c)).unwrap();
    assert_eq!(proposal.displaced, Some(source_address_b()));
    assert_eq!(proxy.proposed_aggregator(), Some(c));

    // The displaced candidate can no longer be confirmed
    assert_eq!(
        proxy.confirm_aggregator(&owner(), &source_address_b()),
        Err(ProxyError::ProposalMismatch {
            expected: source_address_b(),
            pending: Some(c),
        })
    );
    assert_eq!(proxy.aggregator(), source_address_a());
}

#[test]
fn test_confirm_without_proposal() {
    let proxy = scenario_proxy();
    assert_eq!(
        proxy.confirm_aggregator(&owner(), &source_address_b()),
        Err(ProxyError::ProposalMismatch {
            expected: source_address_b(),
            pending: None,
        })
    );
    assert!(proxy.journal().is_empty());
}

#[test]
fn test_proposing_active_source_rejected() {
    let proxy = scenario_proxy();
    assert_eq!(
        proxy.propose_aggregator(&owner(), empty_source(source_address_a())),
        Err(ProxyError::AlreadyActive(source_address_a()))
    );
    assert_eq!(proxy.proposed_aggregator(), None);
}

#[test]
fn test_migration_is_owner_only() {
    let proxy = scenario_proxy();
    for caller in [reader(), stranger(), maintainer()] {
        let err = proxy.propose_aggregator(&caller, scenario_source_b()).unwrap_err();
        assert!(err.is_authorization_failure());
    }

    proxy.propose_aggregator(&owner(), scenario_source_b()).unwrap();
    let err = proxy.confirm_aggregator(&reader(), &source_address_b()).unwrap_err();
    assert!(err.is_authorization_failure());
    assert_eq!(proxy.aggregator(), source_address_a());
    assert_eq!(proxy.proposed_aggregator(), Some(source_address_b()));
}

#[test]
fn test_proposed_reads_without_proposal() {
    let proxy = scenario_proxy();
    assert_eq!(
        proxy.proposed_get_round_data(&reader(), 1),
        Err(ProxyError::NoProposalPending)
    );
    assert_eq!(
        proxy.proposed_latest_round_data(&reader()),
        Err(ProxyError::NoProposalPending)
    );
}

#[test]
fn test_stable_transitions() {
    assert!(validate_transition(MigrationState::Stable, MigrationState::Proposed).is_ok());
    assert!(validate_transition(MigrationState::Stable, MigrationState::Stable).is_err());
}

proptest! {
    #[test]
    fn prop_transitions_agree_with_allowed(
        from in prop_oneof![Just(MigrationState::Stable), Just(MigrationState::Proposed)],
        to in prop_oneof![Just(MigrationState::Stable), Just(MigrationState::Proposed)],
    ) {
        let allowed = allowed_transitions(from);
        prop_assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
    }
}
