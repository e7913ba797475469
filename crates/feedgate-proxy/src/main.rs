use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use feedgate_proxy::simulator::{run_simulator, SimulatorConfig};
use feedgate_proxy::{ProxyConfig, WhitelistedFeedProxy};
use feedgate_types::{Address, MemoryAggregator, MemoryWhitelist, Round};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Command::new("feedgate")
        .version(feedgate_proxy::VERSION)
        .about("Whitelisted, migratable feed proxy")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run randomized invariant simulation")
                .arg(
                    Arg::new("operations")
                        .long("operations")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                )
                .arg(
                    Arg::new("owner-bypass")
                        .long("owner-bypass")
                        .action(ArgAction::SetTrue)
                        .help("Let the owner read without being whitelisted"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output report as JSON"),
                ),
        )
        .subcommand(
            Command::new("scenario")
                .about("Walk through a propose/confirm migration between two feeds")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output steps as JSON"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Load and validate a proxy config file")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to TOML config"),
                ),
        );

    let matches = cli.get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("simulate", args)) => simulate(args),
        Some(("scenario", args)) => scenario(args.get_flag("json")),
        Some(("check-config", args)) => {
            let path = args
                .get_one::<PathBuf>("path")
                .context("missing config path")?;
            let config = ProxyConfig::load(path)
                .with_context(|| format!("checking {}", path.display()))?;
            println!("Config OK");
            println!("  Owner: {}", config.owner);
            println!("  Maintainer: {}", config.initial_maintainer());
            println!("  Owner Bypasses Whitelist: {}", config.owner_bypasses_whitelist);
            println!("  Maintainer Reassignment: {}", config.allow_maintainer_reassignment);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn simulate(args: &ArgMatches) -> Result<()> {
    let config = SimulatorConfig {
        seed: args.get_one::<u64>("seed").copied().context("missing --seed")?,
        operations: args
            .get_one::<u64>("operations")
            .copied()
            .context("missing --operations")?,
        stop_on_first_violation: args.get_flag("stop-on-violation"),
        owner_bypasses_whitelist: args.get_flag("owner-bypass"),
    };

    let report = run_simulator(config);
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.generate_text());
    }

    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ScenarioStep {
    step: &'static str,
    aggregator: Address,
    proposed_aggregator: Option<Address>,
    round: Option<Round>,
}

fn scenario(json: bool) -> Result<()> {
    let owner = Address::from_low_u64(0x0a);
    let reader = Address::from_low_u64(0x0c);
    let address_a = Address::from_low_u64(0xa000);
    let address_b = Address::from_low_u64(0xb000);

    let feed_a = MemoryAggregator::new(address_a, 8).with_description("feed A");
    feed_a.publish_round(Round::new(17, 54321, 677, 678));
    let feed_b = MemoryAggregator::new(address_b, 8).with_description("feed B");
    let latest_b = feed_b.publish(54320, 700, 701);

    let whitelist =
        MemoryWhitelist::new(Address::from_low_u64(0xc000), owner).with_members([reader]);
    let proxy = WhitelistedFeedProxy::new(Arc::new(feed_a), Arc::new(whitelist), owner);

    let mut steps = Vec::new();
    let mut record = |step: &'static str, round: Option<Round>| {
        steps.push(ScenarioStep {
            step,
            aggregator: proxy.aggregator(),
            proposed_aggregator: proxy.proposed_aggregator(),
            round,
        });
    };

    record("read round 17", Some(proxy.get_round_data(&reader, 17)?));
    proxy.propose_aggregator(&owner, Arc::new(feed_b))?;
    record(
        "read proposed latest",
        Some(proxy.proposed_get_round_data(&reader, latest_b)?),
    );
    record("read round 17 again", Some(proxy.get_round_data(&reader, 17)?));
    proxy.confirm_aggregator(&owner, &address_b)?;
    record("confirmed", None);

    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        for step in &steps {
            println!(
                "{:<22} aggregator={} proposed={:?} round={:?}",
                step.step, step.aggregator, step.proposed_aggregator, step.round
            );
        }
    }
    Ok(())
}
