use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use rpsledger_node::{simulator::Simulation, Config, ValidatedConfig};
use rpsledger_types::ledger::Tier;
use std::str::FromStr;
use tracing::{info, Level};

fn init_logging(level: Level, json: bool) {
    let builder = tracing_subscriber::fmt().with_max_level(level);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_dry_run_report(config: &ValidatedConfig) {
    let ledger = &config.ledger;
    let simulation = &config.simulation;

    println!("dry-run report");
    println!("  admin: {:?}", config.admin);
    println!("  log_level: {} json={}", config.log_level, config.json_logs);
    println!(
        "  ledger: cooldown_secs={} max_tier_amount={}",
        ledger.cooldown_secs, ledger.max_tier_amount
    );
    for tier in Tier::ALL {
        println!("  tier {tier:?}: {}", ledger.tiers.amount(tier));
    }
    println!(
        "  simulation: players={} rounds={} seed={}",
        simulation.players, simulation.rounds, simulation.seed
    );
    println!(
        "  funding: per_player={} bankroll={}",
        simulation.funding, simulation.bankroll
    );
    println!(
        "  blocks: start_timestamp={} interval_secs={} admin_interval={}",
        simulation.start_timestamp, simulation.block_interval_secs, simulation.admin_interval
    );
}

fn main() {
    if let Err(err) = main_result() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn main_result() -> Result<()> {
    // Parse arguments
    let matches = Command::new("ledger-sim")
        .about("Drives an rpsledger instance through simulated blocks.")
        .arg(Arg::new("config").long("config").required(true))
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate config and exit without simulating")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("rounds")
                .long("rounds")
                .help("Override simulation.rounds")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();
    let dry_run = matches.get_flag("dry-run");

    // Load config
    let config_file = matches
        .get_one::<String>("config")
        .context("missing --config")?;
    let config_file = std::fs::read_to_string(config_file)
        .with_context(|| format!("Could not read config file {config_file}"))?;
    let mut config: Config =
        serde_yaml::from_str(&config_file).context("Could not parse config file")?;
    if let Some(rounds) = matches.get_one::<u64>("rounds") {
        config.simulation.rounds = *rounds;
    }

    if dry_run {
        println!("{:#?}", config.redacted_debug());
        let config = config.validate()?;
        print_dry_run_report(&config);
        println!("config ok");
        return Ok(());
    }

    // Configure telemetry
    let log_level = Level::from_str(&config.log_level).context("Invalid log level")?;
    init_logging(log_level, config.json_logs);
    info!(config = ?config.redacted_debug(), "loaded config file");

    let config = config.validate()?;
    let mut simulation = Simulation::new(&config)?;
    let report = simulation.run()?;

    println!("simulation report");
    println!("  blocks: {}", report.blocks);
    println!(
        "  transactions: included={} rejected={}",
        report.included,
        report.rejected_total()
    );
    for (reason, count) in &report.rejected {
        println!("    {reason}: {count}");
    }
    println!(
        "  outcomes: wins={} draws={} losses={}",
        report.wins, report.draws, report.losses
    );
    println!(
        "  payouts: claimed={} fees_withdrawn={} pool_syncs={}",
        report.claimed, report.fees_withdrawn, report.pool_syncs
    );
    println!(
        "  treasury: creator_fees={} game_bank={}",
        report.creator_fees, report.game_bank
    );
    println!(
        "  custody: held={} outstanding_rewards={}",
        report.custody, report.outstanding
    );
    Ok(())
}
