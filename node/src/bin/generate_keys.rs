//! Key and config generation for a local ledger simulation
//!
//! Usage: cargo run --bin generate-keys -- --players 8 --output configs/local.yaml
//!
//! This generates:
//! - a ledger-sim config with the administrator's Ed25519 key
//! - the identities the simulator will derive for its players

use anyhow::{Context, Result};
use clap::Parser;
use commonware_codec::Encode;
use commonware_cryptography::{ed25519::PrivateKey, Signer};
use commonware_utils::hex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rpsledger_node::defaults::{
    DEFAULT_ADMIN_INTERVAL, DEFAULT_BANKROLL, DEFAULT_BLOCK_INTERVAL_SECS, DEFAULT_FUNDING,
    DEFAULT_LOG_LEVEL, DEFAULT_START_TIMESTAMP,
};
use rpsledger_types::ledger::{DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_TIER_AMOUNT};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate-keys")]
#[command(about = "Generate an administrator key and ledger-sim config")]
struct Args {
    /// Number of simulated players
    #[arg(short, long, default_value_t = 8)]
    players: usize,

    /// Number of simulated blocks
    #[arg(short, long, default_value_t = 64)]
    rounds: u64,

    /// Output path for the config file
    #[arg(short, long, default_value = "configs/local.yaml")]
    output: PathBuf,

    /// Random seed for key generation (use different seeds for different ledgers)
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("generate-keys failed: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    // Players are derived from `seed + 1 ..= seed + players`; the admin seed is drawn instead.
    let mut rng = StdRng::seed_from_u64(args.seed);
    let admin = PrivateKey::from_seed(rng.gen());
    let admin_public = admin.public_key();

    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create output directory {}", parent.display())
        })?;
    }

    let config = format!(
        r#"# Ledger simulation configuration
# Generated by generate-keys (seed: {seed})
# DO NOT commit private keys to version control!

# Administrator signing key
private_key: "{private_key}"

log_level: "{log_level}"
json_logs: false

# Ledger
cooldown_secs: {cooldown_secs}
max_tier_amount: {max_tier_amount}
tiers: {{}}

# Simulator
simulation:
  players: {players}
  rounds: {rounds}
  seed: {seed}
  funding: {funding}
  bankroll: {bankroll}
  start_timestamp: {start_timestamp}
  block_interval_secs: {block_interval_secs}
  admin_interval: {admin_interval}
"#,
        seed = args.seed,
        private_key = hex(&admin.encode()),
        log_level = DEFAULT_LOG_LEVEL,
        cooldown_secs = DEFAULT_COOLDOWN_SECS,
        max_tier_amount = DEFAULT_MAX_TIER_AMOUNT,
        players = args.players,
        rounds = args.rounds,
        funding = DEFAULT_FUNDING,
        bankroll = DEFAULT_BANKROLL,
        start_timestamp = DEFAULT_START_TIMESTAMP,
        block_interval_secs = DEFAULT_BLOCK_INTERVAL_SECS,
        admin_interval = DEFAULT_ADMIN_INTERVAL,
    );
    fs::write(&args.output, config)
        .with_context(|| format!("Failed to write config {}", args.output.display()))?;
    println!("Created: {}", args.output.display());

    println!();
    println!("=== Ledger Configuration ===");
    println!();
    println!("Administrator:");
    println!("  {}", hex(&admin_public.encode()));
    println!();
    println!("Players:");
    for i in 0..args.players as u64 {
        let player = PrivateKey::from_seed(args.seed.wrapping_add(i + 1)).public_key();
        println!("  Player {}: {}", i, hex(&player.encode()));
    }
    println!();
    println!("=== Next Steps ===");
    println!();
    println!("1. Check the config:");
    println!(
        "   cargo run --bin ledger-sim -- --config {} --dry-run",
        args.output.display()
    );
    println!();
    println!("2. Run the simulation:");
    println!(
        "   cargo run --bin ledger-sim -- --config {}",
        args.output.display()
    );

    Ok(())
}
