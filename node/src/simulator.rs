//! Deterministic block simulator.
//!
//! Seeded players wager and claim through signed transactions, and the administrator
//! periodically withdraws fees and resyncs the pool. Everything runs against an in-memory
//! ledger, so a seed always reproduces the same [Report].

use anyhow::{Context, Result};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::Sha256,
    Hasher, Signer,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rpsledger_execution::{Ledger, Memory};
use rpsledger_types::{
    execution::{BlockEnv, Event, Instruction, Output, Transaction},
    ledger::{Move, Outcome, Tier},
};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{SimulationConfig, ValidatedConfig};

/// Aggregate view of a simulation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub blocks: u64,
    /// Transactions that consumed a nonce, whether or not their operation succeeded.
    pub included: u64,
    /// Rolled-back operations by reason.
    pub rejected: BTreeMap<String, u64>,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub claimed: u64,
    pub fees_withdrawn: u64,
    pub pool_syncs: u64,

    pub custody: u64,
    pub creator_fees: u64,
    pub game_bank: u64,
    pub outstanding: u64,
}

impl Report {
    fn record(&mut self, outputs: &[Output]) {
        for output in outputs {
            match output {
                Output::Event(Event::Resolved { outcome, .. }) => match outcome {
                    Outcome::Win => self.wins += 1,
                    Outcome::Draw => self.draws += 1,
                    Outcome::Lose => self.losses += 1,
                },
                Output::Event(Event::Claimed { amount, .. }) => {
                    self.claimed = self.claimed.saturating_add(*amount);
                }
                Output::Event(Event::FeesWithdrawn { amount }) => {
                    self.fees_withdrawn = self.fees_withdrawn.saturating_add(*amount);
                }
                Output::Event(Event::PoolSynced { .. }) => self.pool_syncs += 1,
                Output::Event(_) => {}
                Output::Transaction(_) => self.included += 1,
                Output::Rejected { reason, .. } => {
                    *self.rejected.entry(reason.clone()).or_default() += 1;
                }
            }
        }
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected.values().sum()
    }
}

pub struct Simulation {
    ledger: Ledger<Memory>,
    admin: PrivateKey,
    players: Vec<PrivateKey>,
    settings: SimulationConfig,
    rng: StdRng,
    height: u64,
    timestamp: u64,
}

impl Simulation {
    /// Opens a fresh ledger and credits the genesis balances.
    pub fn new(config: &ValidatedConfig) -> Result<Self> {
        let settings = config.simulation.clone();
        let mut ledger = Ledger::new(Memory::default(), config.ledger.clone())
            .context("failed to open ledger")?;

        let players: Vec<_> = (0..settings.players.get() as u64)
            .map(|i| PrivateKey::from_seed(settings.seed.wrapping_add(i + 1)))
            .collect();
        for private in &players {
            ledger.fund(&private.public_key(), settings.funding)?;
        }
        ledger.fund(&config.admin, settings.bankroll)?;

        Ok(Self {
            ledger,
            admin: config.signer.clone(),
            players,
            rng: StdRng::seed_from_u64(settings.seed),
            height: 0,
            timestamp: settings.start_timestamp,
            settings,
        })
    }

    pub fn ledger(&self) -> &Ledger<Memory> {
        &self.ledger
    }

    pub fn players(&self) -> impl Iterator<Item = PublicKey> + '_ {
        self.players.iter().map(|private| private.public_key())
    }

    fn next_env(&mut self) -> BlockEnv {
        self.height += 1;
        self.timestamp += self.settings.block_interval_secs.get();
        let entropy = Sha256::hash(&self.rng.gen::<[u8; 32]>());
        BlockEnv::new(self.height, self.timestamp, entropy)
    }

    /// Builds the next block's transactions.
    ///
    /// A player wagers when their cooldown has elapsed and they can cover the stake, and
    /// otherwise claims whatever is outstanding.
    fn build_block(&mut self, env: &BlockEnv) -> Result<Vec<Transaction>> {
        let tiers = self.ledger.tiers()?;
        let cooldown = self.ledger.config().cooldown_secs;
        let mut transactions = Vec::with_capacity(self.players.len() + 2);

        let mut admin_nonce = self.ledger.nonce(&self.admin.public_key())?;
        if env.height == 1 && self.settings.bankroll > 0 {
            transactions.push(Transaction::sign_with_value(
                &self.admin,
                admin_nonce,
                Instruction::Deposit,
                self.settings.bankroll,
            ));
            // Seed the pool with the bankroll so early wins are backed.
            transactions.push(Transaction::sign(
                &self.admin,
                admin_nonce + 1,
                Instruction::SyncPool,
            ));
            admin_nonce += 2;
        }

        for private in &self.players {
            let public = private.public_key();
            let nonce = self.ledger.nonce(&public)?;
            let ready = self
                .ledger
                .player(&public)?
                .map_or(true, |player| env.timestamp >= player.ready_at(cooldown));
            let tier = Tier::ALL[self.rng.gen_range(0..Tier::ALL.len())];
            let stake = tiers.amount(tier);

            if ready && self.ledger.balance(&public)? >= stake {
                let player_move = Move::from_index(self.rng.gen_range(0..3));
                transactions.push(Transaction::sign_with_value(
                    private,
                    nonce,
                    Instruction::SubmitWager { player_move, tier },
                    stake,
                ));
            } else if self.ledger.outstanding_rewards(&public)? > 0 {
                transactions.push(Transaction::sign(private, nonce, Instruction::ClaimAll));
            }
        }

        if env.height % self.settings.admin_interval.get() == 0 {
            if self.ledger.creator_fees()? > 0 {
                transactions.push(Transaction::sign(
                    &self.admin,
                    admin_nonce,
                    Instruction::WithdrawFees,
                ));
                admin_nonce += 1;
            }
            transactions.push(Transaction::sign(
                &self.admin,
                admin_nonce,
                Instruction::SyncPool,
            ));
        }

        Ok(transactions)
    }

    /// Produces and executes one block.
    pub fn step(&mut self, report: &mut Report) -> Result<()> {
        let env = self.next_env();
        let transactions = self.build_block(&env)?;
        let submitted = transactions.len();
        let (outputs, _) = self
            .ledger
            .execute(&env, transactions)
            .with_context(|| format!("block {} failed", env.height))?;
        report.blocks += 1;
        report.record(&outputs);
        debug!(
            height = env.height,
            timestamp = env.timestamp,
            submitted,
            outputs = outputs.len(),
            "simulated block"
        );
        Ok(())
    }

    /// Runs every configured round and snapshots the final accounting.
    pub fn run(&mut self) -> Result<Report> {
        let mut report = Report::default();
        for _ in 0..self.settings.rounds.get() {
            self.step(&mut report)?;
        }

        let treasury = self.ledger.treasury()?;
        report.custody = self.ledger.custodied_balance()?;
        report.creator_fees = treasury.creator_fees;
        report.game_bank = treasury.game_bank;
        for public in self.players() {
            report.outstanding = report
                .outstanding
                .saturating_add(self.ledger.outstanding_rewards(&public)?);
        }

        info!(
            blocks = report.blocks,
            included = report.included,
            rejected = report.rejected_total(),
            wins = report.wins,
            draws = report.draws,
            losses = report.losses,
            custody = report.custody,
            "simulation finished"
        );
        Ok(report)
    }
}
