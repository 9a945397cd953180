use anyhow::Result;
use commonware_cryptography::ed25519::PublicKey;
use rpsledger_types::{
    execution::{BlockEnv, Event, Instruction, Key, Output, Transaction, Value},
    ledger::{
        LedgerError, Move, PendingReward, Player, Tier, TierRegistry, Treasury,
        DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_TIER_AMOUNT,
    },
};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::{
    guard::ReentrancyLock,
    oracle::{EntropyOracle, OutcomeOracle},
    receiver::{Receiver, Receivers},
    state::{
        self, load_balance, load_custody, load_player, load_rewards, load_switches, load_tiers,
        load_treasury, Memory, State,
    },
    ExecutionError, Layer,
};

/// Fixed parameters of a ledger instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// The only identity allowed to run administrative operations.
    pub admin: PublicKey,
    /// Minimum seconds between two wagers from the same player.
    pub cooldown_secs: u64,
    /// Upper bound accepted by tier updates.
    pub max_tier_amount: u64,
    /// Stake table installed when the state holds none.
    pub tiers: TierRegistry,
}

impl LedgerConfig {
    pub fn new(admin: PublicKey) -> Self {
        Self {
            admin,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            max_tier_amount: DEFAULT_MAX_TIER_AMOUNT,
            tiers: TierRegistry::default(),
        }
    }

    /// Checks the initial tier table against the cap.
    pub fn validate(&self) -> Result<(), LedgerError> {
        for (_, amount) in self.tiers.iter() {
            if amount == 0 {
                return Err(LedgerError::InvalidTierAmount);
            }
            if amount > self.max_tier_amount {
                return Err(LedgerError::TierAmountTooHigh {
                    amount,
                    max: self.max_tier_amount,
                });
            }
        }
        Ok(())
    }
}

/// The wagering ledger: committed state plus everything an operation needs to run.
///
/// Each operation runs in its own [`Layer`]. It either commits every write or none of them.
pub struct Ledger<S: State = Memory> {
    state: S,
    config: LedgerConfig,
    oracle: Box<dyn OutcomeOracle>,
    receivers: Receivers,
    lock: ReentrancyLock,
}

impl<S: State> Ledger<S> {
    /// Opens a ledger over `state`, installing the configured tier table if none is stored.
    pub fn new(mut state: S, config: LedgerConfig) -> Result<Self, ExecutionError> {
        config.validate()?;
        if state.get(&Key::Tiers)?.is_none() {
            state.insert(Key::Tiers, Value::Tiers(config.tiers))?;
        }
        Ok(Self {
            state,
            config,
            oracle: Box::new(EntropyOracle),
            receivers: Receivers::new(),
            lock: ReentrancyLock::default(),
        })
    }

    pub fn with_oracle(mut self, oracle: impl OutcomeOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    /// Attaches logic that runs whenever `public` receives value from the ledger.
    pub fn register_receiver(&mut self, public: PublicKey, receiver: impl Receiver + 'static) {
        self.receivers.insert(public, Box::new(receiver));
    }

    pub fn unregister_receiver(&mut self, public: &PublicKey) -> Option<Box<dyn Receiver>> {
        self.receivers.remove(public)
    }

    /// Credits `amount` to `public`'s balance outside the ledger (genesis allocation).
    pub fn fund(&mut self, public: &PublicKey, amount: u64) -> Result<u64> {
        let balance = load_balance(&self.state, public)?
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.state
            .insert(Key::Balance(public.clone()), Value::Balance(balance))?;
        Ok(balance)
    }

    fn transact(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        instruction: Instruction,
        value: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        let mut layer = Layer::new(
            &self.state,
            env,
            &self.config,
            self.oracle.as_ref(),
            &mut self.receivers,
            &self.lock,
        );
        if let Err(err) = layer.apply(caller, &instruction, value) {
            if let Some(rejection) = err.rejection() {
                warn!(
                    caller = ?caller,
                    ?instruction,
                    reason = rejection.reason(),
                    error = %rejection,
                    "operation rejected"
                );
            }
            return Err(err);
        }
        let events = layer.take_events();
        let changes = layer.commit();
        self.state.apply(changes)?;
        Ok(events)
    }

    // === Operations ===

    pub fn submit_wager(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        player_move: Move,
        tier: Tier,
        stake: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::SubmitWager { player_move, tier }, stake)
    }

    pub fn claim(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        index: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::Claim { index }, 0)
    }

    pub fn claim_all(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::ClaimAll, 0)
    }

    pub fn withdraw_fees(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::WithdrawFees, 0)
    }

    pub fn set_paused(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        paused: bool,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::SetPaused { paused }, 0)
    }

    pub fn update_tier_amount(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        tier: Tier,
        amount: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::UpdateTierAmount { tier, amount }, 0)
    }

    pub fn emergency_recover(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::EmergencyRecover, 0)
    }

    pub fn sync_pool(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::SyncPool, 0)
    }

    pub fn deposit(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        amount: u64,
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::Deposit, amount)
    }

    pub fn commit_move(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        commitment: [u8; 32],
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::CommitMove { commitment }, 0)
    }

    pub fn reveal_move(
        &mut self,
        env: &BlockEnv,
        caller: &PublicKey,
        player_move: Move,
        salt: [u8; 32],
    ) -> Result<Vec<Event>, ExecutionError> {
        self.transact(env, caller, Instruction::RevealMove { player_move, salt }, 0)
    }

    /// Executes a block of signed transactions and commits the result.
    ///
    /// Returns the output log and the next expected nonce of every identity that had a
    /// transaction accepted.
    pub fn execute(
        &mut self,
        env: &BlockEnv,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let submitted = transactions.len();
        let mut layer = Layer::new(
            &self.state,
            env,
            &self.config,
            self.oracle.as_ref(),
            &mut self.receivers,
            &self.lock,
        );
        let (outputs, processed_nonces) = layer.execute(transactions)?;
        let changes = layer.commit();
        self.state.apply(changes)?;

        info!(
            height = env.height,
            submitted,
            accepted = processed_nonces.len(),
            outputs = outputs.len(),
            "executed block"
        );
        Ok((outputs, processed_nonces))
    }

    // === Queries ===

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn tiers(&self) -> Result<TierRegistry> {
        load_tiers(&self.state)
    }

    pub fn tier_amount(&self, tier: Tier) -> Result<u64> {
        Ok(self.tiers()?.amount(tier))
    }

    pub fn player(&self, public: &PublicKey) -> Result<Option<Player>> {
        load_player(&self.state, public)
    }

    /// Timestamp of the player's last resolved wager (zero if they never played).
    pub fn last_play_time(&self, public: &PublicKey) -> Result<u64> {
        Ok(self
            .player(public)?
            .map(|player| player.last_play_time)
            .unwrap_or_default())
    }

    pub fn total_wins(&self, public: &PublicKey) -> Result<u64> {
        Ok(self
            .player(public)?
            .map(|player| player.total_wins)
            .unwrap_or_default())
    }

    pub fn pending_reward_count(&self, public: &PublicKey) -> Result<u64> {
        Ok(load_rewards(&self.state, public)?.len())
    }

    pub fn pending_rewards(&self, public: &PublicKey) -> Result<Vec<PendingReward>> {
        Ok(load_rewards(&self.state, public)?.entries().to_vec())
    }

    /// Sum of the player's unclaimed entries.
    pub fn outstanding_rewards(&self, public: &PublicKey) -> Result<u64> {
        Ok(load_rewards(&self.state, public)?.outstanding()?)
    }

    pub fn treasury(&self) -> Result<Treasury> {
        load_treasury(&self.state)
    }

    pub fn creator_fees(&self) -> Result<u64> {
        Ok(self.treasury()?.creator_fees)
    }

    pub fn game_bank(&self) -> Result<u64> {
        Ok(self.treasury()?.game_bank)
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(load_switches(&self.state)?.paused)
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    /// Native units held by the ledger.
    pub fn custodied_balance(&self) -> Result<u64> {
        load_custody(&self.state)
    }

    /// Native units held by `public` outside the ledger.
    pub fn balance(&self, public: &PublicKey) -> Result<u64> {
        load_balance(&self.state, public)
    }

    pub fn nonce(&self, public: &PublicKey) -> Result<u64> {
        state::nonce(&self.state, public)
    }
}
