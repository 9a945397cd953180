//! Ledger operation tests.
//!
//! Cover the split table, the reward ledger and its claim protocol, the cooldown, pause and
//! access gates, the administrative surface and signed batch execution.

use crate::{
    mocks::{create_account_keypair, create_env, create_ledger, ForcedOutcome},
    ExecutionError, Ledger, LedgerConfig, Memory,
};
use commonware_cryptography::ed25519::{PrivateKey, PublicKey};
use proptest::prelude::*;
use rpsledger_types::{
    execution::{Event, Instruction, Output, Transaction},
    ledger::{
        ErrorKind, LedgerError, Move, Outcome, PendingReward, Settlement, Tier,
        CLAIM_ALL_INDEX, DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_TIER_AMOUNT, DEFAULT_TIER_LOW,
        DEFAULT_TIER_MEDIUM, ERROR_STAKE_MISMATCH, UNITS_PER_COIN,
    },
};

const NOW: u64 = 1_700_000_000;

struct Fixture {
    ledger: Ledger<Memory>,
    admin: PublicKey,
    admin_key: PrivateKey,
    player: PublicKey,
    player_key: PrivateKey,
}

fn setup(outcome: Outcome) -> Fixture {
    let (admin_key, admin) = create_account_keypair(0);
    let (player_key, player) = create_account_keypair(1);
    let mut ledger = create_ledger(&admin).with_oracle(ForcedOutcome(outcome));
    ledger.fund(&player, UNITS_PER_COIN).unwrap();
    Fixture {
        ledger,
        admin,
        admin_key,
        player,
        player_key,
    }
}

fn rejection(result: Result<Vec<Event>, ExecutionError>) -> LedgerError {
    match result {
        Err(ExecutionError::Rejected(err)) => err,
        Err(ExecutionError::State(err)) => panic!("unexpected state error: {err:#}"),
        Ok(events) => panic!("expected rejection, got {events:?}"),
    }
}

fn wager(f: &mut Fixture, timestamp: u64) -> Result<Vec<Event>, ExecutionError> {
    f.ledger.submit_wager(
        &create_env(1, timestamp),
        &f.player,
        Move::Rock,
        Tier::Low,
        DEFAULT_TIER_LOW,
    )
}

#[test]
fn test_win_split() {
    let mut f = setup(Outcome::Win);
    let events = wager(&mut f, NOW).unwrap();
    assert_eq!(
        events,
        vec![Event::Resolved {
            player: f.player.clone(),
            player_move: Move::Rock,
            counter_move: Move::Scissors,
            outcome: Outcome::Win,
            net_gain: 4_600_000,
        }]
    );

    assert_eq!(
        f.ledger.pending_rewards(&f.player).unwrap(),
        vec![PendingReward::new(9_600_000)]
    );
    assert_eq!(f.ledger.creator_fees().unwrap(), 150_000);
    // The pool is empty, so it cannot back the win and stays at zero.
    assert_eq!(f.ledger.game_bank().unwrap(), 0);
    assert_eq!(f.ledger.total_wins(&f.player).unwrap(), 1);
    assert_eq!(f.ledger.last_play_time(&f.player).unwrap(), NOW);
    assert_eq!(f.ledger.custodied_balance().unwrap(), DEFAULT_TIER_LOW);
    assert_eq!(
        f.ledger.balance(&f.player).unwrap(),
        UNITS_PER_COIN - DEFAULT_TIER_LOW
    );
}

#[test]
fn test_win_is_backed_by_pool() {
    let mut f = setup(Outcome::Win);
    let env = create_env(1, NOW);
    f.ledger.fund(&f.admin, UNITS_PER_COIN).unwrap();
    f.ledger.deposit(&env, &f.admin, 20_000_000).unwrap();
    f.ledger.sync_pool(&env, &f.admin).unwrap();
    assert_eq!(f.ledger.game_bank().unwrap(), 20_000_000);

    wager(&mut f, NOW).unwrap();
    assert_eq!(f.ledger.creator_fees().unwrap(), 150_000);
    assert_eq!(f.ledger.game_bank().unwrap(), 20_000_000 + 350_000 - 5_100_000);
    assert_eq!(f.ledger.custodied_balance().unwrap(), 25_000_000);

    let env = create_env(2, NOW + 1);
    f.ledger.claim(&env, &f.player, 0).unwrap();
    f.ledger.withdraw_fees(&env, &f.admin).unwrap();
    assert_eq!(f.ledger.creator_fees().unwrap(), 0);
    assert_eq!(
        f.ledger.custodied_balance().unwrap(),
        f.ledger.game_bank().unwrap()
    );
}

#[test]
fn test_draw_split() {
    let mut f = setup(Outcome::Draw);
    let events = wager(&mut f, NOW).unwrap();
    assert!(matches!(
        events.as_slice(),
        [Event::Resolved {
            counter_move: Move::Rock,
            outcome: Outcome::Draw,
            net_gain: 0,
            ..
        }]
    ));
    assert_eq!(
        f.ledger.pending_rewards(&f.player).unwrap(),
        vec![PendingReward::new(4_900_000)]
    );
    assert_eq!(f.ledger.creator_fees().unwrap(), 100_000);
    assert_eq!(f.ledger.game_bank().unwrap(), 0);
    assert_eq!(f.ledger.total_wins(&f.player).unwrap(), 0);
}

#[test]
fn test_lose_split() {
    let mut f = setup(Outcome::Lose);
    let events = wager(&mut f, NOW).unwrap();
    assert!(matches!(
        events.as_slice(),
        [Event::Resolved {
            counter_move: Move::Paper,
            outcome: Outcome::Lose,
            net_gain: 0,
            ..
        }]
    ));
    assert_eq!(f.ledger.pending_reward_count(&f.player).unwrap(), 0);
    assert_eq!(f.ledger.creator_fees().unwrap(), 150_000);
    assert_eq!(f.ledger.game_bank().unwrap(), 4_850_000);
    assert_eq!(f.ledger.last_play_time(&f.player).unwrap(), NOW);
}

#[test]
fn test_stake_must_match_tier_exactly() {
    let mut f = setup(Outcome::Win);
    let before = f.ledger.state().clone();
    for attached in [0, DEFAULT_TIER_LOW - 1, DEFAULT_TIER_LOW + 1, DEFAULT_TIER_MEDIUM] {
        let err = rejection(f.ledger.submit_wager(
            &create_env(1, NOW),
            &f.player,
            Move::Paper,
            Tier::Low,
            attached,
        ));
        assert_eq!(err.kind(), ErrorKind::Value);
        assert!(matches!(err, LedgerError::StakeMismatch { tier: Tier::Low, .. }));
    }
    assert_eq!(f.ledger.state(), &before);
}

#[test]
fn test_unfunded_player_cannot_wager() {
    let mut f = setup(Outcome::Win);
    let (_, stranger) = create_account_keypair(9);
    let err = rejection(f.ledger.submit_wager(
        &create_env(1, NOW),
        &stranger,
        Move::Rock,
        Tier::Low,
        DEFAULT_TIER_LOW,
    ));
    assert_eq!(
        err,
        LedgerError::InsufficientFunds {
            needed: DEFAULT_TIER_LOW,
            available: 0
        }
    );
    assert!(f.ledger.player(&stranger).unwrap().is_none());
}

#[test]
fn test_cooldown_boundary() {
    let mut f = setup(Outcome::Lose);
    wager(&mut f, NOW).unwrap();

    let err = rejection(wager(&mut f, NOW + DEFAULT_COOLDOWN_SECS - 1));
    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(
        err,
        LedgerError::CooldownActive {
            now: NOW + DEFAULT_COOLDOWN_SECS - 1,
            ready_at: NOW + DEFAULT_COOLDOWN_SECS,
        }
    );

    wager(&mut f, NOW + DEFAULT_COOLDOWN_SECS).unwrap();
    assert_eq!(
        f.ledger.last_play_time(&f.player).unwrap(),
        NOW + DEFAULT_COOLDOWN_SECS
    );
}

#[test]
fn test_cooldown_is_per_player() {
    let mut f = setup(Outcome::Lose);
    let (_, other) = create_account_keypair(2);
    f.ledger.fund(&other, UNITS_PER_COIN).unwrap();
    wager(&mut f, NOW).unwrap();
    f.ledger
        .submit_wager(&create_env(1, NOW), &other, Move::Rock, Tier::Low, DEFAULT_TIER_LOW)
        .unwrap();
}

#[test]
fn test_pause_gates_wagers_only() {
    let mut f = setup(Outcome::Draw);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 60);

    let events = f.ledger.set_paused(&env, &f.admin, true).unwrap();
    assert_eq!(events, vec![Event::PauseChanged { paused: true }]);
    assert!(f.ledger.is_paused().unwrap());

    let err = rejection(wager(&mut f, NOW + 60));
    assert_eq!(err, LedgerError::Paused);
    assert_eq!(err.reason(), "StateError");

    // Claims keep working while paused.
    f.ledger.claim(&env, &f.player, 0).unwrap();

    f.ledger.set_paused(&env, &f.admin, false).unwrap();
    wager(&mut f, NOW + 60).unwrap();
}

#[test]
fn test_claim_pays_once() {
    let mut f = setup(Outcome::Draw);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);
    let before = f.ledger.balance(&f.player).unwrap();

    let events = f.ledger.claim(&env, &f.player, 0).unwrap();
    assert_eq!(
        events,
        vec![Event::Claimed {
            player: f.player.clone(),
            index: 0,
            amount: 4_900_000,
        }]
    );
    assert_eq!(f.ledger.balance(&f.player).unwrap(), before + 4_900_000);
    assert_eq!(f.ledger.custodied_balance().unwrap(), 100_000);
    assert!(f.ledger.pending_rewards(&f.player).unwrap()[0].claimed);

    let err = rejection(f.ledger.claim(&env, &f.player, 0));
    assert_eq!(err, LedgerError::AlreadyClaimed { index: 0 });
    assert_eq!(err.reason(), "AlreadyClaimedError");
    assert_eq!(f.ledger.balance(&f.player).unwrap(), before + 4_900_000);
    assert!(f.ledger.pending_rewards(&f.player).unwrap()[0].claimed);
}

#[test]
fn test_claim_without_entries_is_index_error() {
    let mut f = setup(Outcome::Win);
    let err = rejection(f.ledger.claim(&create_env(1, NOW), &f.player, 0));
    assert_eq!(err, LedgerError::IndexOutOfRange { index: 0, len: 0 });
    assert_eq!(err.reason(), "IndexError");
}

#[test]
fn test_underfunded_claim_fails_without_marking() {
    let mut f = setup(Outcome::Win);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);

    // A win owes 192% of the stake but custody only holds the stake, part of which backs fees.
    let err = rejection(f.ledger.claim(&env, &f.player, 0));
    assert_eq!(
        err,
        LedgerError::InsufficientFunds {
            needed: 9_600_000,
            available: DEFAULT_TIER_LOW - 150_000
        }
    );
    assert_eq!(err.reason(), "TransferFailed");
    assert!(!f.ledger.pending_rewards(&f.player).unwrap()[0].claimed);
    assert_eq!(f.ledger.custodied_balance().unwrap(), DEFAULT_TIER_LOW);

    f.ledger.fund(&f.admin, UNITS_PER_COIN).unwrap();
    f.ledger.deposit(&env, &f.admin, 10_000_000).unwrap();
    f.ledger.claim(&env, &f.player, 0).unwrap();
    assert!(f.ledger.pending_rewards(&f.player).unwrap()[0].claimed);
}

#[test]
fn test_claim_cannot_spend_accrued_fees() {
    let mut f = setup(Outcome::Win);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);

    // Custody now equals the reward exactly, but 150_000 of it belongs to the fees.
    f.ledger.fund(&f.admin, UNITS_PER_COIN).unwrap();
    f.ledger.deposit(&env, &f.admin, 4_600_000).unwrap();
    assert_eq!(f.ledger.custodied_balance().unwrap(), 9_600_000);

    let err = rejection(f.ledger.claim(&env, &f.player, 0));
    assert_eq!(
        err,
        LedgerError::InsufficientFunds {
            needed: 9_600_000,
            available: 9_450_000
        }
    );
    let err = rejection(f.ledger.claim_all(&env, &f.player));
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(f.ledger.outstanding_rewards(&f.player).unwrap(), 9_600_000);

    let events = f.ledger.withdraw_fees(&env, &f.admin).unwrap();
    assert_eq!(events, vec![Event::FeesWithdrawn { amount: 150_000 }]);
    assert_eq!(f.ledger.custodied_balance().unwrap(), 9_450_000);
}

#[test]
fn test_claim_all_folds_unclaimed_entries() {
    let mut f = setup(Outcome::Draw);
    wager(&mut f, NOW).unwrap();
    wager(&mut f, NOW + DEFAULT_COOLDOWN_SECS).unwrap();
    wager(&mut f, NOW + 2 * DEFAULT_COOLDOWN_SECS).unwrap();
    let env = create_env(5, NOW + 100);

    f.ledger.claim(&env, &f.player, 1).unwrap();
    let events = f.ledger.claim_all(&env, &f.player).unwrap();
    assert_eq!(
        events,
        vec![Event::Claimed {
            player: f.player.clone(),
            index: CLAIM_ALL_INDEX,
            amount: 2 * 4_900_000,
        }]
    );
    assert!(f
        .ledger
        .pending_rewards(&f.player)
        .unwrap()
        .iter()
        .all(|entry| entry.claimed));
    assert_eq!(f.ledger.outstanding_rewards(&f.player).unwrap(), 0);

    let err = rejection(f.ledger.claim_all(&env, &f.player));
    assert_eq!(err, LedgerError::NothingToClaim);
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn test_admin_operations_reject_non_admin() {
    let mut f = setup(Outcome::Lose);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);
    let before = f.ledger.state().clone();
    let player = f.player.clone();

    let attempts = [
        f.ledger.withdraw_fees(&env, &player),
        f.ledger.set_paused(&env, &player, true),
        f.ledger.update_tier_amount(&env, &player, Tier::Low, 1),
        f.ledger.emergency_recover(&env, &player),
        f.ledger.sync_pool(&env, &player),
    ];
    for attempt in attempts {
        let err = rejection(attempt);
        assert_eq!(err, LedgerError::Unauthorized);
        assert_eq!(err.reason(), "AuthorizationError");
    }
    assert_eq!(f.ledger.state(), &before);
}

#[test]
fn test_withdraw_fees_zeroes_and_pays_admin() {
    let mut f = setup(Outcome::Lose);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);

    let events = f.ledger.withdraw_fees(&env, &f.admin).unwrap();
    assert_eq!(events, vec![Event::FeesWithdrawn { amount: 150_000 }]);
    assert_eq!(f.ledger.creator_fees().unwrap(), 0);
    assert_eq!(f.ledger.game_bank().unwrap(), 4_850_000);
    assert_eq!(f.ledger.balance(&f.admin).unwrap(), 150_000);
    assert_eq!(f.ledger.custodied_balance().unwrap(), 4_850_000);

    let events = f.ledger.withdraw_fees(&env, &f.admin).unwrap();
    assert_eq!(events, vec![Event::FeesWithdrawn { amount: 0 }]);
}

#[test]
fn test_update_tier_amount() {
    let mut f = setup(Outcome::Lose);
    let env = create_env(1, NOW);

    let err = rejection(f.ledger.update_tier_amount(
        &env,
        &f.admin,
        Tier::High,
        DEFAULT_MAX_TIER_AMOUNT + 1,
    ));
    assert_eq!(
        err,
        LedgerError::TierAmountTooHigh {
            amount: DEFAULT_MAX_TIER_AMOUNT + 1,
            max: DEFAULT_MAX_TIER_AMOUNT
        }
    );
    assert_eq!(err.reason(), "ValueError");
    let err = rejection(f.ledger.update_tier_amount(&env, &f.admin, Tier::High, 0));
    assert_eq!(err, LedgerError::InvalidTierAmount);

    let events = f
        .ledger
        .update_tier_amount(&env, &f.admin, Tier::Low, DEFAULT_MAX_TIER_AMOUNT)
        .unwrap();
    assert_eq!(
        events,
        vec![Event::TierUpdated {
            tier: Tier::Low,
            amount: DEFAULT_MAX_TIER_AMOUNT
        }]
    );
    assert_eq!(f.ledger.tier_amount(Tier::Low).unwrap(), DEFAULT_MAX_TIER_AMOUNT);
    assert_eq!(f.ledger.tier_amount(Tier::Medium).unwrap(), DEFAULT_TIER_MEDIUM);

    // The old amount no longer matches.
    let err = rejection(wager(&mut f, NOW));
    assert!(matches!(err, LedgerError::StakeMismatch { .. }));
    f.ledger
        .submit_wager(&env, &f.player, Move::Rock, Tier::Low, DEFAULT_MAX_TIER_AMOUNT)
        .unwrap();
}

#[test]
fn test_emergency_recover_requires_pause() {
    let mut f = setup(Outcome::Win);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);

    let err = rejection(f.ledger.emergency_recover(&env, &f.admin));
    assert_eq!(err, LedgerError::NotPaused);
    assert_eq!(err.reason(), "StateError");

    f.ledger.set_paused(&env, &f.admin, true).unwrap();
    let events = f.ledger.emergency_recover(&env, &f.admin).unwrap();
    assert_eq!(
        events,
        vec![Event::EmergencyRecovered {
            admin: f.admin.clone(),
            amount: DEFAULT_TIER_LOW,
        }]
    );
    assert_eq!(f.ledger.custodied_balance().unwrap(), 0);
    assert_eq!(f.ledger.balance(&f.admin).unwrap(), DEFAULT_TIER_LOW);

    // Accounting is bypassed: the reward is still owed but can no longer be paid.
    assert_eq!(f.ledger.outstanding_rewards(&f.player).unwrap(), 9_600_000);
    let err = rejection(f.ledger.claim(&env, &f.player, 0));
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
}

#[test]
fn test_sync_pool_reconciles_deposits() {
    let mut f = setup(Outcome::Lose);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);
    f.ledger.deposit(&env, &f.player, 1_000_000).unwrap();
    assert_eq!(f.ledger.game_bank().unwrap(), 4_850_000);

    let events = f.ledger.sync_pool(&env, &f.admin).unwrap();
    assert_eq!(events, vec![Event::PoolSynced { amount: 5_850_000 }]);
    assert_eq!(f.ledger.game_bank().unwrap(), 5_850_000);
    assert_eq!(f.ledger.creator_fees().unwrap(), 150_000);
}

#[test]
fn test_sync_pool_saturates_at_zero() {
    let mut f = setup(Outcome::Lose);
    wager(&mut f, NOW).unwrap();
    let env = create_env(2, NOW + 1);
    f.ledger.set_paused(&env, &f.admin, true).unwrap();
    f.ledger.emergency_recover(&env, &f.admin).unwrap();

    let events = f.ledger.sync_pool(&env, &f.admin).unwrap();
    assert_eq!(events, vec![Event::PoolSynced { amount: 0 }]);
    assert_eq!(f.ledger.creator_fees().unwrap(), 150_000);
}

#[test]
fn test_deprecated_entry_points_always_fail() {
    let mut f = setup(Outcome::Win);
    let env = create_env(1, NOW);
    let before = f.ledger.state().clone();

    let err = rejection(f.ledger.commit_move(&env, &f.player, [1u8; 32]));
    assert_eq!(err, LedgerError::Deprecated);
    assert_eq!(err.reason(), "DeprecatedError");
    let err = rejection(f.ledger.reveal_move(&env, &f.admin, Move::Rock, [2u8; 32]));
    assert_eq!(err, LedgerError::Deprecated);
    assert_eq!(f.ledger.state(), &before);
}

#[test]
fn test_invalid_initial_tiers_rejected() {
    let (_, admin) = create_account_keypair(0);
    let mut config = LedgerConfig::new(admin);
    config.tiers.set(Tier::High, DEFAULT_MAX_TIER_AMOUNT + 1);
    assert!(matches!(
        Ledger::new(Memory::default(), config),
        Err(ExecutionError::Rejected(LedgerError::TierAmountTooHigh { .. }))
    ));
}

#[test]
fn test_execute_signed_batch() {
    let mut f = setup(Outcome::Draw);
    let env = create_env(1, NOW);
    let wager = Instruction::SubmitWager {
        player_move: Move::Scissors,
        tier: Tier::Low,
    };

    let (other_key, other) = create_account_keypair(2);
    f.ledger.fund(&other, UNITS_PER_COIN).unwrap();

    let accepted = Transaction::sign_with_value(&f.player_key, 0, wager.clone(), DEFAULT_TIER_LOW);
    let replayed = accepted.clone();
    // Sent by a player without a cooldown, so the stake check decides.
    let mismatched = Transaction::sign_with_value(&other_key, 0, wager, 1);
    let mut forged = Transaction::sign(&f.admin_key, 0, Instruction::SyncPool);
    forged.nonce = 5;
    let admin_pause = Transaction::sign(&f.admin_key, 0, Instruction::SetPaused { paused: true });

    let (outputs, nonces) = f
        .ledger
        .execute(
            &env,
            vec![accepted.clone(), replayed, mismatched.clone(), forged, admin_pause.clone()],
        )
        .unwrap();

    assert_eq!(outputs.len(), 6);
    assert!(matches!(
        &outputs[0],
        Output::Event(Event::Resolved { outcome: Outcome::Draw, .. })
    ));
    assert_eq!(outputs[1], Output::Transaction(accepted));
    assert_eq!(
        outputs[2],
        Output::Rejected {
            public: other.clone(),
            nonce: 0,
            error_code: ERROR_STAKE_MISMATCH,
            reason: "ValueError".to_string(),
        }
    );
    assert_eq!(outputs[3], Output::Transaction(mismatched));
    assert_eq!(outputs[4], Output::Event(Event::PauseChanged { paused: true }));
    assert_eq!(outputs[5], Output::Transaction(admin_pause));

    assert_eq!(nonces.get(&f.player), Some(&1));
    assert_eq!(nonces.get(&other), Some(&1));
    assert_eq!(nonces.get(&f.admin), Some(&1));
    assert_eq!(f.ledger.nonce(&f.player).unwrap(), 1);
    assert_eq!(f.ledger.nonce(&other).unwrap(), 1);
    assert_eq!(f.ledger.nonce(&f.admin).unwrap(), 1);
    assert_eq!(f.ledger.pending_reward_count(&f.player).unwrap(), 1);
    assert!(f.ledger.player(&other).unwrap().is_none());
    assert_eq!(f.ledger.balance(&other).unwrap(), UNITS_PER_COIN);
    assert!(f.ledger.is_paused().unwrap());
}

proptest! {
    #[test]
    fn treasury_and_rewards_follow_split_table(outcomes in proptest::collection::vec(0u8..3, 1..16)) {
        let (_, admin) = create_account_keypair(0);
        let (_, player) = create_account_keypair(1);
        let mut fees = 0u64;
        let mut pool = 0u64;
        let mut owed = 0u64;
        let mut staked = 0u64;

        let mut ledger = create_ledger(&admin);
        ledger.fund(&player, UNITS_PER_COIN).unwrap();
        for (round, outcome) in outcomes.iter().enumerate() {
            let outcome = match outcome {
                0 => Outcome::Win,
                1 => Outcome::Draw,
                _ => Outcome::Lose,
            };
            ledger = ledger.with_oracle(ForcedOutcome(outcome));
            let timestamp = NOW + round as u64 * DEFAULT_COOLDOWN_SECS;
            ledger
                .submit_wager(&create_env(round as u64, timestamp), &player, Move::Paper, Tier::Low, DEFAULT_TIER_LOW)
                .unwrap();

            let settlement = Settlement::compute(outcome, DEFAULT_TIER_LOW).unwrap();
            fees += settlement.fee;
            pool = (pool + settlement.pool).saturating_sub(settlement.funded);
            owed += settlement.reward;
            staked += DEFAULT_TIER_LOW;
        }

        prop_assert_eq!(ledger.creator_fees().unwrap(), fees);
        prop_assert_eq!(ledger.game_bank().unwrap(), pool);
        prop_assert_eq!(ledger.outstanding_rewards(&player).unwrap(), owed);
        prop_assert_eq!(ledger.custodied_balance().unwrap(), staked);
        prop_assert_eq!(ledger.balance(&player).unwrap(), UNITS_PER_COIN - staked);
    }

    #[test]
    fn funded_pool_keeps_obligations_backed(ops in proptest::collection::vec(op_strategy(), 1..24)) {
        let mut ledger = invariant_ledger();
        let (_, admin) = create_account_keypair(0);
        let (_, player) = create_account_keypair(1);
        let env = create_env(0, NOW);
        ledger.deposit(&env, &admin, UNITS_PER_COIN).unwrap();
        ledger.sync_pool(&env, &admin).unwrap();

        for (step, op) in ops.into_iter().enumerate() {
            let (next, result) = apply_op(ledger, &admin, &player, step as u64 + 1, op);
            ledger = next;
            prop_assert!(!matches!(result, Err(ExecutionError::State(_))));

            let custody = ledger.custodied_balance().unwrap() as u128;
            let fees = ledger.creator_fees().unwrap() as u128;
            let bank = ledger.game_bank().unwrap() as u128;
            let owed = ledger.outstanding_rewards(&player).unwrap() as u128;
            prop_assert!(owed + fees + bank <= custody);
        }
    }

    #[test]
    fn claims_never_spend_accrued_fees(ops in proptest::collection::vec(op_strategy(), 1..24)) {
        let mut ledger = invariant_ledger();
        let (_, admin) = create_account_keypair(0);
        let (_, player) = create_account_keypair(1);

        for (step, op) in ops.into_iter().enumerate() {
            let (next, result) = apply_op(ledger, &admin, &player, step as u64 + 1, op);
            ledger = next;
            if let Err(err) = &result {
                prop_assert!(!matches!(err, ExecutionError::State(_)));
                prop_assert!(!matches!(op, Op::WithdrawFees));
            }
            prop_assert!(ledger.creator_fees().unwrap() <= ledger.custodied_balance().unwrap());
        }
    }
}

/// One step of a randomized operation sequence.
#[derive(Clone, Copy, Debug)]
enum Op {
    Wager(Outcome),
    Claim(u64),
    ClaimAll,
    Deposit(u64),
    WithdrawFees,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        prop_oneof![Just(Outcome::Win), Just(Outcome::Draw), Just(Outcome::Lose)]
            .prop_map(Op::Wager),
        any::<u64>().prop_map(Op::Claim),
        Just(Op::ClaimAll),
        (0u64..20_000_000).prop_map(Op::Deposit),
        Just(Op::WithdrawFees),
    ]
}

/// Ledger with a funded administrator and a funded player.
fn invariant_ledger() -> Ledger<Memory> {
    let (_, admin) = create_account_keypair(0);
    let (_, player) = create_account_keypair(1);
    let mut ledger = create_ledger(&admin);
    ledger.fund(&admin, 2 * UNITS_PER_COIN).unwrap();
    ledger.fund(&player, UNITS_PER_COIN).unwrap();
    ledger
}

fn apply_op(
    ledger: Ledger<Memory>,
    admin: &PublicKey,
    player: &PublicKey,
    step: u64,
    op: Op,
) -> (Ledger<Memory>, Result<Vec<Event>, ExecutionError>) {
    let env = create_env(step, NOW + step * DEFAULT_COOLDOWN_SECS);
    let mut ledger = match op {
        Op::Wager(outcome) => ledger.with_oracle(ForcedOutcome(outcome)),
        _ => ledger,
    };
    let result = match op {
        Op::Wager(_) => {
            ledger.submit_wager(&env, player, Move::Rock, Tier::Low, DEFAULT_TIER_LOW)
        }
        Op::Claim(seed) => {
            let count = ledger.pending_reward_count(player).unwrap().max(1);
            ledger.claim(&env, player, seed % count)
        }
        Op::ClaimAll => ledger.claim_all(&env, player),
        Op::Deposit(amount) => ledger.deposit(&env, admin, amount),
        Op::WithdrawFees => ledger.withdraw_fees(&env, admin),
    };
    (ledger, result)
}
