//! Counter-move derivation.

use commonware_cryptography::{ed25519::PublicKey, sha256::Sha256, Hasher};
use commonware_utils::modulo;
use rpsledger_types::{execution::BlockEnv, ledger::Move};

/// Domain separator mixed into every counter-move digest.
pub const COUNTER_MOVE_DOMAIN: &[u8] = b"rpsledger:counter-move";

/// Picks the move a wager is resolved against.
pub trait OutcomeOracle {
    fn counter_move(&self, env: &BlockEnv, caller: &PublicKey, player_move: Move) -> Move;
}

/// Derives the counter-move from block entropy, the block timestamp, the caller and the
/// player's move.
///
/// This is deterministic and fully known to whoever produces (or sees) the block before it is
/// included. A block producer can therefore predict or grind outcomes. It is a fairness
/// caveat, not a randomness guarantee.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropyOracle;

impl OutcomeOracle for EntropyOracle {
    fn counter_move(&self, env: &BlockEnv, caller: &PublicKey, player_move: Move) -> Move {
        let mut hasher = Sha256::new();
        hasher.update(COUNTER_MOVE_DOMAIN);
        hasher.update(env.entropy.as_ref());
        hasher.update(&env.timestamp.to_be_bytes());
        hasher.update(caller.as_ref());
        hasher.update(&[player_move as u8]);
        let digest = hasher.finalize();
        Move::from_index(modulo(digest.as_ref(), 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::create_account_keypair;

    #[test]
    fn deterministic_for_same_inputs() {
        let (_, public) = create_account_keypair(1);
        let env = BlockEnv::at(10, 1_000);
        let oracle = EntropyOracle;
        let first = oracle.counter_move(&env, &public, Move::Rock);
        for _ in 0..4 {
            assert_eq!(oracle.counter_move(&env, &public, Move::Rock), first);
        }
    }

    #[test]
    fn reaches_every_move() {
        let (_, public) = create_account_keypair(1);
        let oracle = EntropyOracle;
        let mut seen = [false; 3];
        for height in 0..64 {
            let env = BlockEnv::at(height, 1_000 + height);
            seen[oracle.counter_move(&env, &public, Move::Paper) as usize] = true;
        }
        assert_eq!(seen, [true; 3]);
    }
}
