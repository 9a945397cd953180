//! rpsledger execution layer.
//!
//! This crate contains the deterministic operation logic of the wagering ledger (`Layer`), the
//! gates every operation passes through, and the [`Ledger`] aggregate that owns committed state.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution; the timestamp comes from [`BlockEnv`].
//! - Counter-moves come only from the configured [`OutcomeOracle`].
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Atomicity
//! Operations stage their writes in a [`Layer`] and commit them only on success. An outbound
//! transfer may run receiver logic that re-enters the ledger; guarded operations reject such
//! calls through the [`ReentrancyLock`], and any other nested call is rolled back on its own
//! if it fails.
//!
//! ## Example
//! ```rust,ignore
//! use rpsledger_execution::{Ledger, LedgerConfig, Memory};
//! use rpsledger_types::{execution::BlockEnv, ledger::{Move, Tier, DEFAULT_TIER_LOW}};
//!
//! let mut ledger = Ledger::new(Memory::default(), LedgerConfig::new(admin))?;
//! ledger.fund(&player, DEFAULT_TIER_LOW)?;
//! let env = BlockEnv::at(1, 1_700_000_000);
//! let events = ledger.submit_wager(&env, &player, Move::Rock, Tier::Low, DEFAULT_TIER_LOW)?;
//! ```
//!
//! [`BlockEnv`]: rpsledger_types::execution::BlockEnv

mod error;
pub mod guard;
mod layer;
mod ledger;
pub mod oracle;
pub mod receiver;
mod state;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

#[cfg(test)]
mod ledger_tests;

pub use error::ExecutionError;
pub use guard::{ReentrancyGuard, ReentrancyLock};
pub use layer::Layer;
pub use ledger::{Ledger, LedgerConfig};
pub use oracle::{EntropyOracle, OutcomeOracle};
pub use receiver::{Receiver, Receivers, Reentry, Rejection};
pub use state::{nonce, Memory, PrepareError, State, Status};
