//! Wagering ledger domain types.
//!
//! Defines moves, tiers, player records, the reward sequence, the treasury and the fixed split
//! table used by the execution layer and clients.

mod codec;
mod constants;
mod economy;
mod error;
mod game;
mod player;

pub use codec::{read_string, string_encode_size, write_string};
pub use constants::*;
pub use economy::*;
pub use error::*;
pub use game::*;
pub use player::*;
