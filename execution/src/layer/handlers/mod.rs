use super::*;
use crate::{
    guard::{require_active, require_admin, require_paused, ReentrancyGuard},
    state::{
        load_balance, load_custody, load_player, load_rewards, load_switches, load_tiers,
        load_treasury,
    },
};
use rpsledger_types::ledger::{Move, Outcome, Settlement, Tier, CLAIM_ALL_INDEX};
use tracing::info;

mod admin;
mod custody;
mod wager;
