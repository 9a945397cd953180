use super::*;

impl<'a, S: State> Layer<'a, S> {
    // === Wager Handlers ===

    pub(in crate::layer) fn handle_submit_wager(
        &mut self,
        public: &PublicKey,
        player_move: Move,
        tier: Tier,
        stake: u64,
    ) -> Result<(), ExecutionError> {
        require_active(&load_switches(self)?)?;

        let now = self.env.timestamp;
        let player = load_player(self, public)?;
        if let Some(player) = &player {
            let ready_at = player.ready_at(self.config.cooldown_secs);
            if now < ready_at {
                return Err(LedgerError::CooldownActive { now, ready_at }.into());
            }
        }

        let expected = load_tiers(self)?.amount(tier);
        if stake != expected {
            return Err(LedgerError::StakeMismatch {
                tier,
                expected,
                attached: stake,
            }
            .into());
        }
        self.collect(public, stake)?;

        let counter_move = self.oracle.counter_move(self.env, public, player_move);
        let outcome = player_move.against(counter_move);
        let settlement = Settlement::compute(outcome, stake)?;

        let mut player = player.unwrap_or_default();
        if outcome == Outcome::Win {
            player.total_wins = player
                .total_wins
                .checked_add(1)
                .ok_or(LedgerError::Overflow)?;
        }
        player.last_play_time = now;

        if outcome != Outcome::Lose {
            let mut rewards = load_rewards(self, public)?;
            rewards.push(settlement.reward)?;
            self.insert(Key::Rewards(public.clone()), Value::Rewards(rewards));
        }

        let mut treasury = load_treasury(self)?;
        treasury.credit(&settlement)?;

        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Treasury, Value::Treasury(treasury));

        info!(
            player = ?public,
            ?player_move,
            ?counter_move,
            outcome = outcome.label(),
            stake,
            reward = settlement.reward,
            net_gain = settlement.net_gain,
            "wager resolved"
        );
        self.emit(Event::Resolved {
            player: public.clone(),
            player_move,
            counter_move,
            outcome,
            net_gain: settlement.net_gain,
        });
        Ok(())
    }

    /// Two-phase move commitment is retired; its entry points only ever fail.
    pub(in crate::layer) fn handle_deprecated(
        &mut self,
        public: &PublicKey,
    ) -> Result<(), ExecutionError> {
        debug!(player = ?public, "deprecated commit/reveal entry point invoked");
        Err(LedgerError::Deprecated.into())
    }
}
