use super::*;

impl<'a, S: State> Layer<'a, S> {
    // === Administrative Handlers ===

    pub(in crate::layer) fn handle_withdraw_fees(
        &mut self,
        public: &PublicKey,
    ) -> Result<(), ExecutionError> {
        require_admin(&self.config.admin, public)?;
        let _guard = ReentrancyGuard::enter(self.lock)?;

        let mut treasury = load_treasury(self)?;
        let amount = std::mem::take(&mut treasury.creator_fees);
        self.insert(Key::Treasury, Value::Treasury(treasury));

        self.pay(public, amount)?;

        info!(admin = ?public, amount, "fees withdrawn");
        self.emit(Event::FeesWithdrawn { amount });
        Ok(())
    }

    pub(in crate::layer) fn handle_set_paused(
        &mut self,
        public: &PublicKey,
        paused: bool,
    ) -> Result<(), ExecutionError> {
        require_admin(&self.config.admin, public)?;

        let mut switches = load_switches(self)?;
        switches.paused = paused;
        self.insert(Key::Switches, Value::Switches(switches));

        info!(admin = ?public, paused, "pause switch set");
        self.emit(Event::PauseChanged { paused });
        Ok(())
    }

    pub(in crate::layer) fn handle_update_tier_amount(
        &mut self,
        public: &PublicKey,
        tier: Tier,
        amount: u64,
    ) -> Result<(), ExecutionError> {
        require_admin(&self.config.admin, public)?;
        if amount == 0 {
            return Err(LedgerError::InvalidTierAmount.into());
        }
        let max = self.config.max_tier_amount;
        if amount > max {
            return Err(LedgerError::TierAmountTooHigh { amount, max }.into());
        }

        let mut tiers = load_tiers(self)?;
        let previous = tiers.amount(tier);
        tiers.set(tier, amount);
        self.insert(Key::Tiers, Value::Tiers(tiers));

        info!(admin = ?public, ?tier, previous, amount, "tier amount updated");
        self.emit(Event::TierUpdated { tier, amount });
        Ok(())
    }

    /// Sweeps all of custody to the administrator, ignoring outstanding rewards and the
    /// treasury. Destructive: balances recorded in the ledger are no longer backed afterwards.
    pub(in crate::layer) fn handle_emergency_recover(
        &mut self,
        public: &PublicKey,
    ) -> Result<(), ExecutionError> {
        require_admin(&self.config.admin, public)?;
        let _guard = ReentrancyGuard::enter(self.lock)?;
        require_paused(&load_switches(self)?)?;

        let amount = load_custody(self)?;
        self.pay(public, amount)?;

        warn!(admin = ?public, amount, "custody swept by emergency recovery");
        self.emit(Event::EmergencyRecovered {
            admin: public.clone(),
            amount,
        });
        Ok(())
    }

    /// Recomputes the game bank as custody minus creator fees (zero if fees exceed custody).
    pub(in crate::layer) fn handle_sync_pool(
        &mut self,
        public: &PublicKey,
    ) -> Result<(), ExecutionError> {
        require_admin(&self.config.admin, public)?;

        let custody = load_custody(self)?;
        let mut treasury = load_treasury(self)?;
        let previous = treasury.game_bank;
        treasury.game_bank = custody.saturating_sub(treasury.creator_fees);
        let amount = treasury.game_bank;
        self.insert(Key::Treasury, Value::Treasury(treasury));

        info!(admin = ?public, custody, previous, amount, "pool synchronized");
        self.emit(Event::PoolSynced { amount });
        Ok(())
    }
}
