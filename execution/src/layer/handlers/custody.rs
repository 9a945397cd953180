use super::*;

impl<'a, S: State> Layer<'a, S> {
    // === Value Movement ===

    /// Moves `amount` from `from`'s balance into custody.
    pub(in crate::layer) fn collect(
        &mut self,
        from: &PublicKey,
        amount: u64,
    ) -> Result<(), ExecutionError> {
        let balance = load_balance(self, from)?;
        let remaining = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                needed: amount,
                available: balance,
            })?;
        let custody = load_custody(self)?
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.insert(Key::Balance(from.clone()), Value::Balance(remaining));
        self.insert(Key::Custody, Value::Custody(custody));
        Ok(())
    }

    /// Moves `amount` out of custody to `to`, then runs `to`'s receiver, if any.
    ///
    /// Ledger bookkeeping must be final before calling this: the receiver may re-enter.
    pub(in crate::layer) fn pay(&mut self, to: &PublicKey, amount: u64) -> Result<(), ExecutionError> {
        let custody = load_custody(self)?;
        let remaining = custody
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                needed: amount,
                available: custody,
            })?;
        let balance = load_balance(self, to)?
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.insert(Key::Custody, Value::Custody(remaining));
        self.insert(Key::Balance(to.clone()), Value::Balance(balance));

        let Some(mut receiver) = self.receivers.remove(to) else {
            return Ok(());
        };
        let result = receiver.on_receive(
            &mut NestedCall {
                layer: self,
                caller: to.clone(),
            },
            amount,
        );
        self.receivers.insert(to.clone(), receiver);

        if let Some(err) = self.fault.take() {
            return Err(ExecutionError::State(err.context("receiver re-entry")));
        }
        result.map_err(|rejection| LedgerError::TransferFailed {
            reason: rejection.to_string(),
        })?;
        Ok(())
    }

    /// Fails unless custody can pay `amount` and still back the accrued fees.
    fn ensure_payable(&self, amount: u64) -> Result<(), ExecutionError> {
        let available = load_treasury(self)?.payable(load_custody(self)?);
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                needed: amount,
                available,
            }
            .into());
        }
        Ok(())
    }

    // === Custody Handlers ===

    pub(in crate::layer) fn handle_claim(
        &mut self,
        public: &PublicKey,
        index: u64,
    ) -> Result<(), ExecutionError> {
        let _guard = ReentrancyGuard::enter(self.lock)?;

        let mut rewards = load_rewards(self, public)?;
        let amount = rewards.mark_claimed(index)?;
        self.ensure_payable(amount)?;
        self.insert(Key::Rewards(public.clone()), Value::Rewards(rewards));

        self.pay(public, amount)?;

        info!(player = ?public, index, amount, "reward claimed");
        self.emit(Event::Claimed {
            player: public.clone(),
            index,
            amount,
        });
        Ok(())
    }

    pub(in crate::layer) fn handle_claim_all(
        &mut self,
        public: &PublicKey,
    ) -> Result<(), ExecutionError> {
        let _guard = ReentrancyGuard::enter(self.lock)?;

        let mut rewards = load_rewards(self, public)?;
        let amount = rewards.mark_all_claimed()?;
        self.ensure_payable(amount)?;
        self.insert(Key::Rewards(public.clone()), Value::Rewards(rewards));

        self.pay(public, amount)?;

        info!(player = ?public, amount, "all rewards claimed");
        self.emit(Event::Claimed {
            player: public.clone(),
            index: CLAIM_ALL_INDEX,
            amount,
        });
        Ok(())
    }

    /// Plain transfer into custody. Leaves the treasury alone, so it shows up as drift until
    /// the pool is resynchronized.
    pub(in crate::layer) fn handle_deposit(
        &mut self,
        public: &PublicKey,
        amount: u64,
    ) -> Result<(), ExecutionError> {
        self.collect(public, amount)?;
        debug!(from = ?public, amount, "deposit received");
        Ok(())
    }
}
