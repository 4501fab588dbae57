//! In-memory credit ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use enhance_core::{async_trait, CreditLedger, Credits, DebitReceipt, LedgerError};

/// A debit applied by [`InMemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitRecord {
    pub transaction_id: String,
    pub user_id: String,
    pub amount: Credits,
    pub reason: String,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<String, Credits>,
    debits: Vec<DebitRecord>,
}

/// A credit ledger held in memory.
///
/// Behaves like the SQLite ledger: unknown users have a zero balance,
/// debiting an unknown user fails, and balances have no floor.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    unavailable: AtomicBool,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with the given balance.
    pub fn with_balance(self, user_id: impl Into<String>, balance: Credits) -> Self {
        self.set_balance(user_id, balance);
        self
    }

    /// Set (or open) an account's balance.
    pub fn set_balance(&self, user_id: impl Into<String>, balance: Credits) {
        self.state().balances.insert(user_id.into(), balance);
    }

    /// Current balance, or `None` if the user has no account.
    pub fn balance_of(&self, user_id: &str) -> Option<Credits> {
        self.state().balances.get(user_id).copied()
    }

    /// Every debit applied so far, oldest first.
    pub fn debits(&self) -> Vec<DebitRecord> {
        self.state().debits.clone()
    }

    /// Make every subsequent call fail with [`LedgerError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(LedgerError::Unavailable("ledger offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn balance(&self, user_id: &str) -> Result<Credits, LedgerError> {
        self.check_available()?;
        Ok(self.balance_of(user_id).unwrap_or(Credits::ZERO))
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: Credits,
        reason: &str,
    ) -> Result<DebitReceipt, LedgerError> {
        self.check_available()?;

        let mut guard = self.state();
        let state = &mut *guard;
        let balance = state
            .balances
            .get_mut(user_id)
            .ok_or_else(|| LedgerError::UnknownAccount(user_id.to_string()))?;
        *balance = *balance - amount;

        let transaction_id = format!("txn-{}", state.debits.len() + 1);
        state.debits.push(DebitRecord {
            transaction_id: transaction_id.clone(),
            user_id: user_id.to_string(),
            amount,
            reason: reason.to_string(),
        });

        Ok(DebitReceipt { transaction_id })
    }
}
