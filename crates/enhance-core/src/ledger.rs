//! Credit ledger capability.

use async_trait::async_trait;

use crate::credits::Credits;
use crate::error::LedgerError;

/// Proof that a debit was recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitReceipt {
    /// Ledger-assigned transaction identifier.
    pub transaction_id: String,
}

/// The billing ledger that tracks and debits user credit balances.
///
/// The history service never falls back to a default balance: callers must
/// supply a ledger explicitly.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance for a user. Users without an account have zero credits.
    async fn balance(&self, user_id: &str) -> Result<Credits, LedgerError>;

    /// Debit `amount` from the user's balance.
    ///
    /// The ledger does not enforce a floor; concurrent callers that checked
    /// the balance independently may drive it negative.
    async fn debit(
        &self,
        user_id: &str,
        amount: Credits,
        reason: &str,
    ) -> Result<DebitReceipt, LedgerError>;
}
