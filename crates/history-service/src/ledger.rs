//! SQLite-backed credit ledger.

use async_trait::async_trait;
use database::{credits, Database, DatabaseError};
use enhance_core::{CreditLedger, Credits, DebitReceipt, LedgerError};
use tracing::info;

/// [`CreditLedger`] over the `credit_balances` and `credit_transactions`
/// tables.
#[derive(Debug, Clone)]
pub struct SqliteCreditLedger {
    db: Database,
}

impl SqliteCreditLedger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add credits to a user's balance, opening an account if needed.
    pub async fn grant(
        &self,
        user_id: &str,
        amount: Credits,
        reason: &str,
    ) -> Result<Credits, LedgerError> {
        let transaction = credits::grant_credits(self.db.pool(), user_id, amount, reason)
            .await
            .map_err(unavailable)?;
        Ok(transaction.balance_after)
    }
}

#[async_trait]
impl CreditLedger for SqliteCreditLedger {
    async fn balance(&self, user_id: &str) -> Result<Credits, LedgerError> {
        let balance = credits::get_balance(self.db.pool(), user_id)
            .await
            .map_err(unavailable)?;
        Ok(balance.unwrap_or(Credits::ZERO))
    }

    async fn debit(
        &self,
        user_id: &str,
        amount: Credits,
        reason: &str,
    ) -> Result<DebitReceipt, LedgerError> {
        let transaction = credits::debit_credits(self.db.pool(), user_id, amount, reason)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => LedgerError::UnknownAccount(user_id.to_string()),
                other => unavailable(other),
            })?;

        info!(
            user = %user_id,
            transaction_id = %transaction.id,
            amount = %amount,
            balance_after = %transaction.balance_after,
            "Debited credits"
        );

        Ok(DebitReceipt {
            transaction_id: transaction.id,
        })
    }
}

fn unavailable(err: DatabaseError) -> LedgerError {
    LedgerError::Unavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_ledger() -> SqliteCreditLedger {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SqliteCreditLedger::new(db)
    }

    #[tokio::test]
    async fn test_balance_of_unknown_user_is_zero() {
        let ledger = test_ledger().await;
        assert_eq!(ledger.balance("nobody").await.unwrap(), Credits::ZERO);
    }

    #[tokio::test]
    async fn test_grant_and_debit() {
        let ledger = test_ledger().await;
        let balance = ledger
            .grant("alice", Credits::from_cents(100), "top-up")
            .await
            .unwrap();
        assert_eq!(balance, Credits::from_cents(100));

        let receipt = ledger
            .debit("alice", Credits::from_cents(75), "enhance")
            .await
            .unwrap();
        assert!(!receipt.transaction_id.is_empty());
        assert_eq!(ledger.balance("alice").await.unwrap(), Credits::from_cents(25));
    }

    #[tokio::test]
    async fn test_debit_unknown_account() {
        let ledger = test_ledger().await;
        assert_eq!(
            ledger.debit("ghost", Credits::from_cents(10), "enhance").await,
            Err(LedgerError::UnknownAccount("ghost".to_string()))
        );
    }
}
