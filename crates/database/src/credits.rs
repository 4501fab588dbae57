//! Credit balances and transactions.
//!
//! Backing store for the SQLite credit ledger. Balances have no floor: a
//! debit always applies, even if it takes the balance below zero.

use enhance_core::Credits;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::CreditTransaction;
use crate::timestamp;

/// Get a user's balance, or `None` if they have no account.
pub async fn get_balance(pool: &SqlitePool, user_id: &str) -> Result<Option<Credits>> {
    let cents = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT balance_cents FROM credit_balances
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(cents.map(Credits::from_cents))
}

/// Add credits to a user's balance, opening an account if needed.
pub async fn grant_credits(
    pool: &SqlitePool,
    user_id: &str,
    amount: Credits,
    reason: &str,
) -> Result<CreditTransaction> {
    let now = timestamp::now();
    let mut tx = pool.begin().await?;

    let balance_after = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO credit_balances (user_id, balance_cents, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            balance_cents = balance_cents + excluded.balance_cents,
            updated_at = excluded.updated_at
        RETURNING balance_cents
        "#,
    )
    .bind(user_id)
    .bind(amount.cents())
    .bind(&now)
    .fetch_one(&mut *tx)
    .await?;

    let transaction = insert_transaction(
        &mut tx,
        user_id,
        amount,
        Credits::from_cents(balance_after),
        reason,
        &now,
    )
    .await?;

    tx.commit().await?;

    info!(user = %user_id, amount = %amount, "Granted credits");
    Ok(transaction)
}

/// Subtract credits from an existing account.
///
/// Fails with [`DatabaseError::NotFound`] if the user has no account.
pub async fn debit_credits(
    pool: &SqlitePool,
    user_id: &str,
    amount: Credits,
    reason: &str,
) -> Result<CreditTransaction> {
    let now = timestamp::now();
    let mut tx = pool.begin().await?;

    let balance_after = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE credit_balances
        SET balance_cents = balance_cents - ?, updated_at = ?
        WHERE user_id = ?
        RETURNING balance_cents
        "#,
    )
    .bind(amount.cents())
    .bind(&now)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "CreditAccount",
        id: user_id.to_string(),
    })?;

    let transaction = insert_transaction(
        &mut tx,
        user_id,
        -amount,
        Credits::from_cents(balance_after),
        reason,
        &now,
    )
    .await?;

    tx.commit().await?;

    Ok(transaction)
}

/// List a user's most recent transactions.
pub async fn list_transactions(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<CreditTransaction>> {
    let rows = sqlx::query_as::<_, CreditTransaction>(
        r#"
        SELECT id, user_id, amount_cents, balance_after_cents, reason, created_at
        FROM credit_transactions
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: &str,
    amount: Credits,
    balance_after: Credits,
    reason: &str,
    created_at: &str,
) -> Result<CreditTransaction> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO credit_transactions
            (id, user_id, amount_cents, balance_after_cents, reason, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(amount.cents())
    .bind(balance_after.cents())
    .bind(reason)
    .bind(created_at)
    .execute(&mut **tx)
    .await?;

    Ok(CreditTransaction {
        id,
        user_id: user_id.to_string(),
        amount,
        balance_after,
        reason: reason.to_string(),
        created_at: created_at.to_string(),
    })
}
