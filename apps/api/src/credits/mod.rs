//! Credit Ledger — gates how many evaluations a user may request per day.
//!
//! The balance is refilled to the daily limit the first time it is read on a
//! new calendar day (UTC). Reads and writes are not transactional: two
//! simultaneous requests from one user can both pass the balance check.

pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CreditAccount {
    pub user_id: Uuid,
    pub credits_remaining: i32,
    pub last_grant_date: NaiveDate,
    pub total_credits_used: i32,
}

impl CreditAccount {
    pub fn new(user_id: Uuid, daily_limit: i32, today: NaiveDate) -> Self {
        Self {
            user_id,
            credits_remaining: daily_limit,
            last_grant_date: today,
            total_credits_used: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Invalid credit amount: {0}")]
    InvalidAmount(i32),

    #[error("Ledger database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Returns the account, creating it or applying today's grant as needed.
    async fn get_balance(&self, user_id: Uuid) -> Result<CreditAccount, LedgerError>;

    /// Consumes one credit; fails with `InsufficientCredits` at zero.
    async fn deduct(&self, user_id: Uuid) -> Result<CreditAccount, LedgerError>;

    /// Tops the balance up by `amount` (> 0).
    async fn add(&self, user_id: Uuid, amount: i32) -> Result<CreditAccount, LedgerError>;
}

/// Refills the balance when `today` is a new grant day. Returns whether the
/// account changed.
pub fn apply_daily_grant(account: &mut CreditAccount, today: NaiveDate, daily_limit: i32) -> bool {
    if account.last_grant_date == today {
        return false;
    }
    account.credits_remaining = daily_limit;
    account.last_grant_date = today;
    true
}

/// Applies one deduction in memory, or reports an empty balance.
pub fn consume_credit(account: &mut CreditAccount) -> Result<(), LedgerError> {
    if account.credits_remaining <= 0 {
        return Err(LedgerError::InsufficientCredits);
    }
    account.credits_remaining -= 1;
    account.total_credits_used += 1;
    Ok(())
}

pub fn validate_amount(amount: i32) -> Result<(), LedgerError> {
    if amount <= 0 {
        Err(LedgerError::InvalidAmount(amount))
    } else {
        Ok(())
    }
}

pub fn today_utc() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
