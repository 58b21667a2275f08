use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    apply_daily_grant, consume_credit, today_utc, validate_amount, CreditAccount, CreditLedger,
    LedgerError,
};

/// Ledger backed by the `user_credits` table.
#[derive(Clone)]
pub struct PgCreditLedger {
    pool: PgPool,
    daily_limit: i32,
}

impl PgCreditLedger {
    pub fn new(pool: PgPool, daily_limit: i32) -> Self {
        Self { pool, daily_limit }
    }

    async fn store(&self, account: &CreditAccount) -> Result<CreditAccount, LedgerError> {
        Ok(sqlx::query_as::<_, CreditAccount>(
            r#"
            UPDATE user_credits
            SET credits_remaining = $2, last_grant_date = $3, total_credits_used = $4
            WHERE user_id = $1
            RETURNING user_id, credits_remaining, last_grant_date, total_credits_used
            "#,
        )
        .bind(account.user_id)
        .bind(account.credits_remaining)
        .bind(account.last_grant_date)
        .bind(account.total_credits_used)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl CreditLedger for PgCreditLedger {
    async fn get_balance(&self, user_id: Uuid) -> Result<CreditAccount, LedgerError> {
        let today = today_utc();

        let existing = sqlx::query_as::<_, CreditAccount>(
            r#"
            SELECT user_id, credits_remaining, last_grant_date, total_credits_used
            FROM user_credits
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut account) = existing else {
            let fresh = CreditAccount::new(user_id, self.daily_limit, today);
            // ON CONFLICT keeps a concurrent first read from failing; the loser
            // simply reads the winner's row.
            let created = sqlx::query_as::<_, CreditAccount>(
                r#"
                INSERT INTO user_credits
                    (user_id, credits_remaining, last_grant_date, total_credits_used)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
                RETURNING user_id, credits_remaining, last_grant_date, total_credits_used
                "#,
            )
            .bind(fresh.user_id)
            .bind(fresh.credits_remaining)
            .bind(fresh.last_grant_date)
            .bind(fresh.total_credits_used)
            .fetch_one(&self.pool)
            .await?;
            info!("Created credit account for user {user_id}");
            return Ok(created);
        };

        if apply_daily_grant(&mut account, today, self.daily_limit) {
            info!(
                "Granted {} daily credits to user {user_id}",
                self.daily_limit
            );
            return self.store(&account).await;
        }

        Ok(account)
    }

    async fn deduct(&self, user_id: Uuid) -> Result<CreditAccount, LedgerError> {
        let mut account = self.get_balance(user_id).await?;
        consume_credit(&mut account)?;
        self.store(&account).await
    }

    async fn add(&self, user_id: Uuid, amount: i32) -> Result<CreditAccount, LedgerError> {
        validate_amount(amount)?;
        let mut account = self.get_balance(user_id).await?;
        account.credits_remaining = account.credits_remaining.saturating_add(amount);
        self.store(&account).await
    }
}
