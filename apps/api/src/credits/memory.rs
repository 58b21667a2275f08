//! In-memory ledger used by pipeline and handler tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    apply_daily_grant, consume_credit, validate_amount, CreditAccount, CreditLedger, LedgerError,
};

pub struct InMemoryCreditLedger {
    accounts: Mutex<HashMap<Uuid, CreditAccount>>,
    daily_limit: i32,
    today: NaiveDate,
}

impl InMemoryCreditLedger {
    pub fn new(daily_limit: i32, today: NaiveDate) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            daily_limit,
            today,
        }
    }

    pub async fn set_balance(&self, user_id: Uuid, credits: i32) {
        let mut account = CreditAccount::new(user_id, self.daily_limit, self.today);
        account.credits_remaining = credits;
        self.accounts.lock().await.insert(user_id, account);
    }

    async fn with_account<T>(
        &self,
        user_id: Uuid,
        f: impl FnOnce(&mut CreditAccount) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut accounts = self.accounts.lock().await;
        let account = accounts
            .entry(user_id)
            .or_insert_with(|| CreditAccount::new(user_id, self.daily_limit, self.today));
        apply_daily_grant(account, self.today, self.daily_limit);
        f(account)
    }
}

#[async_trait]
impl CreditLedger for InMemoryCreditLedger {
    async fn get_balance(&self, user_id: Uuid) -> Result<CreditAccount, LedgerError> {
        self.with_account(user_id, |a| Ok(a.clone())).await
    }

    async fn deduct(&self, user_id: Uuid) -> Result<CreditAccount, LedgerError> {
        self.with_account(user_id, |a| {
            consume_credit(a)?;
            Ok(a.clone())
        })
        .await
    }

    async fn add(&self, user_id: Uuid, amount: i32) -> Result<CreditAccount, LedgerError> {
        validate_amount(amount)?;
        self.with_account(user_id, |a| {
            a.credits_remaining = a.credits_remaining.saturating_add(amount);
            Ok(a.clone())
        })
        .await
    }
}
