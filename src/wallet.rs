use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionKind {
    Debit,
    Credit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionStatus {
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub amount_kobo: i64,
    pub created_at: DateTime<Utc>,
}

/// In-process ledger honoring the wallet contract: a debit succeeds iff the
/// balance covers it, atomically, and every successful debit leaves exactly
/// one completed transaction behind.
#[derive(Default)]
pub struct Wallet {
    balances: DashMap<Uuid, i64>,
    transactions: DashMap<Uuid, WalletTransaction>,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_kobo(&self, user_id: Uuid) -> i64 {
        self.balances.get(&user_id).map(|b| *b).unwrap_or(0)
    }

    pub fn debit(
        &self,
        user_id: Uuid,
        amount_kobo: i64,
        order_id: Option<Uuid>,
    ) -> Result<WalletTransaction, AppError> {
        if amount_kobo <= 0 {
            return Err(AppError::BadRequest(
                "debit amount must be positive".to_string(),
            ));
        }

        let mut balance = self
            .balances
            .get_mut(&user_id)
            .ok_or(AppError::InsufficientFunds {
                balance_kobo: 0,
                requested_kobo: amount_kobo,
            })?;

        if *balance < amount_kobo {
            return Err(AppError::InsufficientFunds {
                balance_kobo: *balance,
                requested_kobo: amount_kobo,
            });
        }

        // decrement and record while still holding the balance entry, so a
        // concurrent debit cannot slip between check and write
        *balance -= amount_kobo;
        let tx = self.record(user_id, order_id, TransactionKind::Debit, amount_kobo);
        drop(balance);

        Ok(tx)
    }

    pub fn credit(
        &self,
        user_id: Uuid,
        amount_kobo: i64,
        order_id: Option<Uuid>,
    ) -> Result<WalletTransaction, AppError> {
        if amount_kobo <= 0 {
            return Err(AppError::BadRequest(
                "credit amount must be positive".to_string(),
            ));
        }

        let mut balance = self.balances.entry(user_id).or_insert(0);
        *balance += amount_kobo;
        let tx = self.record(user_id, order_id, TransactionKind::Credit, amount_kobo);
        drop(balance);

        Ok(tx)
    }

    pub fn transactions_for(&self, user_id: Uuid) -> Vec<WalletTransaction> {
        let mut txs: Vec<WalletTransaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        txs.sort_by_key(|tx| tx.created_at);
        txs
    }

    fn record(
        &self,
        user_id: Uuid,
        order_id: Option<Uuid>,
        kind: TransactionKind,
        amount_kobo: i64,
    ) -> WalletTransaction {
        let tx = WalletTransaction {
            id: Uuid::new_v4(),
            user_id,
            order_id,
            kind,
            status: TransactionStatus::Completed,
            amount_kobo,
            created_at: Utc::now(),
        };
        self.transactions.insert(tx.id, tx.clone());
        tx
    }
}
