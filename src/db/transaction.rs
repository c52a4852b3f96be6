// Idempotency ledger: one row per transaction hash ever processed.
// The primary key on tx_hash is the only serialization point between
// concurrent deliveries of the same event.

use crate::db::{is_unique_violation, now_unix};
use crate::models::{Amount, DepositActivity, ProcessedTransaction};
use sqlx::{AnyPool, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Inserted,
    /// Another delivery committed the same hash first.
    AlreadyExists,
}

#[derive(Clone)]
pub struct IdempotencyLedger {
    pool: AnyPool,
}

impl IdempotencyLedger {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn has_processed(&self, tx_hash: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT tx_hash FROM processed_transactions WHERE tx_hash = ?")
            .bind(tx_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    pub async fn record_processed(&self, activity: &DepositActivity) -> Result<RecordOutcome, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO processed_transactions (tx_hash, chain, address, amount, processed_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&activity.tx_hash)
        .bind(&activity.chain)
        .bind(&activity.address)
        .bind(activity.amount.as_str())
        .bind(now_unix())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(RecordOutcome::Inserted),
            Err(e) if is_unique_violation(&e) => Ok(RecordOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, tx_hash: &str) -> Result<Option<ProcessedTransaction>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT tx_hash, chain, address, amount, processed_at
             FROM processed_transactions WHERE tx_hash = ?",
        )
        .bind(tx_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let amount: String = row.get("amount");
            let amount = amount.parse::<Amount>().map_err(|e| sqlx::Error::ColumnDecode {
                index: "amount".to_string(),
                source: Box::new(e),
            })?;

            Ok(ProcessedTransaction {
                tx_hash: row.get("tx_hash"),
                chain: row.get("chain"),
                address: row.get("address"),
                amount,
                processed_at: row.get("processed_at"),
            })
        })
        .transpose()
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let count = sqlx::query("SELECT COUNT(*) FROM processed_transactions")
            .fetch_one(&self.pool)
            .await?
            .get::<i64, _>(0);

        Ok(count)
    }
}
