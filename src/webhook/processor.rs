//! Webhook processing pipeline
//!
//! Each delivery moves through
//! `received -> verified -> type-filtered -> dedup-checked -> resolved -> committed`.
//! Any filtering step may end early with an acknowledged no-op. Nothing is
//! read from or written to storage until the signature has been verified.

use crate::db::{AddressRegistry, IdempotencyLedger, RecordOutcome};
use crate::models::{DepositActivity, WebhookEvent};
use crate::webhook::signature::{SignatureError, SignatureVerifier};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Webhook processing timed out")]
    Timeout,
}

/// Every variant is acknowledged to the sender with a 2xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Ignored { event_type: String },
    AlreadyProcessed { tx_hash: String },
    UnknownAddress { address: String },
    Recorded { tx_hash: String, owner: String },
    /// A concurrent delivery of the same hash won the insert.
    RecordedConcurrently { tx_hash: String },
}

#[derive(Clone)]
pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    ledger: IdempotencyLedger,
    registry: AddressRegistry,
}

impl WebhookProcessor {
    pub fn new(verifier: SignatureVerifier, ledger: IdempotencyLedger, registry: AddressRegistry) -> Self {
        Self { verifier, ledger, registry }
    }

    /// Process one delivery. `body` must be the bytes exactly as received;
    /// the signature covers them, not a re-encoding.
    pub async fn handle(&self, body: &[u8], signature: Option<&str>) -> Result<ProcessingOutcome, WebhookError> {
        self.verifier.verify(body, signature)?;

        let event: WebhookEvent = serde_json::from_slice(body)?;
        if !event.is_deposit_activity() {
            debug!("Ignoring webhook event of type {}", event.event_type);
            return Ok(ProcessingOutcome::Ignored { event_type: event.event_type });
        }

        let activity = event.deposit_activity()?;
        self.process_deposit(&activity).await
    }

    pub async fn process_deposit(&self, activity: &DepositActivity) -> Result<ProcessingOutcome, WebhookError> {
        if self.ledger.has_processed(&activity.tx_hash).await? {
            info!("Transaction already processed: {}", activity.tx_hash);
            return Ok(ProcessingOutcome::AlreadyProcessed {
                tx_hash: activity.tx_hash.clone(),
            });
        }

        let owner = match self.registry.find_owner_by_address(&activity.address).await? {
            Some(owner) => owner,
            None => {
                warn!("No owner found for deposit address {} (tx: {})", activity.address, activity.tx_hash);
                return Ok(ProcessingOutcome::UnknownAddress {
                    address: activity.address.clone(),
                });
            }
        };

        match self.ledger.record_processed(activity).await? {
            RecordOutcome::Inserted => {
                info!(
                    "Processed deposit of {} on {} to owner {} (tx: {})",
                    activity.amount, activity.chain, owner, activity.tx_hash
                );
                Ok(ProcessingOutcome::Recorded {
                    tx_hash: activity.tx_hash.clone(),
                    owner,
                })
            }
            RecordOutcome::AlreadyExists => {
                info!("Transaction {} was recorded by a concurrent delivery", activity.tx_hash);
                Ok(ProcessingOutcome::RecordedConcurrently {
                    tx_hash: activity.tx_hash.clone(),
                })
            }
        }
    }
}
