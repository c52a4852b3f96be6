pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod provisioning;
pub mod state;
pub mod validation;
pub mod webhook;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience
pub use api::create_router;
pub use api::error::ApiError;
pub use config::{Config, ConfigError};
pub use db::{AddressRegistry, IdempotencyLedger, RecordOutcome};
pub use models::{Amount, Chain, DepositActivity, DepositAddress, ProcessedTransaction, WebhookEvent};
pub use state::AppState;
pub use webhook::{ProcessingOutcome, WebhookError, WebhookProcessor};
