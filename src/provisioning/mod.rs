pub mod auth;
pub mod client;
pub mod service;

pub use client::CdpClient;
pub use service::{provision_evm_account, provision_solana_account};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisioningError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CDP API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to sign request: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Gateway returned an invalid address: {0}")]
    InvalidAddress(#[from] crate::validation::ValidationError),

    #[error("Failed to store address: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid CDP API base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ProvisioningError {
    /// Connection failures, timeouts, rate limiting and 5xx are worth another
    /// attempt. Everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            ProvisioningError::Http(e) => e.is_timeout() || e.is_connect(),
            ProvisioningError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvmAccount {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvmSmartAccount {
    pub address: String,
    #[serde(default)]
    pub owners: Vec<String>,
}

impl EvmSmartAccount {
    pub const ACCOUNT_TYPE: &'static str = "evm-smart";
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolanaAccount {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookTarget {
    pub url: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscriptionRequest {
    pub description: String,
    pub event_types: Vec<String>,
    pub target: WebhookTarget,
    pub labels: HashMap<String, String>,
    pub is_enabled: bool,
}

impl WebhookSubscriptionRequest {
    /// Subscription for deposit notifications delivered to `target_url`.
    pub fn deposit_notifications(target_url: &str) -> Self {
        Self {
            description: "Deposit notifications".to_string(),
            event_types: vec![crate::models::DEPOSIT_ACTIVITY_EVENT.to_string()],
            target: WebhookTarget {
                url: target_url.to_string(),
                method: "POST".to_string(),
            },
            labels: HashMap::new(),
            is_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookSubscriptionMetadata {
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    #[serde(default, alias = "subscriptionId")]
    pub id: Option<String>,
    #[serde(default)]
    pub event_types: Vec<String>,
    #[serde(default)]
    pub is_enabled: bool,
    pub metadata: Option<WebhookSubscriptionMetadata>,
}

impl WebhookSubscription {
    pub fn secret(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.secret.as_deref())
    }
}

/// The wallet-infrastructure API that issues accounts and delivers deposit
/// notifications.
#[async_trait]
pub trait ProvisioningGateway: Send + Sync {
    async fn create_evm_account(&self) -> Result<EvmAccount, ProvisioningError>;

    async fn create_evm_smart_account(&self, owner: &str) -> Result<EvmSmartAccount, ProvisioningError>;

    async fn create_solana_account(&self) -> Result<SolanaAccount, ProvisioningError>;

    async fn token_balances(&self, network: &str, address: &str) -> Result<serde_json::Value, ProvisioningError>;

    async fn register_webhook(
        &self,
        subscription: &WebhookSubscriptionRequest,
    ) -> Result<WebhookSubscription, ProvisioningError>;
}
