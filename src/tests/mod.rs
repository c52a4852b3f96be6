//! Shared fixtures for the service tests: an in-memory database, a config
//! with known secrets, and a scripted provisioning gateway.

mod webhook_tests;

use crate::{
    config::Config,
    db::{connection, migration},
    provisioning::{
        EvmAccount, EvmSmartAccount, ProvisioningError, ProvisioningGateway, SolanaAccount, WebhookSubscription,
        WebhookSubscriptionMetadata, WebhookSubscriptionRequest,
    },
    state::AppState,
    webhook::compute_signature,
};
use async_trait::async_trait;
use sqlx::AnyPool;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::Mutex;

pub const WEBHOOK_SECRET: &str = "s3cret";
pub const API_KEY: &str = "test-api-key";

pub const DEPOSIT_BODY: &str = r#"{"type":"onchain.activity.detected","data":{"address":"0xabc","txHash":"0xdead","amount":5,"chain":"evm"}}"#;

pub fn test_config() -> Config {
    let vars = [
        ("CDP_API_KEY_ID", "test-key-id"),
        ("CDP_API_KEY_SECRET", "test-key-secret"),
        ("CDP_WALLET_SECRET", "test-wallet-secret"),
        ("CDP_WEBHOOK_SECRET", WEBHOOK_SECRET),
        ("API_KEY", API_KEY),
        ("DATABASE_URL", "sqlite::memory:"),
    ];

    Config::from_lookup(|name| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    })
    .expect("test config should be complete")
}

pub async fn test_pool() -> AnyPool {
    let pool = connection::establish_connection("sqlite::memory:", 1)
        .await
        .expect("Failed to connect to in-memory database");
    migration::run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn test_state_with(config: Config, gateway: Arc<dyn ProvisioningGateway>) -> Arc<AppState> {
    Arc::new(AppState::new(config, test_pool().await, gateway))
}

pub async fn test_state() -> Arc<AppState> {
    test_state_with(test_config(), Arc::new(MockGateway::default())).await
}

pub fn sign(body: &str) -> String {
    compute_signature(WEBHOOK_SECRET.as_bytes(), body.as_bytes())
}

pub fn deposit_body(address: &str, tx_hash: &str, amount: f64) -> String {
    serde_json::json!({
        "type": "onchain.activity.detected",
        "data": { "address": address, "txHash": tx_hash, "amount": amount, "chain": "evm" }
    })
    .to_string()
}

/// Hands out deterministic, well-formed addresses and records webhook
/// registrations. `failing` makes every call return a 503.
#[derive(Default)]
pub struct MockGateway {
    pub failing: bool,
    counter: AtomicUsize,
    pub registrations: Mutex<Vec<WebhookSubscriptionRequest>>,
}

impl MockGateway {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    fn next(&self) -> Result<usize, ProvisioningError> {
        if self.failing {
            return Err(ProvisioningError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn evm_address(n: usize) -> String {
        format!("0x{:040x}", n)
    }

    pub fn solana_address(n: usize) -> String {
        bs58::encode([n as u8; 32]).into_string()
    }
}

#[async_trait]
impl ProvisioningGateway for MockGateway {
    async fn create_evm_account(&self) -> Result<EvmAccount, ProvisioningError> {
        Ok(EvmAccount {
            address: Self::evm_address(self.next()?),
        })
    }

    async fn create_evm_smart_account(&self, owner: &str) -> Result<EvmSmartAccount, ProvisioningError> {
        Ok(EvmSmartAccount {
            address: Self::evm_address(self.next()?),
            owners: vec![owner.to_string()],
        })
    }

    async fn create_solana_account(&self) -> Result<SolanaAccount, ProvisioningError> {
        Ok(SolanaAccount {
            address: Self::solana_address(self.next()?),
        })
    }

    async fn token_balances(&self, network: &str, address: &str) -> Result<serde_json::Value, ProvisioningError> {
        self.next()?;
        Ok(serde_json::json!({
            "balances": [{ "network": network, "address": address, "amount": "1000" }]
        }))
    }

    async fn register_webhook(
        &self,
        subscription: &WebhookSubscriptionRequest,
    ) -> Result<WebhookSubscription, ProvisioningError> {
        self.next()?;
        self.registrations.lock().await.push(subscription.clone());
        Ok(WebhookSubscription {
            id: Some("sub_1".to_string()),
            event_types: subscription.event_types.clone(),
            is_enabled: true,
            metadata: Some(WebhookSubscriptionMetadata {
                secret: Some("whsec_test".to_string()),
            }),
        })
    }
}
