use crate::cache::OwnerCache;
use crate::config::Config;
use crate::db::{AddressRegistry, IdempotencyLedger};
use crate::provisioning::ProvisioningGateway;
use crate::webhook::{SignatureVerifier, WebhookProcessor};
use sqlx::AnyPool;
use std::sync::Arc;

/// Everything a request handler can reach. Built once in `main` before the
/// listener is bound; there is no other shared mutable state.
pub struct AppState {
    pub config: Config,
    pub db_pool: AnyPool,
    pub registry: AddressRegistry,
    pub ledger: IdempotencyLedger,
    pub processor: WebhookProcessor,
    pub gateway: Arc<dyn ProvisioningGateway>,
}

impl AppState {
    pub fn new(config: Config, db_pool: AnyPool, gateway: Arc<dyn ProvisioningGateway>) -> Self {
        let cache = OwnerCache::new(config.cache_max_capacity, config.cache_ttl);
        let registry = AddressRegistry::new(db_pool.clone(), cache);
        let ledger = IdempotencyLedger::new(db_pool.clone());
        let verifier = SignatureVerifier::new(config.webhook_secret.as_bytes());
        let processor = WebhookProcessor::new(verifier, ledger.clone(), registry.clone());

        Self {
            config,
            db_pool,
            registry,
            ledger,
            processor,
            gateway,
        }
    }
}
