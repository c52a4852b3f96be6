use crate::config::Config;
use crate::provisioning::auth;
use crate::provisioning::{
    EvmAccount, EvmSmartAccount, ProvisioningError, ProvisioningGateway, SolanaAccount, WebhookSubscription,
    WebhookSubscriptionRequest,
};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

const EVM_ACCOUNTS_PATH: &str = "/platform/v2/evm/accounts";
const EVM_SMART_ACCOUNTS_PATH: &str = "/platform/v2/evm/smart-accounts";
const SOLANA_ACCOUNTS_PATH: &str = "/platform/v2/solana/accounts";
const WEBHOOK_SUBSCRIPTIONS_PATH: &str = "/platform/v2/data/webhooks/subscriptions";

const MAX_RETRIES: usize = 3;

/// HTTP client for the CDP v2 REST API.
pub struct CdpClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    api_key_id: String,
    api_key_secret: String,
    wallet_secret: String,
    min_retry_delay: Duration,
}

impl CdpClient {
    pub fn new(config: &Config) -> Result<Self, ProvisioningError> {
        let url = Url::parse(&config.cdp_api_base_url)
            .map_err(|_| ProvisioningError::InvalidBaseUrl(config.cdp_api_base_url.clone()))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(ProvisioningError::InvalidBaseUrl(config.cdp_api_base_url.clone())),
        };

        let http = reqwest::Client::builder().timeout(config.cdp_timeout).build()?;

        info!("Initializing CDP client with endpoint: {}", config.cdp_api_base_url);

        Ok(Self {
            http,
            base_url: config.cdp_api_base_url.trim_end_matches('/').to_string(),
            host,
            api_key_id: config.api_key_id.clone(),
            api_key_secret: config.api_key_secret.clone(),
            wallet_secret: config.wallet_secret.clone(),
            min_retry_delay: Duration::from_millis(200),
        })
    }

    pub fn with_min_retry_delay(mut self, delay: Duration) -> Self {
        self.min_retry_delay = delay;
        self
    }

    /// Send a request, retrying transient failures. Account-creating calls
    /// carry wallet auth and an idempotency key that stays the same across
    /// retries, so a retry after a lost response cannot create a second
    /// account.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        wallet_auth: bool,
    ) -> Result<T, ProvisioningError> {
        let body = match body {
            Some(body) => serde_json::to_vec(&body)?,
            None => Vec::new(),
        };
        let idempotency_key = wallet_auth.then(|| uuid::Uuid::new_v4().to_string());

        let attempt = || self.send_once::<T>(method.clone(), path, &body, wallet_auth, idempotency_key.as_deref());

        attempt
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(self.min_retry_delay)
                    .with_max_times(MAX_RETRIES),
            )
            .when(ProvisioningError::is_transient)
            .notify(|err: &ProvisioningError, delay: Duration| {
                warn!("CDP request {} {} failed, retrying in {:?}: {}", method, path, delay, err);
            })
            .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &[u8],
        wallet_auth: bool,
        idempotency_key: Option<&str>,
    ) -> Result<T, ProvisioningError> {
        let now = chrono::Utc::now().timestamp();
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(auth::bearer_token(&self.api_key_id, &self.api_key_secret, now)?)
            .header(CONTENT_TYPE, "application/json");

        if wallet_auth {
            let uri = format!("{} {}{}", method, self.host, path);
            request = request.header(
                "X-Wallet-Auth",
                auth::wallet_auth_token(&self.wallet_secret, &uri, body, now)?,
            );
        }
        if let Some(key) = idempotency_key {
            request = request.header("X-Idempotency-Key", key);
        }
        if !body.is_empty() {
            request = request.body(body.to_vec());
        }

        debug!("CDP request {} {}", method, path);
        let response = request.send().await?;
        parse_response(response).await
    }
}

/// Caller-supplied values are percent-encoded as single path segments so they
/// cannot change which endpoint is requested.
fn token_balances_path(network: &str, address: &str) -> String {
    let mut url = Url::parse("http://cdp.invalid/").expect("static URL parses");
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .extend(["platform", "v2", "data", "evm", "token-balances", network, address]);
    }
    format!("{}?pageSize=20", url.path())
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProvisioningError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProvisioningError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json::<T>().await?)
}

#[async_trait]
impl ProvisioningGateway for CdpClient {
    async fn create_evm_account(&self) -> Result<EvmAccount, ProvisioningError> {
        self.send(Method::POST, EVM_ACCOUNTS_PATH, Some(json!({})), true).await
    }

    async fn create_evm_smart_account(&self, owner: &str) -> Result<EvmSmartAccount, ProvisioningError> {
        self.send(
            Method::POST,
            EVM_SMART_ACCOUNTS_PATH,
            Some(json!({ "owners": [owner] })),
            true,
        )
        .await
    }

    async fn create_solana_account(&self) -> Result<SolanaAccount, ProvisioningError> {
        self.send(Method::POST, SOLANA_ACCOUNTS_PATH, Some(json!({})), true).await
    }

    async fn token_balances(&self, network: &str, address: &str) -> Result<serde_json::Value, ProvisioningError> {
        let path = token_balances_path(network, address);
        self.send(Method::GET, &path, None, false).await
    }

    /// Not retried: a lost response could otherwise leave two subscriptions.
    async fn register_webhook(
        &self,
        subscription: &WebhookSubscriptionRequest,
    ) -> Result<WebhookSubscription, ProvisioningError> {
        let body = serde_json::to_string(subscription)?;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = auth::subscription_signature(
            &self.api_key_secret,
            timestamp,
            "POST",
            WEBHOOK_SUBSCRIPTIONS_PATH,
            &body,
        );

        let response = self
            .http
            .post(format!("{}{}", self.base_url, WEBHOOK_SUBSCRIPTIONS_PATH))
            .header(CONTENT_TYPE, "application/json")
            .header("CB-ACCESS-KEY", &self.api_key_id)
            .header("CB-ACCESS-SIGN", signature)
            .header("CB-ACCESS-TIMESTAMP", timestamp.to_string())
            .body(body)
            .send()
            .await?;

        let subscription: WebhookSubscription = parse_response(response).await?;
        info!(
            "CDP webhook subscription registered (id: {})",
            subscription.id.as_deref().unwrap_or("unknown")
        );
        Ok(subscription)
    }
}
