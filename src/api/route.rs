use crate::{
    api::{auth::require_api_key, error::ApiError, webhook::cdp_webhook},
    models::{EvmAccountResponse, SolanaAccountResponse},
    provisioning::{provision_evm_account, provision_solana_account, ProvisioningError, WebhookSubscriptionRequest},
    state::AppState,
    validation::{validate_evm_address, validate_network},
};
use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

// POST /get-token-balance request body
#[derive(Debug, Deserialize)]
pub struct TokenBalanceRequest {
    address: Option<String>,
    network: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenBalanceResponse {
    pub address: String,
    pub network: String,
    pub balances: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWebhookResponse {
    pub status: String,
    pub message: String,
    pub webhook_secret: Option<String>,
}

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/accounts/evm", post(create_evm_account))
        .route("/accounts/solana", post(create_solana_account))
        .route("/get-token-balance", post(get_token_balance))
        .route("/register-webhook", post(register_webhook))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .route("/webhooks/cdp", post(cdp_webhook))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Gateway failures are logged in full; the caller only sees `message`.
fn provisioning_failure(operation: &'static str, message: &'static str) -> impl FnOnce(ProvisioningError) -> ApiError {
    move |err| {
        error!(operation, "{}: {}", message, err);
        ApiError::Provisioning(message.to_string())
    }
}

// GET /health handler
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// POST /accounts/evm handler
async fn create_evm_account(State(state): State<Arc<AppState>>) -> Result<Json<EvmAccountResponse>, ApiError> {
    let account = provision_evm_account(state.gateway.as_ref(), &state.registry)
        .await
        .map_err(provisioning_failure("POST /accounts/evm", "Failed to create EVM account"))?;

    Ok(Json(account))
}

// POST /accounts/solana handler
async fn create_solana_account(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SolanaAccountResponse>, ApiError> {
    let account = provision_solana_account(state.gateway.as_ref(), &state.registry)
        .await
        .map_err(provisioning_failure("POST /accounts/solana", "Failed to create Solana account"))?;

    Ok(Json(account))
}

// POST /get-token-balance handler
async fn get_token_balance(
    State(state): State<Arc<AppState>>,
    Json(params): Json<TokenBalanceRequest>,
) -> Result<Json<TokenBalanceResponse>, ApiError> {
    let address = params.address.unwrap_or_default();
    validate_evm_address(&address).map_err(|e| ApiError::from(e).logged("POST /get-token-balance"))?;
    let network = params.network.unwrap_or_else(|| "base".to_string());
    validate_network(&network).map_err(|e| ApiError::from(e).logged("POST /get-token-balance"))?;

    info!("Fetching token balances for {} on {}", address, network);

    let balances = state
        .gateway
        .token_balances(&network, &address)
        .await
        .map_err(provisioning_failure("POST /get-token-balance", "Failed to fetch token balances"))?;

    Ok(Json(TokenBalanceResponse {
        address,
        network,
        balances,
    }))
}

// POST /register-webhook handler
async fn register_webhook(State(state): State<Arc<AppState>>) -> Result<Json<RegisterWebhookResponse>, ApiError> {
    let target_url = state
        .config
        .webhook_target_url()
        .map_err(|e| ApiError::from(e).logged("POST /register-webhook"))?;

    let request = WebhookSubscriptionRequest::deposit_notifications(target_url);
    let subscription = state
        .gateway
        .register_webhook(&request)
        .await
        .map_err(provisioning_failure("POST /register-webhook", "Failed to register webhook"))?;

    if subscription.secret().is_some() {
        info!("Webhook registered; configure the returned secret as CDP_WEBHOOK_SECRET");
    }

    Ok(Json(RegisterWebhookResponse {
        status: "ok".to_string(),
        message: "CDP webhook registration triggered".to_string(),
        webhook_secret: subscription.secret().map(str::to_string),
    }))
}
