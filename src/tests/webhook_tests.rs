//! Webhook ingestion: signature enforcement, filtering, and idempotent
//! recording, driven through the router the same way the sender hits it.

use super::{deposit_body, sign, test_config, test_state, test_state_with, MockGateway, DEPOSIT_BODY};
use crate::{
    api::create_router,
    models::Chain,
    webhook::{compute_signature, ProcessingOutcome, WebhookError},
    AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::future::join_all;
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

async fn setup() -> (Arc<AppState>, Router) {
    let state = test_state().await;
    state
        .registry
        .insert_if_absent("0xabc", None, Chain::Evm)
        .await
        .unwrap();
    let app = create_router(state.clone());
    (state, app)
}

fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/cdp")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("X-Hook-Signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn deliver(app: &Router, body: &str, signature: Option<&str>) -> StatusCode {
    app.clone()
        .oneshot(webhook_request(body, signature))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_valid_deposit_is_recorded() {
    let (state, app) = setup().await;

    let status = deliver(&app, DEPOSIT_BODY, Some(sign(DEPOSIT_BODY).as_str())).await;
    assert_eq!(status, StatusCode::OK);

    let row = state.ledger.get("0xdead").await.unwrap().expect("row should exist");
    assert_eq!(row.tx_hash, "0xdead");
    assert_eq!(row.chain, "evm");
    assert_eq!(row.address, "0xabc");
    assert_eq!(row.amount.as_str(), "5");
    assert_eq!(state.ledger.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_redelivery_is_acknowledged_without_second_row() {
    let (state, app) = setup().await;
    let signature = sign(DEPOSIT_BODY);

    for _ in 0..3 {
        let status = deliver(&app, DEPOSIT_BODY, Some(signature.as_str())).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(state.ledger.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_signature_is_rejected() {
    let (state, app) = setup().await;

    let status = deliver(&app, DEPOSIT_BODY, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(state.ledger.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let (state, app) = setup().await;
    let signature = compute_signature(b"wrong-secret", DEPOSIT_BODY.as_bytes());

    let status = deliver(&app, DEPOSIT_BODY, Some(signature.as_str())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.ledger.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_uppercase_signature_is_unauthorized() {
    let (state, app) = setup().await;
    let signature = sign(DEPOSIT_BODY).to_uppercase();

    let status = deliver(&app, DEPOSIT_BODY, Some(signature.as_str())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(state.ledger.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_tampered_body_is_unauthorized() {
    let (state, app) = setup().await;
    let signature = sign(DEPOSIT_BODY);
    let tampered = DEPOSIT_BODY.replace("\"amount\":5", "\"amount\":500");

    let status = deliver(&app, &tampered, Some(signature.as_str())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(state.ledger.get("0xdead").await.unwrap().is_none());
}

#[tokio::test]
async fn test_other_event_types_are_acknowledged_and_dropped() {
    let (state, app) = setup().await;
    let body = r#"{"type":"other.event","data":{"address":"0xabc","txHash":"0xdead","amount":5,"chain":"evm"}}"#;

    let status = deliver(&app, body, Some(sign(body).as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.ledger.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_other_event_types_still_require_signature() {
    let (_, app) = setup().await;
    let body = r#"{"type":"other.event","data":{}}"#;

    assert_eq!(deliver(&app, body, None).await, StatusCode::BAD_REQUEST);
    assert_eq!(deliver(&app, body, Some("deadbeef")).await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_address_is_acknowledged_without_row() {
    let (state, app) = setup().await;
    let body = deposit_body("0xnot-ours", "0xbeef", 1.0);

    let status = deliver(&app, &body, Some(sign(&body).as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.ledger.count().await.unwrap(), 0);

    // Registering the address afterwards lets a redelivery through.
    state
        .registry
        .insert_if_absent("0xnot-ours", None, Chain::Evm)
        .await
        .unwrap();
    let status = deliver(&app, &body, Some(sign(&body).as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.ledger.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_deposit_to_smart_account_resolves_to_owner() {
    let (state, _) = setup().await;
    let owner = "0x52908400098527886E0F7030069857D2E4169EE7";
    let smart = "0x8617E340B3D01FA5F11F306F4090FD50E238070D";
    state
        .registry
        .insert_if_absent(owner, Some(smart), Chain::Evm)
        .await
        .unwrap();

    // Sender reports the address with different checksum casing.
    let body = deposit_body(&smart.to_lowercase(), "0xfeed", 2.5);
    let outcome = state.processor.handle(body.as_bytes(), Some(sign(&body).as_str())).await.unwrap();

    assert_eq!(
        outcome,
        ProcessingOutcome::Recorded {
            tx_hash: "0xfeed".to_string(),
            owner: owner.to_lowercase(),
        }
    );
}

#[tokio::test]
async fn test_malformed_payload_with_valid_signature_is_bad_request() {
    let (state, app) = setup().await;

    let not_json = "this is not json";
    assert_eq!(deliver(&app, not_json, Some(sign(not_json).as_str())).await, StatusCode::BAD_REQUEST);

    let missing_fields = r#"{"type":"onchain.activity.detected","data":{"address":"0xabc"}}"#;
    assert_eq!(
        deliver(&app, missing_fields, Some(sign(missing_fields).as_str())).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(state.ledger.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_database_failure_is_server_error() {
    let (state, app) = setup().await;
    state.db_pool.close().await;

    let status = deliver(&app, DEPOSIT_BODY, Some(sign(DEPOSIT_BODY).as_str())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_processing_timeout_is_server_error() {
    let mut config = test_config();
    config.webhook_timeout = Duration::from_millis(50);
    let state = test_state_with(config, Arc::new(MockGateway::default())).await;
    state
        .registry
        .insert_if_absent("0xabc", None, Chain::Evm)
        .await
        .unwrap();
    let app = create_router(state.clone());

    // The test pool has a single connection; holding it stalls the ledger
    // lookup until the processing deadline passes.
    let held = state.db_pool.acquire().await.unwrap();
    let status = deliver(&app, DEPOSIT_BODY, Some(sign(DEPOSIT_BODY).as_str())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    drop(held);

    assert!(state.ledger.get("0xdead").await.unwrap().is_none());

    // The sender's redelivery goes through once the database responds.
    let status = deliver(&app, DEPOSIT_BODY, Some(sign(DEPOSIT_BODY).as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.ledger.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_deliveries_record_once() {
    let (state, _) = setup().await;
    let signature = sign(DEPOSIT_BODY);

    let deliveries = (0..10).map(|_| state.processor.handle(DEPOSIT_BODY.as_bytes(), Some(signature.as_str())));
    let results = join_all(deliveries).await;

    let mut recorded = 0;
    for result in results {
        match result.expect("no delivery should fail") {
            ProcessingOutcome::Recorded { .. } => recorded += 1,
            ProcessingOutcome::AlreadyProcessed { .. } | ProcessingOutcome::RecordedConcurrently { .. } => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(recorded, 1);
    assert_eq!(state.ledger.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_processor_outcomes() {
    let (state, _) = setup().await;
    let signature = sign(DEPOSIT_BODY);

    let first = state.processor.handle(DEPOSIT_BODY.as_bytes(), Some(signature.as_str())).await.unwrap();
    assert!(matches!(first, ProcessingOutcome::Recorded { .. }));

    let second = state.processor.handle(DEPOSIT_BODY.as_bytes(), Some(signature.as_str())).await.unwrap();
    assert_eq!(
        second,
        ProcessingOutcome::AlreadyProcessed {
            tx_hash: "0xdead".to_string()
        }
    );

    let err = state.processor.handle(DEPOSIT_BODY.as_bytes(), None).await.unwrap_err();
    assert!(matches!(err, WebhookError::Signature(_)));
}
