//! Shared mock services for integration tests.
//!
//! Each mock is an axum router over shared state, served on an ephemeral
//! local port. Tests script the responses and inspect what was received.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bech32::{ToBase32, Variant};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use custody_relay::config::{ClaimsConfig, IndexerConfig, SignerConfig};

/// Serve `router` on 127.0.0.1 and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

/// A bech32 Cardano enterprise address whose key hash is `fill` repeated.
pub fn cardano_address(fill: u8) -> String {
    let mut raw = vec![0x61];
    raw.extend_from_slice(&[fill; 28]);
    bech32::encode("addr_test", raw.to_base32(), Variant::Bech32).unwrap()
}

/// A unique path under the system temp directory.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name))
}

pub fn signer_config(base_url: &str) -> SignerConfig {
    SignerConfig {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
        poll_interval_ms: 10,
        sign_timeout_secs: 10,
    }
}

pub fn indexer_config(base_url: &str) -> IndexerConfig {
    IndexerConfig {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
        page_size: 2,
    }
}

pub fn claims_config(base_url: &str) -> ClaimsConfig {
    ClaimsConfig {
        base_url: base_url.to_string(),
        terms_hash: "00ff".to_string(),
        batch_delay_secs: 0,
        retry_base_ms: 1,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Custody signer
// ---------------------------------------------------------------------------

/// Scripted custody service.
///
/// Every request walks `statuses` one poll at a time, staying on the last
/// entry once exhausted. A `COMPLETED` status carries `signed_message`.
pub struct MockSigner {
    pub statuses: Mutex<Vec<String>>,
    pub sub_status: String,
    pub address: String,
    pub signed_message: Mutex<Value>,
    pub omit_id: bool,
    pub created: Mutex<Vec<Value>>,
    pub polls: AtomicUsize,
    pub resolves: AtomicUsize,
}

impl MockSigner {
    pub fn new(address: impl Into<String>, statuses: &[&str]) -> Arc<Self> {
        Arc::new(Self::build(address.into(), statuses, false))
    }

    /// A service that accepts requests without returning an id.
    pub fn without_ids(address: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(address.into(), &["COMPLETED"], true))
    }

    fn build(address: String, statuses: &[&str], omit_id: bool) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().map(|s| s.to_string()).collect()),
            sub_status: "REJECTED_BY_USER".to_string(),
            address,
            signed_message: Mutex::new(ed25519_message(&[0x11; 64], &[0x22; 32])),
            omit_id,
            created: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
            resolves: AtomicUsize::new(0),
        }
    }

    pub fn set_signed_message(&self, message: Value) {
        *self.signed_message.lock().unwrap() = message;
    }

    pub fn created(&self) -> Vec<Value> {
        self.created.lock().unwrap().clone()
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub async fn start(self: &Arc<Self>) -> String {
        let router = Router::new()
            .route("/v1/transactions", post(create_transaction))
            .route("/v1/transactions/{id}", get(transaction_status))
            .route(
                "/v1/vault/accounts/{account}/{asset}/addresses_paginated",
                get(vault_addresses),
            )
            .with_state(self.clone());
        serve(router).await
    }
}

/// Signed-message entry for an Ed25519 signature.
pub fn ed25519_message(signature: &[u8], public_key: &[u8]) -> Value {
    json!({
        "content": "",
        "signature": { "fullSig": hex::encode(signature) },
        "publicKey": hex::encode(public_key),
        "algorithm": "MPC_EDDSA_ED25519",
    })
}

async fn create_transaction(State(mock): State<Arc<MockSigner>>, Json(body): Json<Value>) -> Json<Value> {
    let mut created = mock.created.lock().unwrap();
    created.push(body);
    if mock.omit_id {
        return Json(json!({ "status": "SUBMITTED" }));
    }
    Json(json!({ "id": format!("req-{}", created.len()), "status": "SUBMITTED" }))
}

async fn transaction_status(State(mock): State<Arc<MockSigner>>, Path(id): Path<String>) -> Json<Value> {
    let poll = mock.polls.fetch_add(1, Ordering::SeqCst);
    let status = {
        let statuses = mock.statuses.lock().unwrap();
        statuses
            .get(poll)
            .or_else(|| statuses.last())
            .cloned()
            .unwrap_or_else(|| "PENDING_SIGNATURE".to_string())
    };

    let signed_messages = if status == "COMPLETED" {
        vec![mock.signed_message.lock().unwrap().clone()]
    } else {
        Vec::new()
    };
    Json(json!({
        "id": id,
        "status": status,
        "subStatus": mock.sub_status,
        "signedMessages": signed_messages,
    }))
}

async fn vault_addresses(
    State(mock): State<Arc<MockSigner>>,
    Path((_account, _asset)): Path<(String, String)>,
) -> Json<Value> {
    mock.resolves.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "addresses": [{ "address": mock.address }] }))
}

// ---------------------------------------------------------------------------
// UTXO indexer
// ---------------------------------------------------------------------------

pub struct MockIndexer {
    pub utxos: Vec<Value>,
    pub slot: u64,
    pub submitted: Mutex<Vec<Vec<u8>>>,
}

impl MockIndexer {
    pub fn new(utxos: Vec<Value>, slot: u64) -> Arc<Self> {
        Arc::new(Self {
            utxos,
            slot,
            submitted: Mutex::new(Vec::new()),
        })
    }

    pub async fn start(self: &Arc<Self>) -> String {
        let router = Router::new()
            .route("/addresses/{address}/utxos", get(address_utxos))
            .route("/blocks/latest", get(latest_block))
            .route("/tx/submit", post(submit_tx))
            .with_state(self.clone());
        serve(router).await
    }
}

/// Indexer entry holding `lovelace` and optionally `token` units of `unit`.
pub fn utxo(address: &str, tx_hash: &str, index: u32, lovelace: u64, token: Option<(&str, u64)>) -> Value {
    let mut amount = vec![json!({ "unit": "lovelace", "quantity": lovelace.to_string() })];
    if let Some((unit, qty)) = token {
        amount.push(json!({ "unit": unit, "quantity": qty.to_string() }));
    }
    json!({
        "address": address,
        "tx_hash": tx_hash,
        "output_index": index,
        "amount": amount,
        "block": "b1",
    })
}

#[derive(Deserialize)]
struct PageQuery {
    page: usize,
    count: usize,
}

async fn address_utxos(
    State(mock): State<Arc<MockIndexer>>,
    Path(_address): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    if mock.utxos.is_empty() {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" }))).into_response();
    }
    let start = (query.page.saturating_sub(1)) * query.count;
    let page: Vec<Value> = mock.utxos.iter().skip(start).take(query.count).cloned().collect();
    Json(page).into_response()
}

async fn latest_block(State(mock): State<Arc<MockIndexer>>) -> Json<Value> {
    Json(json!({ "slot": mock.slot, "height": 1 }))
}

async fn submit_tx(State(mock): State<Arc<MockIndexer>>, body: Bytes) -> Json<Value> {
    mock.submitted.lock().unwrap().push(body.to_vec());
    Json(json!("submitted-tx-hash"))
}

// ---------------------------------------------------------------------------
// Claim API
// ---------------------------------------------------------------------------

pub struct MockClaims {
    /// `None` answers eligibility checks with 404.
    pub allocation: Option<Value>,
    pub history: Value,
    pub submissions: Mutex<Vec<(String, Value)>>,
    pub fail_submissions: AtomicUsize,
    /// Answer every submission with 400.
    pub reject_submissions: AtomicBool,
}

impl MockClaims {
    pub fn new(allocation: Option<Value>, history: Value) -> Arc<Self> {
        Arc::new(Self {
            allocation,
            history,
            submissions: Mutex::new(Vec::new()),
            fail_submissions: AtomicUsize::new(0),
            reject_submissions: AtomicBool::new(false),
        })
    }

    pub fn submissions(&self) -> Vec<(String, Value)> {
        self.submissions.lock().unwrap().clone()
    }

    pub async fn start(self: &Arc<Self>) -> String {
        let router = Router::new()
            .route("/check/{chain}/{address}", get(check))
            .route("/claims/{chain}/{address}", get(history))
            .route("/claims/{chain}", post(submit))
            .with_state(self.clone());
        serve(router).await
    }
}

async fn check(State(mock): State<Arc<MockClaims>>, Path((_chain, _address)): Path<(String, String)>) -> Response {
    match &mock.allocation {
        Some(value) => Json(json!({ "value": value })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn history(State(mock): State<Arc<MockClaims>>, Path((_chain, _address)): Path<(String, String)>) -> Json<Value> {
    Json(mock.history.clone())
}

async fn submit(
    State(mock): State<Arc<MockClaims>>,
    Path(chain): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if mock.reject_submissions.load(Ordering::SeqCst) {
        return (StatusCode::BAD_REQUEST, "invalid signature").into_response();
    }
    let remaining = mock.fail_submissions.load(Ordering::SeqCst);
    if remaining > 0 {
        mock.fail_submissions.store(remaining - 1, Ordering::SeqCst);
        return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
    }
    mock.submissions.lock().unwrap().push((chain, body.clone()));
    Json(json!({ "status": "accepted", "address": body["address"] })).into_response()
}
