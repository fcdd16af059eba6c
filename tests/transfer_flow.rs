//! Token transfers end to end: indexer, selection, remote Ed25519 witness,
//! serialization and broadcast.

use std::sync::Arc;

use custody_relay::blockchain::{Chain, HttpIndexer, LOVELACE};
use custody_relay::config::RelayConfig;
use custody_relay::ledger::{CardanoSerializer, TransferRequest};
use custody_relay::pool::{CustodySessionFactory, SessionPool};
use custody_relay::signing::HttpRemoteSigner;
use custody_relay::RelayError;
use serde_json::{json, Value};

mod common;

use common::{cardano_address, indexer_config, signer_config, utxo, MockIndexer, MockSigner};

fn token_unit() -> String {
    format!("{}{}", "ab".repeat(28), hex::encode("X"))
}

fn request(amount: u64) -> TransferRequest {
    TransferRequest {
        recipient: cardano_address(1),
        token_unit: token_unit(),
        token_amount: amount,
        fee: 200_000,
        recipient_min: 1_200_000,
        change_min: 1_200_000,
    }
}

async fn pool_for(
    signer: &Arc<MockSigner>,
    indexer: &Arc<MockIndexer>,
) -> SessionPool<CustodySessionFactory> {
    let config = RelayConfig {
        signer: signer_config(&signer.start().await),
        indexer: indexer_config(&indexer.start().await),
        ..Default::default()
    };
    let remote = Arc::new(HttpRemoteSigner::with_credentials(&config.signer, None, None).unwrap());
    let http_indexer = Arc::new(HttpIndexer::with_project_id(&config.indexer, Some("pid".into())).unwrap());
    let factory = CustodySessionFactory::new(&config, remote, http_indexer, Arc::new(CardanoSerializer));
    SessionPool::new(factory, &config.pool)
}

#[tokio::test]
async fn test_single_output_short_of_native() {
    let sender = cardano_address(2);
    let signer = MockSigner::new(sender.clone(), &["COMPLETED"]);
    let indexer = MockIndexer::new(
        vec![utxo(&sender, &"11".repeat(32), 0, 2_000_000, Some((&token_unit(), 500)))],
        1_000,
    );
    let pool = pool_for(&signer, &indexer).await;

    let session = pool.acquire("5", Chain::Cardano).await.unwrap();
    let err = session.transfer(&request(300)).await.unwrap_err();

    match err.root() {
        RelayError::InsufficientBalance { required_native, available_native, .. } => {
            assert_eq!(*required_native, 2_600_000);
            assert_eq!(*available_native, 2_000_000);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(signer.created().is_empty());
}

#[tokio::test]
async fn test_transfer_signed_and_broadcast() {
    let sender = cardano_address(2);
    let signer = MockSigner::new(sender.clone(), &["PENDING_SIGNATURE", "COMPLETED"]);
    let indexer = MockIndexer::new(
        vec![
            utxo(&sender, &"11".repeat(32), 0, 2_800_000, Some((&token_unit(), 500))),
            utxo(&sender, &"22".repeat(32), 1, 1_200_000, None),
        ],
        1_000,
    );
    let pool = pool_for(&signer, &indexer).await;

    let session = pool.acquire("5", Chain::Cardano).await.unwrap();
    let signed = session.transfer(&request(300)).await.unwrap();

    let tx = &signed.transaction;
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.ttl, 1_000 + custody_relay::ledger::DEFAULT_TTL_BUFFER);

    let recipient = &tx.outputs[0];
    assert_eq!(recipient.address, cardano_address(1));
    assert_eq!(recipient.amounts[&token_unit()], 300);
    assert_eq!(recipient.amounts[LOVELACE], 1_200_000);

    let change = &tx.outputs[1];
    assert_eq!(change.address, sender);
    assert_eq!(change.amounts[&token_unit()], 200);
    assert_eq!(change.amounts[LOVELACE], 1_400_000);

    // the remote signer was asked to sign the body hash with the payment key
    let message: Value = signer.created()[0]["extraParameters"]["rawMessageData"]["messages"][0].clone();
    assert_eq!(message["content"], signed.tx_hash.as_str());
    assert_eq!(message["derivationPath"], json!([44, 1815, 5, 0, 0]));
    assert_eq!(signed.tx_hash.len(), 64);

    assert!(signed.cbor_hex.starts_with("84"));
    assert!(signed.cbor_hex.contains(&hex::encode([0x11; 64])));
    assert!(signed.cbor_hex.contains(&hex::encode([0x22; 32])));

    let submitted = session.broadcast(&signed).await.unwrap();
    assert_eq!(submitted, "submitted-tx-hash");
    let sent = indexer.submitted.lock().unwrap().clone();
    assert_eq!(sent, vec![hex::decode(&signed.cbor_hex).unwrap()]);
}

#[tokio::test]
async fn test_unused_address_has_no_matching_outputs() {
    let sender = cardano_address(2);
    let signer = MockSigner::new(sender, &["COMPLETED"]);
    let indexer = MockIndexer::new(Vec::new(), 1_000);
    let pool = pool_for(&signer, &indexer).await;

    let session = pool.acquire("5", Chain::Cardano).await.unwrap();
    let err = session.transfer(&request(300)).await.unwrap_err();
    assert!(matches!(err.root(), RelayError::NoMatchingOutputs(_)));
}

#[tokio::test]
async fn test_ecdsa_witness_rejected() {
    let sender = cardano_address(2);
    let signer = MockSigner::new(sender.clone(), &["COMPLETED"]);
    signer.set_signed_message(json!({
        "content": "",
        "signature": { "fullSig": "aa".repeat(64), "r": "aa".repeat(32), "s": "bb".repeat(32), "v": 0 },
        "publicKey": "02".repeat(33),
        "algorithm": "MPC_ECDSA_SECP256K1",
    }));
    let indexer = MockIndexer::new(
        vec![utxo(&sender, &"11".repeat(32), 0, 5_000_000, Some((&token_unit(), 500)))],
        1_000,
    );
    let pool = pool_for(&signer, &indexer).await;

    let session = pool.acquire("5", Chain::Cardano).await.unwrap();
    let err = session.transfer(&request(300)).await.unwrap_err();
    assert!(matches!(err.root(), RelayError::MalformedSignerResponse(_)));
}

#[tokio::test]
async fn test_transfers_only_on_cardano() {
    let signer = MockSigner::new("So1", &["COMPLETED"]);
    let indexer = MockIndexer::new(Vec::new(), 1_000);
    let pool = pool_for(&signer, &indexer).await;

    let session = pool.acquire("5", Chain::Solana).await.unwrap();
    let err = session.transfer(&request(300)).await.unwrap_err();
    assert!(matches!(err.root(), RelayError::InputValidation(_)));
    assert!(err.to_string().contains("transfer failed for account 5 on solana"));
}
