//! Signer sessions: one resolved address plus the services to act for it.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::{cardano_derivation_path, Chain, Indexer, SigningAlgorithm};
use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult, ResultExt};
use crate::ledger::{
    assemble_transfer, select_outputs, validity_deadline, SignedTransfer, TransactionSerializer,
    TransferRequest, Witness,
};
use crate::signing::{
    ClaimPayload, RemoteSigner, SigningDriver, SigningOperation, SigningOutcome, SigningRequest,
    SigningResult, UnsignedMessage,
};

/// Pool key. A single account may hold sessions on several chains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub account: String,
    pub chain: Chain,
}

impl SessionKey {
    pub fn new(account: impl Into<String>, chain: Chain) -> Self {
        Self { account: account.into(), chain }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.account, self.chain)
    }
}

/// Builds sessions on a pool miss. Construction either fully succeeds or
/// returns an error; the pool never sees a half-built session.
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Send + Sync + 'static;

    async fn create(&self, key: &SessionKey) -> RelayResult<Self::Session>;
}

/// A custody account's deposit address on one chain, with the clients
/// needed to sign and transfer from it.
pub struct SignerSession {
    key: SessionKey,
    address: String,
    driver: SigningDriver,
    indexer: Arc<dyn Indexer>,
    serializer: Arc<dyn TransactionSerializer>,
    ttl_buffer: u64,
    sign_timeout: Duration,
}

impl SignerSession {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn account(&self) -> &str {
        &self.key.account
    }

    pub fn chain(&self) -> Chain {
        self.key.chain
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Run one signing flow under the session's timeout.
    pub async fn sign(&self, request: &SigningRequest) -> RelayResult<SigningOutcome> {
        match tokio::time::timeout(self.sign_timeout, self.driver.sign(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    session = %self.key,
                    timeout_secs = self.sign_timeout.as_secs(),
                    "Signing timed out; remote request left outstanding"
                );
                Err(RelayError::Timeout(self.sign_timeout.as_secs()))
            }
        }
    }

    /// Sign a claim message with this chain's message convention.
    pub async fn sign_claim(&self, message: &str) -> RelayResult<SigningResult> {
        let result: RelayResult<SigningResult> = async {
            let request = ClaimPayload::build(self.chain(), self.account(), &self.address, message)?;
            Ok(self.sign(&request).await?.result)
        }
        .await;
        result.context(self.account(), self.chain(), "sign claim")
    }

    /// Select, assemble, sign and finalize a token transfer.
    pub async fn transfer(&self, request: &TransferRequest) -> RelayResult<SignedTransfer> {
        self.build_transfer(request)
            .await
            .context(self.account(), self.chain(), "transfer")
    }

    /// Broadcast a finalized transfer through the indexer.
    pub async fn broadcast(&self, transfer: &SignedTransfer) -> RelayResult<String> {
        let bytes = hex::decode(&transfer.cbor_hex)
            .map_err(|e| {
                RelayError::SerializationFailure(format!("Signed transfer is not hex: {}", e))
            })
            .context(self.account(), self.chain(), "broadcast")?;
        self.indexer
            .submit_transaction(&bytes)
            .await
            .context(self.account(), self.chain(), "broadcast")
    }

    async fn build_transfer(&self, request: &TransferRequest) -> RelayResult<SignedTransfer> {
        if !self.chain().supports_transfers() {
            return Err(RelayError::InputValidation(format!(
                "Token transfers are not supported on {}",
                self.chain()
            )));
        }

        let outputs = self.indexer.spendable_outputs(&self.address).await?;
        let selection = select_outputs(&outputs, &request.target())?;
        let slot = self.indexer.current_slot().await?;
        let ttl = validity_deadline(slot, self.ttl_buffer)?;
        let unsigned = assemble_transfer(&selection, request, &self.address, ttl)?;
        let body = self.serializer.serialize_body(&unsigned)?;

        let signing = SigningRequest::new(
            self.chain(),
            self.account(),
            SigningOperation::Raw,
            UnsignedMessage {
                content: hex::encode(body.signing_hash),
                derivation_path: Some(cardano_derivation_path(self.account())?),
                kind: None,
            },
            format!("transfer {} {}", request.token_amount, request.token_unit),
        );
        let signed = self.sign(&signing).await?.result;
        if signed.algorithm != SigningAlgorithm::EddsaEd25519 {
            return Err(RelayError::MalformedSignerResponse(format!(
                "Expected an Ed25519 witness, got {:?}",
                signed.algorithm
            )));
        }

        let decode = |field: &str, value: &str| {
            hex::decode(value).map_err(|e| {
                RelayError::MalformedSignerResponse(format!("{} is not hex: {}", field, e))
            })
        };
        let witness = Witness {
            public_key: decode("publicKey", &signed.public_key)?,
            signature: decode("fullSig", &signed.signature.full_sig)?,
        };
        let finalized = self.serializer.finalize(&body, &[witness])?;

        tracing::info!(
            session = %self.key,
            tx_hash = %body.tx_hash(),
            inputs = unsigned.inputs.len(),
            ttl,
            "Transfer signed"
        );

        Ok(SignedTransfer {
            tx_hash: body.tx_hash(),
            cbor_hex: hex::encode(finalized),
            transaction: unsigned,
        })
    }
}

impl fmt::Debug for SignerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerSession")
            .field("key", &self.key)
            .field("address", &self.address)
            .finish()
    }
}

/// Resolves deposit addresses through the custody service.
pub struct CustodySessionFactory {
    signer: Arc<dyn RemoteSigner>,
    indexer: Arc<dyn Indexer>,
    serializer: Arc<dyn TransactionSerializer>,
    poll_interval: Duration,
    sign_timeout: Duration,
    ttl_buffer: u64,
}

impl CustodySessionFactory {
    pub fn new(
        config: &RelayConfig,
        signer: Arc<dyn RemoteSigner>,
        indexer: Arc<dyn Indexer>,
        serializer: Arc<dyn TransactionSerializer>,
    ) -> Self {
        Self {
            signer,
            indexer,
            serializer,
            poll_interval: config.signer.poll_interval(),
            sign_timeout: config.signer.sign_timeout(),
            ttl_buffer: config.transfer.ttl_buffer,
        }
    }
}

#[async_trait]
impl SessionFactory for CustodySessionFactory {
    type Session = SignerSession;

    async fn create(&self, key: &SessionKey) -> RelayResult<SignerSession> {
        let address = self
            .signer
            .resolve_address(&key.account, key.chain.asset_id())
            .await
            .context(&key.account, key.chain, "resolve address")?;

        tracing::debug!(session = %key, address = %address, "Session created");

        Ok(SignerSession {
            key: key.clone(),
            address,
            driver: SigningDriver::new(self.signer.clone(), self.poll_interval),
            indexer: self.indexer.clone(),
            serializer: self.serializer.clone(),
            ttl_buffer: self.ttl_buffer,
            sign_timeout: self.sign_timeout,
        })
    }
}
