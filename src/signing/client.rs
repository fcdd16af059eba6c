//! Custody service client.
//!
//! # Responsibilities
//! - Submit signing requests
//! - Query request status and signed messages
//! - Resolve an account's deposit address for an asset
//!
//! # Security Constraints
//! - API key and bearer token come ONLY from environment variables
//! - Neither is ever logged

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::SigningAlgorithm;
use crate::config::SignerConfig;
use crate::error::{RelayError, RelayResult};
use crate::signing::types::{
    MessageKind, RequestStatus, SignatureShape, SignedMessage, SigningOperation, SigningRequest,
    StatusSnapshot, SubmittedRequest,
};

/// The remote custody signer.
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    async fn create_request(&self, request: &SigningRequest) -> RelayResult<SubmittedRequest>;

    async fn request_status(&self, id: &str) -> RelayResult<StatusSnapshot>;

    /// First deposit address of `account` for `asset_id`.
    async fn resolve_address(&self, account: &str, asset_id: &str) -> RelayResult<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    operation: SigningOperation,
    asset_id: &'a str,
    source: Source<'a>,
    note: &'a str,
    #[serde(rename = "externalTxId")]
    external_tx_id: &'a str,
    extra_parameters: ExtraParameters<'a>,
}

#[derive(Debug, Serialize)]
struct Source<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtraParameters<'a> {
    raw_message_data: RawMessageData<'a>,
}

#[derive(Debug, Serialize)]
struct RawMessageData<'a> {
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    derivation_path: Option<&'a [u32]>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<MessageKind>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    status: String,
    #[serde(default)]
    sub_status: Option<String>,
    #[serde(default)]
    signed_messages: Vec<WireSignedMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSignedMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    signature: Option<SignatureShape>,
    #[serde(default)]
    public_key: Option<String>,
    #[serde(default)]
    algorithm: Option<SigningAlgorithm>,
}

#[derive(Debug, Deserialize)]
struct AddressPage {
    #[serde(default)]
    addresses: Vec<AddressEntry>,
}

#[derive(Debug, Deserialize)]
struct AddressEntry {
    address: String,
}

/// REST client for the custody service.
#[derive(Clone)]
pub struct HttpRemoteSigner {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
}

impl HttpRemoteSigner {
    /// Build from config, reading credentials from the environment.
    pub fn new(config: &SignerConfig) -> RelayResult<Self> {
        Self::with_credentials(config, config.api_key(), config.token())
    }

    pub fn with_credentials(
        config: &SignerConfig,
        api_key: Option<String>,
        token: Option<String>,
    ) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RelayError::SignerUnavailable(format!("HTTP client: {}", e)))?;

        if api_key.is_none() || token.is_none() {
            tracing::warn!("Signer credentials incomplete; requests may be rejected");
        }

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("X-API-Key", key);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> RelayResult<T> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!(error = %e, operation = what, "Signer request failed");
            RelayError::SignerUnavailable(format!("{}: {}", what, e))
        })?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(operation = what, status = %status, "Signer returned a server error");
            return Err(RelayError::SignerUnavailable(format!("{} returned {}: {}", what, status, body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::MalformedSignerResponse(format!(
                "{} returned {}: {}",
                what, status, body
            )));
        }

        response.json().await.map_err(|e| {
            RelayError::MalformedSignerResponse(format!("{} response: {}", what, e))
        })
    }
}

#[async_trait]
impl RemoteSigner for HttpRemoteSigner {
    async fn create_request(&self, request: &SigningRequest) -> RelayResult<SubmittedRequest> {
        let body = CreateBody {
            operation: request.operation,
            asset_id: &request.asset_id,
            source: Source { kind: "VAULT_ACCOUNT", id: &request.account_id },
            note: &request.note,
            external_tx_id: &request.external_id,
            extra_parameters: ExtraParameters {
                raw_message_data: RawMessageData {
                    messages: request
                        .messages
                        .iter()
                        .map(|m| WireMessage {
                            content: &m.content,
                            derivation_path: m.derivation_path.as_deref(),
                            kind: m.kind,
                        })
                        .collect(),
                },
            },
        };

        let response: CreateResponse = self
            .send_json(
                self.request(reqwest::Method::POST, "/v1/transactions").json(&body),
                "create signing request",
            )
            .await?;

        tracing::debug!(
            account = %request.account_id,
            asset = %request.asset_id,
            id = ?response.id,
            "Signing request submitted"
        );
        Ok(SubmittedRequest { id: response.id, status: response.status })
    }

    async fn request_status(&self, id: &str) -> RelayResult<StatusSnapshot> {
        let response: StatusResponse = self
            .send_json(
                self.request(reqwest::Method::GET, &format!("/v1/transactions/{}", id)),
                "query signing request",
            )
            .await?;

        Ok(StatusSnapshot {
            status: RequestStatus::parse(&response.status),
            sub_status: response.sub_status.unwrap_or_default(),
            signed_messages: response
                .signed_messages
                .into_iter()
                .map(|m| SignedMessage {
                    content: m.content,
                    signature: m.signature,
                    public_key: m.public_key,
                    algorithm: m.algorithm,
                })
                .collect(),
        })
    }

    async fn resolve_address(&self, account: &str, asset_id: &str) -> RelayResult<String> {
        let path = format!("/v1/vault/accounts/{}/{}/addresses_paginated", account, asset_id);
        let page: AddressPage = self
            .send_json(self.request(reqwest::Method::GET, &path), "resolve address")
            .await?;

        page.addresses.into_iter().next().map(|a| a.address).ok_or_else(|| {
            RelayError::InputValidation(format!(
                "Account {} has no {} deposit address",
                account, asset_id
            ))
        })
    }
}

impl std::fmt::Debug for HttpRemoteSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemoteSigner")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
