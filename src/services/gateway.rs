//! Ledger gateway client.
//!
//! The gateway is the remote indexing service that accepts broadcast
//! transactions and answers inclusion and tip-height queries. Every
//! failure leaves this module already classified through the submission
//! taxonomy; nothing above it sees a raw transport error.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use crate::models::{classify_gateway_failure, GatewayError, SubmissionErrorKind};

/// Block placement of a transaction found on-chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionInfo {
    pub block_hash: String,
    pub block_height: u64,
    pub block_time: Option<String>,
}

/// The three gateway operations the pipeline consumes. Treated as a
/// rate-limited external resource: batch pacing and concurrency caps
/// elsewhere exist to protect it.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Broadcasts a signed transaction body, returning its hash.
    async fn submit_transaction(&self, signed_body: &str) -> Result<String, GatewayError>;

    /// Returns the block placement of a transaction, or `None` while it is
    /// not (yet) on-chain.
    async fn get_transaction_info(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionInfo>, GatewayError>;

    /// Current chain tip height.
    async fn get_current_tip_height(&self) -> Result<u64, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct TipResponse {
    height: u64,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    tx: &'a str,
}

/// JSON-over-HTTP gateway client.
pub struct HttpLedgerGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpLedgerGateway {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn classify_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let kind = classify_gateway_failure(Some(status.as_u16()), &body);
        Err(GatewayError::new(
            kind,
            format!("gateway returned {}: {}", status, body),
        ))
    }

    fn transport_error(error: reqwest::Error) -> GatewayError {
        GatewayError::new(
            SubmissionErrorKind::NetworkError,
            format!("gateway request failed: {}", error),
        )
    }
}

#[async_trait]
impl LedgerGateway for HttpLedgerGateway {
    async fn submit_transaction(&self, signed_body: &str) -> Result<String, GatewayError> {
        let url = format!("{}/tx/submit", self.base_url);
        let response = self
            .request(self.client.post(&url))
            .json(&SubmitRequest { tx: signed_body })
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::classify_response(response).await?;
        let parsed: SubmitResponse = response.json().await.map_err(Self::transport_error)?;
        Ok(parsed.hash)
    }

    async fn get_transaction_info(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionInfo>, GatewayError> {
        let url = format!("{}/txs/{}", self.base_url, hash);
        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(Self::transport_error)?;

        // Not-yet-on-chain is the indexer's 404, not a failure.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::classify_response(response).await?;
        let parsed: TransactionInfo = response.json().await.map_err(Self::transport_error)?;
        Ok(Some(parsed))
    }

    async fn get_current_tip_height(&self) -> Result<u64, GatewayError> {
        let url = format!("{}/blocks/tip", self.base_url);
        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(Self::transport_error)?;

        let response = Self::classify_response(response).await?;
        let parsed: TipResponse = response.json().await.map_err(Self::transport_error)?;
        Ok(parsed.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_returns_hash() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tx/submit")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"hash":"abc123"}"#)
            .create_async()
            .await;

        let gateway = HttpLedgerGateway::new(server.url(), None);
        let hash = gateway.submit_transaction("84a400").await.unwrap();
        assert_eq!(hash, "abc123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_classifies_validation_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/tx/submit")
            .with_status(400)
            .with_body("MissingVKeyWitnessesUTXOW")
            .create_async()
            .await;

        let gateway = HttpLedgerGateway::new(server.url(), None);
        let error = gateway.submit_transaction("84a400").await.unwrap_err();
        assert_eq!(error.kind, SubmissionErrorKind::MissingWitnesses);
    }

    #[tokio::test]
    async fn test_submit_classifies_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/tx/submit")
            .with_status(429)
            .with_body("usage limit reached")
            .create_async()
            .await;

        let gateway = HttpLedgerGateway::new(server.url(), None);
        let error = gateway.submit_transaction("84a400").await.unwrap_err();
        assert_eq!(error.kind, SubmissionErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_transaction_info_not_found_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/txs/deadbeef")
            .with_status(404)
            .create_async()
            .await;

        let gateway = HttpLedgerGateway::new(server.url(), None);
        let info = gateway.get_transaction_info("deadbeef").await.unwrap();
        assert!(info.is_none());
    }

    #[tokio::test]
    async fn test_transaction_info_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/txs/deadbeef")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"block_hash":"block-98","block_height":98,"block_time":null}"#)
            .create_async()
            .await;

        let gateway = HttpLedgerGateway::new(server.url(), None);
        let info = gateway.get_transaction_info("deadbeef").await.unwrap();
        assert_eq!(
            info,
            Some(TransactionInfo {
                block_hash: "block-98".to_string(),
                block_height: 98,
                block_time: None,
            })
        );
    }

    #[tokio::test]
    async fn test_tip_height() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/blocks/tip")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"height":100}"#)
            .create_async()
            .await;

        let gateway = HttpLedgerGateway::new(server.url(), None);
        assert_eq!(gateway.get_current_tip_height().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_api_key_header_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/blocks/tip")
            .match_header("api-key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"height":1}"#)
            .create_async()
            .await;

        let gateway = HttpLedgerGateway::new(server.url(), Some("secret".to_string()));
        gateway.get_current_tip_height().await.unwrap();
        mock.assert_async().await;
    }
}
