use crate::amount::{Msats, Sats};
use crate::errors::Result;
use crate::fee_estimator::{FeeratePerByte, FeeratePerKw};
use crate::liquidity::ChannelSnapshot;
use async_trait::async_trait;
use bitcoin::ScriptBuf;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,
    #[error("{msg}")]
    Unreachable { msg: String },
}

/// Plain GET transport used for LNURL endpoints, DNS-over-HTTPS lookups and
/// the fee recommendation endpoint. Injected so classification logic can be
/// exercised without a network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &Url) -> std::result::Result<HttpReply, TransportError>;
}

/// Production transport. Every request is bounded by the configured timeout;
/// hitting it surfaces as [`TransportError::Timeout`], never as a pending
/// call.
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        use perro::MapToError;
        let mut headers = HeaderMap::new();
        // Cloudflare's DoH endpoint insists on an explicit dns-json accept.
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, application/dns-json"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_to_permanent_failure("Failed to build the http client")?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> std::result::Result<HttpReply, TransportError> {
        let request = self.client.get(url.clone()).send();
        let response = match tokio::time::timeout(self.timeout, request).await {
            Err(_) => return Err(TransportError::Timeout),
            Ok(Err(e)) => {
                return Err(TransportError::Unreachable { msg: e.to_string() })
            }
            Ok(Ok(response)) => response,
        };
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Unreachable { msg: e.to_string() })?;
        Ok(HttpReply { status, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingPaymentStatus {
    Succeeded,
    Pending,
}

/// Read-only view on the local payment database. Paying the same payment
/// hash twice in parallel can trigger force-closes, so the parser refuses
/// invoices that are already paid or in flight.
pub trait PaymentHistory: Send + Sync {
    fn outgoing_payment_status(&self, payment_hash: &str) -> Option<OutgoingPaymentStatus>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceOutResponse {
    Created { txid: String },
    Failure { reason: String },
}

/// The wallet's channel/peer core, seen from this crate: snapshots for the
/// admission check, splice execution, and local invoice creation for
/// LNURL-withdraw.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    fn channel_snapshot(&self) -> ChannelSnapshot;

    /// Returns `None` when no eligible channel exists to splice from.
    async fn splice_out(
        &self,
        amount: Sats,
        script_pubkey: ScriptBuf,
        feerate: FeeratePerKw,
    ) -> Result<Option<SpliceOutResponse>>;

    async fn create_invoice(&self, amount: Msats, description: String) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutQuote {
    /// Amount that will arrive on-chain after fees.
    pub send_amount: Sats,
    pub swap_fee: Sats,
    pub onchain_fee: Sats,
}

impl SwapOutQuote {
    pub fn total_fee(&self) -> Sats {
        Sats::new(self.swap_fee.sats + self.onchain_fee.sats)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutStatus {
    Accepted { payment_hash: String },
    Rejected { reason: String },
}

/// Cooperative swap provider used to pay on-chain from channel balance.
#[async_trait]
pub trait SwapService: Send + Sync {
    async fn quote_swap_out(&self, amount: Sats, feerate: FeeratePerByte) -> Result<SwapOutQuote>;

    async fn execute_swap_out(
        &self,
        quote: &SwapOutQuote,
        destination_address: &str,
    ) -> Result<SwapOutStatus>;
}
