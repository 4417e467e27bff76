mod amount;
mod bip353;
mod bitcoin_uri;
mod config;
mod errors;
mod fee_estimator;
pub mod flows;
mod interfaces;
mod invoice;
mod lightning_address;
mod liquidity;
mod lnurl;
mod logger;
mod offer;
mod parser;
mod sanitize_input;
#[cfg(test)]
pub(crate) mod test_utils;

pub use crate::amount::{AsSats, Msats, Permyriad, Sats};
pub use crate::bitcoin_uri::BitcoinUri;
pub use crate::config::{Config, DEFAULT_REMOTE_REQUEST_TIMEOUT};
pub use crate::errors::{Error, ParseError, Result, RuntimeErrorCode};
pub use crate::fee_estimator::{
    swap_estimation_fee, FeeEstimateSource, FeeRateRecommendations, FeeratePerByte,
    FeeratePerKw, MempoolFeeEstimator,
};
pub use crate::interfaces::{
    ChannelClient, HttpReply, HttpTransport, OutgoingPaymentStatus, PaymentHistory,
    ReqwestTransport, SpliceOutResponse, SwapOutQuote, SwapOutStatus, SwapService,
    TransportError,
};
pub use crate::invoice::InvoiceDetails;
pub use crate::liquidity::{
    evaluate_fee_warning, ChannelSnapshot, ChannelState, FeeWarning, LiquidityPolicy,
};
pub use crate::lnurl::{
    LnurlAuthDetails, LnurlPayDetails, LnurlWithdrawDetails, RemoteFailure,
};
pub use crate::logger::init_logger_once;
pub use crate::offer::OfferDetails;
pub use crate::parser::{BadRequestReason, ParseProgress, ParseResult, Parser};

use crate::flows::lnurl_withdraw::LnurlWithdraw;
use crate::flows::splice_out::SpliceOut;
use crate::flows::swap_out::SwapOut;
use crate::lnurl::LnurlClient;
use std::sync::Arc;

/// Wires the payment core together: the intent parser, the liquidity
/// admission check and the outbound flows, all running against injected
/// collaborators.
pub struct PaymentCore {
    config: Config,
    parser: Parser,
    lnurl_client: LnurlClient,
    channel_client: Arc<dyn ChannelClient>,
    swap_service: Arc<dyn SwapService>,
    fee_estimate_source: Arc<dyn FeeEstimateSource>,
}

impl PaymentCore {
    pub fn new(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        channel_client: Arc<dyn ChannelClient>,
        swap_service: Arc<dyn SwapService>,
        payment_history: Arc<dyn PaymentHistory>,
        fee_estimate_source: Arc<dyn FeeEstimateSource>,
    ) -> Self {
        let parser = Parser::new(config.network, Arc::clone(&transport), payment_history);
        Self {
            config,
            parser,
            lnurl_client: LnurlClient::new(transport),
            channel_client,
            swap_service,
            fee_estimate_source,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// See [`Parser::parse`].
    pub async fn parse(
        &self,
        request: &str,
        progress: impl Fn(ParseProgress),
    ) -> std::result::Result<ParseResult, ParseError> {
        self.parser.parse(request, progress).await
    }

    /// Decides whether receiving the given amount would incur a channel
    /// operation and whether its fee is acceptable under `policy`. Snapshots
    /// channel state and fee tiers at call time.
    pub fn evaluate_receive_fee(
        &self,
        invoice_amount_msat: Option<u64>,
        policy: &LiquidityPolicy,
    ) -> Option<FeeWarning> {
        let snapshot = self.channel_client.channel_snapshot();
        let fee_quote = self
            .fee_estimate_source
            .recommended_fees()
            .map(|fees| swap_estimation_fee(&fees, snapshot.has_no_channels()));
        evaluate_fee_warning(invoice_amount_msat, &snapshot, policy, fee_quote)
    }

    pub fn new_splice_out(&self) -> SpliceOut {
        SpliceOut::new(Arc::clone(&self.channel_client), self.config.network)
    }

    pub fn new_swap_out(&self) -> SwapOut {
        SwapOut::new(
            Arc::clone(&self.swap_service),
            Arc::clone(&self.channel_client),
        )
    }

    pub fn new_lnurl_withdraw(&self, details: LnurlWithdrawDetails) -> LnurlWithdraw {
        LnurlWithdraw::new(
            details,
            self.lnurl_client.clone(),
            Arc::clone(&self.channel_client),
        )
    }
}
