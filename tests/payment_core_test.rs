use async_trait::async_trait;
use bitcoin::{Network, ScriptBuf};
use glint::flows::splice_out::{SpliceOutOutcome, SpliceOutState};
use glint::{
    evaluate_fee_warning, BadRequestReason, ChannelClient, ChannelSnapshot, ChannelState,
    Config, FeeEstimateSource, FeeRateRecommendations, FeeWarning, FeeratePerByte,
    FeeratePerKw, HttpReply, HttpTransport, LiquidityPolicy, Msats, OutgoingPaymentStatus,
    ParseResult, PaymentCore, PaymentHistory, Result, Sats, SpliceOutResponse, SwapOutQuote,
    SwapOutStatus, SwapService, TransportError,
};
use reqwest::Url;
use std::sync::Arc;

const BOLT11_MAINNET_2500U: &str = "lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpu9qrsgquk0rl77nj30yxdy8j9vdx85fkpmdla2087ne0xh8nhedh8w27kyke0lp53ut353s06fv3qfegext0eh0ymjpf39tuven09sam30g4vgpfna3rh";

struct PayEndpointTransport;

#[async_trait]
impl HttpTransport for PayEndpointTransport {
    async fn get(&self, url: &Url) -> std::result::Result<HttpReply, TransportError> {
        if url.as_str().starts_with("https://acinq.co/.well-known/lnurlp/") {
            return Ok(HttpReply {
                status: 200,
                body: r#"{
                    "tag": "payRequest",
                    "callback": "https://acinq.co/pay/cb",
                    "minSendable": 1000,
                    "maxSendable": 500000000,
                    "metadata": "[[\"text/plain\",\"tip\"]]"
                }"#
                .to_string(),
            });
        }
        if url.as_str().starts_with("https://dns.google/")
            || url.as_str().starts_with("https://cloudflare-dns.com/")
        {
            return Ok(HttpReply {
                status: 200,
                body: r#"{"Status": 3}"#.to_string(),
            });
        }
        Err(TransportError::Unreachable {
            msg: "unexpected call".to_string(),
        })
    }
}

struct ChannelClientStub {
    snapshot: ChannelSnapshot,
}

#[async_trait]
impl ChannelClient for ChannelClientStub {
    fn channel_snapshot(&self) -> ChannelSnapshot {
        self.snapshot.clone()
    }

    async fn splice_out(
        &self,
        _amount: Sats,
        _script_pubkey: ScriptBuf,
        _feerate: FeeratePerKw,
    ) -> Result<Option<SpliceOutResponse>> {
        Ok(Some(SpliceOutResponse::Created {
            txid: "deadbeef".to_string(),
        }))
    }

    async fn create_invoice(&self, _amount: Msats, _description: String) -> Result<String> {
        Ok("lnbc1fake".to_string())
    }
}

struct SwapServiceStub;

#[async_trait]
impl SwapService for SwapServiceStub {
    async fn quote_swap_out(&self, amount: Sats, _feerate: FeeratePerByte) -> Result<SwapOutQuote> {
        Ok(SwapOutQuote {
            send_amount: Sats::new(amount.sats - 1_000),
            swap_fee: Sats::new(600),
            onchain_fee: Sats::new(400),
        })
    }

    async fn execute_swap_out(
        &self,
        _quote: &SwapOutQuote,
        _destination_address: &str,
    ) -> Result<SwapOutStatus> {
        Ok(SwapOutStatus::Accepted {
            payment_hash: "hash".to_string(),
        })
    }
}

struct NoHistory;

impl PaymentHistory for NoHistory {
    fn outgoing_payment_status(&self, _payment_hash: &str) -> Option<OutgoingPaymentStatus> {
        None
    }
}

struct FixedFees(Option<FeeRateRecommendations>);

impl FeeEstimateSource for FixedFees {
    fn recommended_fees(&self) -> Option<FeeRateRecommendations> {
        self.0.clone()
    }
}

fn snapshot(receivable_msat: u64) -> ChannelSnapshot {
    ChannelSnapshot {
        peer_connected: true,
        channels: vec![ChannelState {
            is_usable: true,
            is_terminated: false,
            receivable_msat,
            supports_liquidity_ads: true,
        }],
    }
}

fn core_with(snapshot: ChannelSnapshot, fees: Option<FeeRateRecommendations>) -> PaymentCore {
    PaymentCore::new(
        Config::new(Network::Bitcoin),
        Arc::new(PayEndpointTransport),
        Arc::new(ChannelClientStub { snapshot }),
        Arc::new(SwapServiceStub),
        Arc::new(NoHistory),
        Arc::new(FixedFees(fees)),
    )
}

#[tokio::test]
async fn classifies_invoices_and_addresses_through_the_facade() {
    let core = core_with(snapshot(0), None);

    match core.parse(BOLT11_MAINNET_2500U, |_| ()).await.unwrap() {
        ParseResult::BadRequest {
            reason: BadRequestReason::Expired { .. },
            ..
        } => (),
        other => panic!("expected expired invoice, got {other:?}"),
    }

    match core.parse("satoshi@acinq.co", |_| ()).await.unwrap() {
        ParseResult::LnurlPay {
            details,
            lightning_address,
        } => {
            assert_eq!(details.short_description, "tip");
            assert_eq!(lightning_address.as_deref(), Some("satoshi@acinq.co"));
        }
        other => panic!("expected lnurl-pay, got {other:?}"),
    }
}

#[tokio::test]
async fn receive_fee_evaluation_uses_snapshots() {
    let fees = FeeRateRecommendations {
        fastest_fee: 40,
        half_hour_fee: 20,
        hour_fee: 10,
        economy_fee: 5,
        minimum_fee: 1,
    };
    let policy = LiquidityPolicy::Auto {
        max_absolute_fee_sat: 5_000,
        max_relative_fee_basis_points: 500,
        skip_absolute_fee_check: false,
    };

    // Plenty of liquidity: no warning.
    let core = core_with(snapshot(100_000_000), Some(fees.clone()));
    assert_eq!(core.evaluate_receive_fee(Some(10_000_000), &policy), None);

    // No liquidity, known fee within bounds: the fee is announced.
    let core = core_with(snapshot(0), Some(fees));
    match core.evaluate_receive_fee(Some(100_000_000), &policy) {
        Some(FeeWarning::FeeExpected { quoted_fee_sat }) => assert!(quoted_fee_sat > 0),
        other => panic!("expected FeeExpected, got {other:?}"),
    }

    // No fee estimate available yet.
    let core = core_with(snapshot(0), None);
    assert_eq!(
        core.evaluate_receive_fee(Some(100_000_000), &policy),
        Some(FeeWarning::UnknownFeeExpected)
    );

    // Disabled policy with an empty wallet: the payment will fail.
    let core = core_with(snapshot(0), None);
    assert_eq!(
        core.evaluate_receive_fee(Some(100_000_000), &LiquidityPolicy::Disabled),
        Some(FeeWarning::LiquidityDisabled)
    );
}

#[test]
fn admission_control_tie_break_is_stable() {
    // Both ceilings breached; the absolute one must win.
    let policy = LiquidityPolicy::Auto {
        max_absolute_fee_sat: 5_000,
        max_relative_fee_basis_points: 500,
        skip_absolute_fee_check: false,
    };
    let warning = evaluate_fee_warning(
        Some(10_000_000),
        &snapshot(0),
        &policy,
        Some(Sats::new(6_000)),
    );
    assert!(matches!(warning, Some(FeeWarning::OverAbsoluteFee { .. })));
}

#[tokio::test]
async fn splice_out_flow_through_the_facade() {
    let core = core_with(snapshot(0), None);
    let mut flow = core.new_splice_out();
    flow.prepare(250_000, FeeratePerByte(20)).unwrap();

    // Executing with diverged parameters is refused and voids the quote.
    assert!(flow
        .execute(
            300_000,
            FeeratePerByte(20),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        )
        .await
        .is_err());
    assert!(matches!(flow.state(), SpliceOutState::Init));

    flow.prepare(250_000, FeeratePerByte(20)).unwrap();
    flow.execute(
        250_000,
        FeeratePerByte(20),
        "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
    )
    .await
    .unwrap();
    match flow.state() {
        SpliceOutState::Complete(SpliceOutOutcome::Success { txid, .. }) => {
            assert_eq!(txid, "deadbeef");
        }
        other => panic!("expected success, got {other:?}"),
    }
}
