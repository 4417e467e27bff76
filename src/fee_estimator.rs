use crate::amount::Sats;
use crate::errors::{Result, RuntimeErrorCode};
use crate::interfaces::HttpTransport;
use log::debug;
use perro::MapToError;
use reqwest::Url;
use serde::Deserialize;
use std::sync::{Arc, Mutex};

/// Weight of the funding transaction needed to open a fresh channel for an
/// incoming payment (shared input/output plus a wallet input and change).
const FUNDING_TX_WEIGHT: u64 = 992;
/// Weight of a splice adding liquidity to an existing channel.
const SPLICE_TX_WEIGHT: u64 = 610;
/// Weight of a splice-out paying to a single external output.
pub(crate) const SPLICE_OUT_TX_WEIGHT: u64 = 722;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeratePerByte(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeratePerKw(pub u64);

impl From<FeeratePerByte> for FeeratePerKw {
    fn from(feerate: FeeratePerByte) -> Self {
        // 1 vbyte = 4 weight units, feerates per 1000 weight units.
        FeeratePerKw(feerate.0 * 250)
    }
}

pub(crate) fn weight2fee(feerate: FeeratePerKw, weight: u64) -> Sats {
    Sats::new(feerate.0 * weight / 1000)
}

/// Current recommendation tiers in sat/vByte, as served by a
/// mempool.space-style `/api/v1/fees/recommended` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRateRecommendations {
    pub fastest_fee: u64,
    pub half_hour_fee: u64,
    pub hour_fee: u64,
    pub economy_fee: u64,
    pub minimum_fee: u64,
}

/// Supplies the latest known fee-rate recommendations. Reading never blocks
/// on the network; `None` means no estimate has been fetched yet.
pub trait FeeEstimateSource: Send + Sync {
    fn recommended_fees(&self) -> Option<FeeRateRecommendations>;
}

/// Estimated fee of the channel operation required to receive a payment that
/// does not fit into the current inbound liquidity.
pub fn swap_estimation_fee(fees: &FeeRateRecommendations, has_no_channels: bool) -> Sats {
    let feerate = FeeratePerKw::from(FeeratePerByte(fees.half_hour_fee));
    let weight = if has_no_channels {
        FUNDING_TX_WEIGHT
    } else {
        SPLICE_TX_WEIGHT
    };
    weight2fee(feerate, weight)
}

/// [`FeeEstimateSource`] backed by an HTTP recommendation endpoint. The
/// embedder decides the polling cadence by calling [`refresh`](Self::refresh);
/// readers always get the last successfully fetched tiers.
pub struct MempoolFeeEstimator {
    transport: Arc<dyn HttpTransport>,
    url: Url,
    cached: Mutex<Option<FeeRateRecommendations>>,
}

impl MempoolFeeEstimator {
    pub fn new(transport: Arc<dyn HttpTransport>, url: Url) -> Self {
        Self {
            transport,
            url,
            cached: Mutex::new(None),
        }
    }

    pub async fn refresh(&self) -> Result<()> {
        let reply = self.transport.get(&self.url).await.map_to_runtime_error(
            RuntimeErrorCode::FeeEstimateServiceUnavailable,
            "Failed to fetch fee recommendations",
        )?;
        let fees: FeeRateRecommendations =
            serde_json::from_str(&reply.body).map_to_runtime_error(
                RuntimeErrorCode::FeeEstimateServiceUnavailable,
                "Fee recommendation endpoint returned unexpected data",
            )?;
        debug!(
            "Fetched fee recommendations: fastest {} halfHour {} hour {} sat/vB",
            fees.fastest_fee, fees.half_hour_fee, fees.hour_fee
        );
        *self.cached.lock().unwrap() = Some(fees);
        Ok(())
    }
}

impl FeeEstimateSource for MempoolFeeEstimator {
    fn recommended_fees(&self) -> Option<FeeRateRecommendations> {
        self.cached.lock().unwrap().clone()
    }
}
