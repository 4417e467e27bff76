use crate::amount::{AsSats, Msats, Permyriad, Sats};

/// User-chosen rule governing how much fee the wallet may spend on inbound
/// channel operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquidityPolicy {
    /// Never pay for inbound liquidity. Payments that do not fit are
    /// expected to fail.
    Disabled,
    Auto {
        max_absolute_fee_sat: u64,
        max_relative_fee_basis_points: u32,
        /// When set, only the relative ceiling is enforced.
        skip_absolute_fee_check: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    pub is_usable: bool,
    pub is_terminated: bool,
    pub receivable_msat: u64,
    /// Whether the channel peer sells additional inbound liquidity.
    pub supports_liquidity_ads: bool,
}

/// Immutable view of the channel set at evaluation time. Produced by the
/// channel client; never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelSnapshot {
    pub peer_connected: bool,
    pub channels: Vec<ChannelState>,
}

impl ChannelSnapshot {
    pub fn available_for_receive(&self) -> Msats {
        let msats = self
            .channels
            .iter()
            .filter(|c| c.is_usable && !c.is_terminated)
            .map(|c| c.receivable_msat)
            .sum();
        Msats { msats }
    }

    pub fn has_no_channels(&self) -> bool {
        !self.channels.iter().any(|c| !c.is_terminated)
    }

    pub fn can_request_liquidity(&self) -> bool {
        self.channels
            .iter()
            .any(|c| !c.is_terminated && c.supports_liquidity_ads)
    }
}

/// Verdict of the admission check. `None` from
/// [`evaluate_fee_warning`] means the payment fits into the current
/// liquidity and needs no warning at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeWarning {
    /// The policy is disabled and liquidity is insufficient: the payment
    /// will fail. Takes precedence over every other verdict.
    LiquidityDisabled,
    OverAbsoluteFee {
        can_request_liquidity: bool,
        max_absolute_fee_sat: u64,
        quoted_fee_sat: u64,
    },
    OverRelativeFee {
        can_request_liquidity: bool,
        max_relative_fee_basis_points: u32,
        quoted_fee_sat: u64,
    },
    FeeExpected {
        quoted_fee_sat: u64,
    },
    UnknownFeeExpected,
}

impl FeeWarning {
    /// Display value of the relative ceiling, e.g. `5.0` for 500 bps.
    pub fn max_fee_percent(&self) -> Option<f64> {
        match self {
            FeeWarning::OverRelativeFee {
                max_relative_fee_basis_points,
                ..
            } => Some(Permyriad(*max_relative_fee_basis_points).to_percentage()),
            _ => None,
        }
    }
}

/// Decides whether receiving `invoice_amount_msat` (or an amountless
/// invoice, `None`) needs a channel operation and whether its fee is
/// acceptable under `policy`.
///
/// Checks are ordered; the first match wins. A fee breaching both ceilings
/// reports the absolute one: that limit is the user's hard stop.
pub fn evaluate_fee_warning(
    invoice_amount_msat: Option<u64>,
    snapshot: &ChannelSnapshot,
    policy: &LiquidityPolicy,
    fee_quote: Option<Sats>,
) -> Option<FeeWarning> {
    if !snapshot.peer_connected {
        return None;
    }

    let available_msat = snapshot.available_for_receive().msats;
    let has_no_liquidity = available_msat == 0;
    let liquidity_is_short =
        invoice_amount_msat.map_or(false, |amount| amount >= available_msat);
    if !has_no_liquidity && !liquidity_is_short {
        return None;
    }

    let (max_absolute_fee_sat, max_relative_fee_basis_points, skip_absolute_fee_check) =
        match *policy {
            LiquidityPolicy::Disabled => return Some(FeeWarning::LiquidityDisabled),
            LiquidityPolicy::Auto {
                max_absolute_fee_sat,
                max_relative_fee_basis_points,
                skip_absolute_fee_check,
            } => (
                max_absolute_fee_sat,
                max_relative_fee_basis_points,
                skip_absolute_fee_check,
            ),
        };

    let quoted_fee = match fee_quote {
        None => return Some(FeeWarning::UnknownFeeExpected),
        Some(fee) => fee,
    };
    let can_request_liquidity = snapshot.can_request_liquidity();

    if !skip_absolute_fee_check && quoted_fee.sats > max_absolute_fee_sat {
        return Some(FeeWarning::OverAbsoluteFee {
            can_request_liquidity,
            max_absolute_fee_sat,
            quoted_fee_sat: quoted_fee.sats,
        });
    }

    // The relative ceiling is only consulted when the amount strictly
    // exceeds the receivable balance; `amount == available` falls through
    // to FeeExpected.
    // TODO: clarify with product whether the relative ceiling should also
    // apply at exact equality before merging the two conditions.
    if let Some(amount_msat) = invoice_amount_msat {
        let threshold = Permyriad(max_relative_fee_basis_points).of(&amount_msat.as_msats());
        if amount_msat > 0 && amount_msat > available_msat && quoted_fee.msats > threshold.msats
        {
            return Some(FeeWarning::OverRelativeFee {
                can_request_liquidity,
                max_relative_fee_basis_points,
                quoted_fee_sat: quoted_fee.sats,
            });
        }
    }

    Some(FeeWarning::FeeExpected {
        quoted_fee_sat: quoted_fee.sats,
    })
}
