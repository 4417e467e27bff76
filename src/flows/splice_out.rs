use crate::errors::{Error, Result};
use crate::fee_estimator::{weight2fee, FeeratePerByte, SPLICE_OUT_TX_WEIGHT};
use crate::interfaces::{ChannelClient, SpliceOutResponse};
use bitcoin::{Address, Network};
use log::error;
use perro::{ensure, invalid_input};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug)]
pub enum SpliceOutState {
    Init,
    Preparing {
        amount_sat: u64,
        feerate: FeeratePerByte,
    },
    ReadyToSend {
        amount_sat: u64,
        feerate: FeeratePerByte,
        fee_estimate_sat: u64,
    },
    Executing {
        amount_sat: u64,
        feerate: FeeratePerByte,
    },
    Complete(SpliceOutOutcome),
    Error(SpliceOutError),
}

#[derive(Debug)]
pub enum SpliceOutOutcome {
    Success {
        amount_sat: u64,
        feerate: FeeratePerByte,
        txid: String,
    },
    Failure {
        amount_sat: u64,
        feerate: FeeratePerByte,
        reason: String,
    },
}

#[derive(Debug)]
pub enum SpliceOutError {
    Thrown { error: Error },
    NoChannels,
}

/// Moves channel funds back to an on-chain address via a splice
/// transaction. The fee estimate in `prepare` is purely local; no quote
/// survives a change of amount or feerate.
pub struct SpliceOut {
    channel_client: Arc<dyn ChannelClient>,
    network: Network,
    state: SpliceOutState,
}

impl SpliceOut {
    pub(crate) fn new(channel_client: Arc<dyn ChannelClient>, network: Network) -> Self {
        Self {
            channel_client,
            network,
            state: SpliceOutState::Init,
        }
    }

    pub fn state(&self) -> &SpliceOutState {
        &self.state
    }

    /// Drops any quote and returns to `Init`. Call when the user edits
    /// amount or destination.
    pub fn reset(&mut self) {
        self.state = SpliceOutState::Init;
    }

    /// Estimates the on-chain fee for the given feerate from the splice
    /// transaction weight. Local computation, no network.
    pub fn prepare(&mut self, amount_sat: u64, feerate: FeeratePerByte) -> Result<()> {
        ensure!(
            !matches!(
                self.state,
                SpliceOutState::Preparing { .. }
                    | SpliceOutState::Executing { .. }
                    | SpliceOutState::Complete(_)
            ),
            invalid_input("A splice-out can only be prepared before it is sent")
        );
        self.state = SpliceOutState::Preparing { amount_sat, feerate };
        let fee = weight2fee(feerate.into(), SPLICE_OUT_TX_WEIGHT);
        self.state = SpliceOutState::ReadyToSend {
            amount_sat,
            feerate,
            fee_estimate_sat: fee.sats,
        };
        Ok(())
    }

    /// Performs the splice. Only allowed from `ReadyToSend` and only with
    /// the exact quoted parameters; diverging parameters invalidate the
    /// quote and reset the flow.
    pub async fn execute(
        &mut self,
        amount_sat: u64,
        feerate: FeeratePerByte,
        destination_address: &str,
    ) -> Result<()> {
        let (quoted_amount, quoted_feerate) = match self.state {
            SpliceOutState::ReadyToSend {
                amount_sat,
                feerate,
                ..
            } => (amount_sat, feerate),
            _ => {
                return Err(invalid_input(
                    "A splice-out can only be executed from ReadyToSend",
                ))
            }
        };
        if amount_sat != quoted_amount || feerate != quoted_feerate {
            self.state = SpliceOutState::Init;
            return Err(invalid_input(
                "Amount or feerate changed since the quote, prepare again",
            ));
        }
        let script_pubkey = Address::from_str(destination_address)
            .map_err(|e| invalid_input(format!("Invalid destination address: {e}")))?
            .require_network(self.network)
            .map_err(|e| invalid_input(format!("Destination address on wrong network: {e}")))?
            .script_pubkey();

        self.state = SpliceOutState::Executing { amount_sat, feerate };
        let amount = crate::amount::Sats::new(amount_sat);
        match self
            .channel_client
            .splice_out(amount, script_pubkey, feerate.into())
            .await
        {
            Ok(Some(SpliceOutResponse::Created { txid })) => {
                self.state = SpliceOutState::Complete(SpliceOutOutcome::Success {
                    amount_sat,
                    feerate,
                    txid,
                });
            }
            Ok(Some(SpliceOutResponse::Failure { reason })) => {
                self.state = SpliceOutState::Complete(SpliceOutOutcome::Failure {
                    amount_sat,
                    feerate,
                    reason,
                });
            }
            Ok(None) => {
                self.state = SpliceOutState::Error(SpliceOutError::NoChannels);
            }
            Err(e) => {
                error!("Splice-out failed unexpectedly: {e}");
                self.state = SpliceOutState::Error(SpliceOutError::Thrown { error: e });
            }
        }
        Ok(())
    }
}
