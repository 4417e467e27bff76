use crate::amount::Sats;
use crate::errors::{Error, Result};
use crate::fee_estimator::FeeratePerByte;
use crate::interfaces::{ChannelClient, SwapOutQuote, SwapOutStatus, SwapService};
use log::error;
use perro::{ensure, invalid_input};
use std::sync::Arc;

#[derive(Debug)]
pub enum SwapOutState {
    Init,
    Preparing {
        amount_sat: u64,
        feerate: FeeratePerByte,
    },
    ReadyToSend {
        amount_sat: u64,
        feerate: FeeratePerByte,
        quote: SwapOutQuote,
    },
    Executing {
        amount_sat: u64,
        feerate: FeeratePerByte,
    },
    Complete(SwapOutOutcome),
    Error(SwapOutError),
}

#[derive(Debug)]
pub enum SwapOutOutcome {
    Success {
        amount_sat: u64,
        payment_hash: String,
    },
    Failure {
        amount_sat: u64,
        reason: String,
    },
}

#[derive(Debug)]
pub enum SwapOutError {
    Thrown { error: Error },
    NoChannels,
}

/// Pays on-chain from channel balance through a cooperative swap service.
/// Unlike splice-out, the quote is a remote call: the service commits to
/// its fee before the user confirms.
pub struct SwapOut {
    swap_service: Arc<dyn SwapService>,
    channel_client: Arc<dyn ChannelClient>,
    state: SwapOutState,
}

impl SwapOut {
    pub(crate) fn new(
        swap_service: Arc<dyn SwapService>,
        channel_client: Arc<dyn ChannelClient>,
    ) -> Self {
        Self {
            swap_service,
            channel_client,
            state: SwapOutState::Init,
        }
    }

    pub fn state(&self) -> &SwapOutState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = SwapOutState::Init;
    }

    /// Requests a fee quote from the swap service.
    pub async fn prepare(&mut self, amount_sat: u64, feerate: FeeratePerByte) -> Result<()> {
        ensure!(
            !matches!(
                self.state,
                SwapOutState::Preparing { .. }
                    | SwapOutState::Executing { .. }
                    | SwapOutState::Complete(_)
            ),
            invalid_input("A swap-out can only be prepared before it is sent")
        );
        self.state = SwapOutState::Preparing { amount_sat, feerate };
        match self
            .swap_service
            .quote_swap_out(Sats::new(amount_sat), feerate)
            .await
        {
            Ok(quote) => {
                self.state = SwapOutState::ReadyToSend {
                    amount_sat,
                    feerate,
                    quote,
                };
            }
            Err(e) => {
                error!("Swap-out quote failed: {e}");
                self.state = SwapOutState::Error(SwapOutError::Thrown { error: e });
            }
        }
        Ok(())
    }

    /// Executes the quoted swap. Only allowed from `ReadyToSend`, with the
    /// exact quoted parameters.
    pub async fn execute(
        &mut self,
        amount_sat: u64,
        feerate: FeeratePerByte,
        destination_address: &str,
    ) -> Result<()> {
        let (quoted_amount, quoted_feerate, quote) = match &self.state {
            SwapOutState::ReadyToSend {
                amount_sat,
                feerate,
                quote,
            } => (*amount_sat, *feerate, quote.clone()),
            _ => {
                return Err(invalid_input(
                    "A swap-out can only be executed from ReadyToSend",
                ))
            }
        };
        if amount_sat != quoted_amount || feerate != quoted_feerate {
            self.state = SwapOutState::Init;
            return Err(invalid_input(
                "Amount or feerate changed since the quote, prepare again",
            ));
        }
        if self.channel_client.channel_snapshot().has_no_channels() {
            self.state = SwapOutState::Error(SwapOutError::NoChannels);
            return Ok(());
        }

        self.state = SwapOutState::Executing { amount_sat, feerate };
        match self
            .swap_service
            .execute_swap_out(&quote, destination_address)
            .await
        {
            Ok(SwapOutStatus::Accepted { payment_hash }) => {
                self.state = SwapOutState::Complete(SwapOutOutcome::Success {
                    amount_sat,
                    payment_hash,
                });
            }
            Ok(SwapOutStatus::Rejected { reason }) => {
                self.state = SwapOutState::Complete(SwapOutOutcome::Failure {
                    amount_sat,
                    reason,
                });
            }
            Err(e) => {
                error!("Swap-out execution failed unexpectedly: {e}");
                self.state = SwapOutState::Error(SwapOutError::Thrown { error: e });
            }
        }
        Ok(())
    }
}
