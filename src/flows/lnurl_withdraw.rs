use crate::amount::Msats;
use crate::errors::{Error, Result};
use crate::interfaces::ChannelClient;
use crate::lnurl::{LnurlClient, LnurlWithdrawDetails, RemoteFailure};
use log::warn;
use perro::{ensure, invalid_input};
use std::sync::Arc;

#[derive(Debug)]
pub enum LnurlWithdrawState {
    Init,
    Executing { amount_msat: u64 },
    Complete(LnurlWithdrawOutcome),
    Error(LnurlWithdrawError),
}

#[derive(Debug)]
pub enum LnurlWithdrawOutcome {
    /// The service accepted the invoice. The payment itself arrives
    /// asynchronously through the channel core.
    Success { invoice: String },
    Failure { failure: RemoteFailure },
}

#[derive(Debug)]
pub enum LnurlWithdrawError {
    Thrown { error: Error },
}

/// Redeems an LNURL-withdraw: creates a local invoice over the chosen
/// amount and submits it to the service callback. The prepare step is
/// implicit; the decoded min/max bounds act as the quote.
pub struct LnurlWithdraw {
    details: LnurlWithdrawDetails,
    lnurl_client: LnurlClient,
    channel_client: Arc<dyn ChannelClient>,
    state: LnurlWithdrawState,
}

impl LnurlWithdraw {
    pub(crate) fn new(
        details: LnurlWithdrawDetails,
        lnurl_client: LnurlClient,
        channel_client: Arc<dyn ChannelClient>,
    ) -> Self {
        Self {
            details,
            lnurl_client,
            channel_client,
            state: LnurlWithdrawState::Init,
        }
    }

    pub fn details(&self) -> &LnurlWithdrawDetails {
        &self.details
    }

    pub fn state(&self) -> &LnurlWithdrawState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = LnurlWithdrawState::Init;
    }

    /// Runs the withdraw. The amount must be within the bounds advertised
    /// by the service; violating them is caller misuse, not a flow outcome.
    pub async fn execute(&mut self, amount_msat: u64, description: Option<String>) -> Result<()> {
        ensure!(
            matches!(self.state, LnurlWithdrawState::Init),
            invalid_input("A withdraw can only be executed from Init")
        );
        ensure!(
            amount_msat >= self.details.min_withdrawable_msat
                && amount_msat <= self.details.max_withdrawable_msat,
            invalid_input(format!(
                "Withdraw amount out of bounds [{}, {}]",
                self.details.min_withdrawable_msat, self.details.max_withdrawable_msat
            ))
        );

        self.state = LnurlWithdrawState::Executing { amount_msat };
        let description =
            description.unwrap_or_else(|| self.details.default_description.clone());
        let invoice = match self
            .channel_client
            .create_invoice(Msats { msats: amount_msat }, description)
            .await
        {
            Ok(invoice) => invoice,
            Err(e) => {
                self.state = LnurlWithdrawState::Error(LnurlWithdrawError::Thrown { error: e });
                return Ok(());
            }
        };

        match self
            .lnurl_client
            .submit_withdraw_invoice(&self.details, &invoice)
            .await
        {
            Ok(()) => {
                self.state =
                    LnurlWithdrawState::Complete(LnurlWithdrawOutcome::Success { invoice });
            }
            Err(failure) => {
                warn!("Lnurl-withdraw rejected by {}: {failure}", self.details.domain);
                self.state =
                    LnurlWithdrawState::Complete(LnurlWithdrawOutcome::Failure { failure });
            }
        }
        Ok(())
    }
}
