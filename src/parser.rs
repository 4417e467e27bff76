use crate::bip353::{classify_reply, Bip353Resolution, DnsResolver};
use crate::bitcoin_uri::{self, BitcoinUri, BitcoinUriError};
use crate::errors::ParseError;
use crate::interfaces::{HttpTransport, PaymentHistory};
use crate::invoice::{self, InvoiceDetails};
use crate::lightning_address::{self, EmailLikeAddress};
use crate::lnurl::{
    self, Lnurl, LnurlAuthDetails, LnurlClient, LnurlFetchError, LnurlPayDetails,
    LnurlResponse, LnurlWithdrawDetails, RemoteFailure,
};
use crate::offer::{self, OfferDetails};
use crate::sanitize_input::{self, LIGHTNING_PREFIXES};
use bitcoin::Network;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Coarse progress of a parse call, emitted right before a remote
/// resolution step so the caller can show an intermediate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseProgress {
    LnurlServiceFetch,
    ResolvingBip353,
}

/// Why an input cannot be acted upon. Expected, user-facing conditions;
/// never logged as faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadRequestReason {
    UnknownFormat,
    Expired {
        timestamp: SystemTime,
        expiry: Duration,
    },
    ChainMismatch {
        expected: Network,
    },
    AlreadyPaidInvoice,
    PaymentPending,
    InvalidLnurl,
    UnsupportedLnurl,
    ServiceError {
        origin: String,
        failure: RemoteFailure,
    },
    Bip353NameNotFound {
        username: String,
        domain: String,
    },
    Bip353InvalidUri {
        path: String,
    },
    Bip353InvalidOffer {
        path: String,
    },
    Bip353NoDnssec {
        path: String,
    },
}

/// Classification of one input string. Exactly one variant; immediately
/// actionable ones carry the decoded payment object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    BadRequest {
        request: String,
        reason: BadRequestReason,
    },
    Bolt11Invoice {
        request: String,
        invoice: InvoiceDetails,
    },
    Bolt12Offer {
        offer: OfferDetails,
        lightning_address: Option<String>,
    },
    OnChainUri {
        uri: BitcoinUri,
    },
    LnurlPay {
        details: LnurlPayDetails,
        lightning_address: Option<String>,
    },
    LnurlWithdraw {
        details: LnurlWithdrawDetails,
    },
    LnurlAuth {
        details: LnurlAuthDetails,
    },
}

/// Turns arbitrary scanned/pasted input into a [`ParseResult`].
///
/// Calls are cancellable by superseding: each call takes a ticket from a
/// monotonic counter, and any call that is no longer the latest when one of
/// its remote steps completes returns [`ParseError::Superseded`] instead of
/// delivering a stale result.
pub struct Parser {
    network: Network,
    lnurl_client: LnurlClient,
    dns_resolver: DnsResolver,
    payment_history: Arc<dyn PaymentHistory>,
    generation: AtomicU64,
}

impl Parser {
    pub fn new(
        network: Network,
        transport: Arc<dyn HttpTransport>,
        payment_history: Arc<dyn PaymentHistory>,
    ) -> Self {
        Self {
            network,
            lnurl_client: LnurlClient::new(Arc::clone(&transport)),
            dns_resolver: DnsResolver::new(transport),
            payment_history,
            generation: AtomicU64::new(0),
        }
    }

    pub async fn parse(
        &self,
        request: &str,
        progress: impl Fn(ParseProgress),
    ) -> Result<ParseResult, ParseError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let input = sanitize_input::clean(request);
        debug!("Parsing payment input of {} chars", input.len());

        let lightning_payload =
            sanitize_input::trim_matching_prefix(&input, &LIGHTNING_PREFIXES);
        if let Some(invoice) = invoice::read_bolt11(lightning_payload) {
            return Ok(self.process_bolt11(&invoice));
        }
        if let Some(decoded) = offer::read_offer(lightning_payload) {
            return Ok(self.process_offer(&decoded, lightning_payload, None));
        }
        if let Some(address) = lightning_address::parse_email_like(&input) {
            return self.process_email_like(&input, address, ticket, &progress).await;
        }
        if let Some(lnurl) = lnurl::read_lnurl(&input) {
            return self.process_lnurl(&input, lnurl, None, ticket, &progress).await;
        }
        match bitcoin_uri::parse(self.network, &input) {
            Ok(uri) => Ok(self.process_bitcoin_uri(&input, uri)),
            Err(BitcoinUriError::ChainMismatch) => Ok(bad_request(
                &input,
                BadRequestReason::ChainMismatch {
                    expected: self.network,
                },
            )),
            Err(_) => Ok(bad_request(&input, BadRequestReason::UnknownFormat)),
        }
    }

    /// Fails with [`ParseError::Superseded`] when a newer parse call has
    /// started; the pending result is dropped, never delivered.
    fn ensure_latest(&self, ticket: u64) -> Result<(), ParseError> {
        if self.generation.load(Ordering::SeqCst) == ticket {
            Ok(())
        } else {
            debug!("Discarding result of superseded parse call");
            Err(ParseError::Superseded)
        }
    }

    fn process_bolt11(&self, invoice: &lightning_invoice::Bolt11Invoice) -> ParseResult {
        let details = invoice::details_from(invoice);
        match invoice::check_invoice(
            invoice,
            self.network,
            self.payment_history.as_ref(),
            SystemTime::now(),
        ) {
            Some(reason) => bad_request(&details.bolt11, reason),
            None => ParseResult::Bolt11Invoice {
                request: details.bolt11.clone(),
                invoice: details,
            },
        }
    }

    fn process_offer(
        &self,
        decoded: &lightning::offers::offer::Offer,
        encoded: &str,
        lightning_address: Option<String>,
    ) -> ParseResult {
        match offer::process_offer(decoded, encoded, self.network) {
            Ok(offer) => ParseResult::Bolt12Offer {
                offer,
                lightning_address,
            },
            Err(reason) => bad_request(encoded, reason),
        }
    }

    async fn process_email_like(
        &self,
        request: &str,
        address: EmailLikeAddress,
        ticket: u64,
        progress: &impl Fn(ParseProgress),
    ) -> Result<ParseResult, ParseError> {
        progress(ParseProgress::ResolvingBip353);
        let dns_name =
            crate::bip353::bip353_dns_name(address.username(), address.domain());
        let reply = self
            .dns_resolver
            .lookup_txt(&dns_name)
            .await
            .map_err(|e| ParseError::Network { msg: e.to_string() })?;
        self.ensure_latest(ticket)?;

        let resolution =
            classify_reply(self.network, address.username(), address.domain(), &reply);
        match (resolution, &address) {
            (Bip353Resolution::Offer(offer), _) => Ok(ParseResult::Bolt12Offer {
                offer,
                lightning_address: Some(address.display()),
            }),
            (Bip353Resolution::Failed(reason), _) => Ok(bad_request(request, reason)),
            (Bip353Resolution::NotFound, EmailLikeAddress::Bip353 { username, domain }) => {
                Ok(bad_request(
                    request,
                    BadRequestReason::Bip353NameNotFound {
                        username: username.clone(),
                        domain: domain.clone(),
                    },
                ))
            }
            (Bip353Resolution::NotFound, EmailLikeAddress::Unknown { username, domain }) => {
                // No DNS record; fall back to the lightning-address protocol.
                let url = match lightning_address::well_known_lnurlp_url(username, domain) {
                    Some(url) => url,
                    None => return Ok(bad_request(request, BadRequestReason::InvalidLnurl)),
                };
                self.process_lnurl(
                    request,
                    Lnurl::Request(url),
                    Some(address.display()),
                    ticket,
                    progress,
                )
                .await
            }
        }
    }

    async fn process_lnurl(
        &self,
        request: &str,
        lnurl: Lnurl,
        lightning_address: Option<String>,
        ticket: u64,
        progress: &impl Fn(ParseProgress),
    ) -> Result<ParseResult, ParseError> {
        let url = match lnurl {
            Lnurl::Auth(details) => return Ok(ParseResult::LnurlAuth { details }),
            Lnurl::Request(url) => url,
        };
        progress(ParseProgress::LnurlServiceFetch);
        let outcome = self.lnurl_client.fetch_endpoint(&url).await;
        self.ensure_latest(ticket)?;
        let result = match outcome {
            Ok(LnurlResponse::Pay(details)) => ParseResult::LnurlPay {
                details,
                lightning_address,
            },
            Ok(LnurlResponse::Withdraw(details)) => {
                ParseResult::LnurlWithdraw { details }
            }
            Err(LnurlFetchError::Remote(failure)) => bad_request(
                request,
                BadRequestReason::ServiceError {
                    origin: lnurl::origin_of(&url),
                    failure,
                },
            ),
            Err(LnurlFetchError::Unsupported) => {
                bad_request(request, BadRequestReason::UnsupportedLnurl)
            }
            Err(LnurlFetchError::Invalid) => {
                bad_request(request, BadRequestReason::InvalidLnurl)
            }
        };
        Ok(result)
    }

    fn process_bitcoin_uri(&self, request: &str, uri: BitcoinUri) -> ParseResult {
        if !uri.address.is_empty() {
            return ParseResult::OnChainUri { uri };
        }
        if let Some(invoice) = uri.bolt11 {
            return ParseResult::Bolt11Invoice {
                request: invoice.bolt11.clone(),
                invoice,
            };
        }
        if let Some(offer) = uri.offer {
            return ParseResult::Bolt12Offer {
                offer,
                lightning_address: None,
            };
        }
        bad_request(request, BadRequestReason::UnknownFormat)
    }
}

fn bad_request(request: &str, reason: BadRequestReason) -> ParseResult {
    ParseResult::BadRequest {
        request: request.to_string(),
        reason,
    }
}
