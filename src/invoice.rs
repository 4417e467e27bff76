use crate::interfaces::{OutgoingPaymentStatus, PaymentHistory};
use crate::parser::BadRequestReason;
use bitcoin::Network;
use lightning_invoice::{Bolt11Invoice, Bolt11InvoiceDescription, Currency};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Decoded BOLT11 surface handed to callers. Plain data, no invoice
/// internals leak out of this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDetails {
    pub bolt11: String,
    pub amount_msat: Option<u64>,
    pub description: String,
    pub payment_hash: String,
    pub payee_pub_key: String,
    pub creation_timestamp: SystemTime,
    pub expiry_interval: Duration,
}

/// Attempts to read the input as a BOLT11 invoice. Malformed input is not an
/// error, it just isn't an invoice. QR codes tend to shout, so an
/// all-uppercase rendition is retried in lowercase.
pub(crate) fn read_bolt11(input: &str) -> Option<Bolt11Invoice> {
    Bolt11Invoice::from_str(input)
        .or_else(|_| Bolt11Invoice::from_str(&input.to_lowercase()))
        .ok()
}

pub(crate) fn details_from(invoice: &Bolt11Invoice) -> InvoiceDetails {
    let description = match invoice.description() {
        Bolt11InvoiceDescription::Direct(description) => description.to_string(),
        Bolt11InvoiceDescription::Hash(_) => String::new(),
    };
    let payee_pub_key = match invoice.payee_pub_key() {
        Some(payee_pub_key) => payee_pub_key.to_string(),
        None => invoice.recover_payee_pub_key().to_string(),
    };
    InvoiceDetails {
        bolt11: invoice.to_string(),
        amount_msat: invoice.amount_milli_satoshis(),
        description,
        payment_hash: invoice.payment_hash().to_string(),
        payee_pub_key,
        creation_timestamp: invoice.timestamp(),
        expiry_interval: invoice.expiry_time(),
    }
}

pub(crate) fn network_of(invoice: &Bolt11Invoice) -> Network {
    match invoice.currency() {
        Currency::Bitcoin => Network::Bitcoin,
        Currency::BitcoinTestnet => Network::Testnet,
        Currency::Regtest => Network::Regtest,
        Currency::Signet => Network::Signet,
        // Closest match for simnet invoices.
        Currency::Simnet => Network::Signet,
    }
}

/// Inspects a decoded invoice for conditions that make it unpayable.
/// Checked in order: wrong chain, expiry, local payment history. Paying a
/// payment hash that is already paid or in flight can trigger force-closes.
pub(crate) fn check_invoice(
    invoice: &Bolt11Invoice,
    expected_network: Network,
    history: &dyn PaymentHistory,
    now: SystemTime,
) -> Option<BadRequestReason> {
    if network_of(invoice) != expected_network {
        return Some(BadRequestReason::ChainMismatch {
            expected: expected_network,
        });
    }

    let now_since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    if invoice.would_expire(now_since_epoch) {
        return Some(BadRequestReason::Expired {
            timestamp: invoice.timestamp(),
            expiry: invoice.expiry_time(),
        });
    }

    match history.outgoing_payment_status(&invoice.payment_hash().to_string()) {
        Some(OutgoingPaymentStatus::Succeeded) => Some(BadRequestReason::AlreadyPaidInvoice),
        Some(OutgoingPaymentStatus::Pending) => Some(BadRequestReason::PaymentPending),
        None => None,
    }
}
