use crate::parser::BadRequestReason;
use bitcoin::blockdata::constants::ChainHash;
use bitcoin::Network;
use lightning::offers::offer::Offer;
use std::str::FromStr;

/// A BOLT12 offer that decoded successfully. The encoded form is kept; the
/// channel core re-decodes it when actually paying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferDetails {
    pub encoded: String,
}

pub(crate) fn read_offer(input: &str) -> Option<Offer> {
    let input = input.to_lowercase();
    if !input.starts_with("lno1") {
        return None;
    }
    Offer::from_str(&input).ok()
}

pub(crate) fn process_offer(
    offer: &Offer,
    encoded: &str,
    expected_network: Network,
) -> Result<OfferDetails, BadRequestReason> {
    if !offer.supports_chain(ChainHash::using_genesis_block(expected_network)) {
        return Err(BadRequestReason::ChainMismatch {
            expected: expected_network,
        });
    }
    Ok(OfferDetails {
        encoded: encoded.to_string(),
    })
}
