use crate::invoice::{self, InvoiceDetails};
use crate::offer::{self, OfferDetails};
use crate::sanitize_input::{trim_matching_prefix, BITCOIN_PREFIXES};
use bitcoin::{Address, Network};
use log::debug;
use reqwest::Url;
use std::str::FromStr;

const MAX_AMOUNT_SAT: u64 = 2_100_000_000_000_000;

/// A BIP-21 payment URI (or bare address). The address has been validated
/// against the configured network. Embedded lightning payloads are carried
/// along so the caller can prefer them over the on-chain fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitcoinUri {
    /// Empty when the URI carries only a lightning payload (as BIP-353
    /// records do).
    pub address: String,
    pub amount_sat: Option<u64>,
    pub label: Option<String>,
    pub message: Option<String>,
    pub bolt11: Option<InvoiceDetails>,
    pub offer: Option<OfferDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BitcoinUriError {
    InvalidUri,
    InvalidAddress,
    ChainMismatch,
    /// The URI carries `req-` parameters this wallet does not understand;
    /// BIP-21 forbids proceeding in that case.
    UnhandledRequiredParams,
}

/// Parses a BIP-21 URI or bare address. The input may or may not carry a
/// `bitcoin:` scheme prefix.
pub(crate) fn parse(
    expected_network: Network,
    input: &str,
) -> Result<BitcoinUri, BitcoinUriError> {
    let trimmed = trim_matching_prefix(input, &BITCOIN_PREFIXES);
    let had_scheme = trimmed.len() != input.len();
    if !had_scheme && trimmed.contains(':') {
        // Some other scheme entirely.
        return Err(BitcoinUriError::InvalidUri);
    }

    let (address_part, query) = match trimmed.split_once('?') {
        Some((address_part, query)) => (address_part, Some(query)),
        None => (trimmed, None),
    };

    let address = if address_part.is_empty() {
        String::new()
    } else {
        let unchecked =
            Address::from_str(address_part).map_err(|_| BitcoinUriError::InvalidAddress)?;
        let address = unchecked
            .require_network(expected_network)
            .map_err(|_| BitcoinUriError::ChainMismatch)?;
        address.to_string()
    };

    let mut uri = BitcoinUri {
        address,
        amount_sat: None,
        label: None,
        message: None,
        bolt11: None,
        offer: None,
    };
    let query = match query {
        Some(query) => query,
        None => return Ok(uri),
    };

    // Reuse the url crate's query decoding by re-assembling a parseable URI.
    let url = Url::parse(&format!("bitcoin:{address_part}?{query}"))
        .map_err(|_| BitcoinUriError::InvalidUri)?;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "amount" => uri.amount_sat = parse_amount_btc(&value),
            "label" => uri.label = Some(value.to_string()),
            "message" => uri.message = Some(value.to_string()),
            "lightning" => {
                if let Some(invoice) = invoice::read_bolt11(&value) {
                    if invoice::network_of(&invoice) == expected_network {
                        uri.bolt11 = Some(invoice::details_from(&invoice));
                    } else if uri.address.is_empty() {
                        return Err(BitcoinUriError::ChainMismatch);
                    } else {
                        debug!("Ignoring lightning fallback for another network");
                    }
                }
            }
            "lno" => {
                if let Some(offer) = offer::read_offer(&value) {
                    match offer::process_offer(&offer, &value, expected_network) {
                        Ok(details) => uri.offer = Some(details),
                        Err(_) if uri.address.is_empty() => {
                            return Err(BitcoinUriError::ChainMismatch)
                        }
                        Err(_) => debug!("Ignoring offer for another network"),
                    }
                }
            }
            key if key.starts_with("req-") => {
                return Err(BitcoinUriError::UnhandledRequiredParams)
            }
            _ => (),
        }
    }
    Ok(uri)
}

/// Exact decimal-BTC to sat conversion. The fractional part is padded or cut
/// to 8 digits; no floating point is involved.
fn parse_amount_btc(value: &str) -> Option<u64> {
    let value = value.trim();
    let (btc_part, sat_part) = match value.split_once('.') {
        Some((btc, frac)) => {
            let mut frac = frac.to_string();
            frac.truncate(8);
            (btc, format!("{frac:0<8}"))
        }
        None => (value, "00000000".to_string()),
    };
    let amount = format!("{btc_part}{sat_part}").parse::<u64>().ok()?;
    (amount > 0 && amount <= MAX_AMOUNT_SAT).then_some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    // First P2WPKH example of BIP 173.
    const MAINNET_ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
    const TESTNET_ADDRESS: &str = "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx";

    #[test]
    fn parses_a_bare_address() {
        let uri = parse(Network::Bitcoin, MAINNET_ADDRESS).unwrap();
        assert_eq!(uri.address, MAINNET_ADDRESS);
        assert_eq!(uri.amount_sat, None);
    }

    #[test]
    fn parses_a_full_uri() {
        let input =
            format!("bitcoin:{MAINNET_ADDRESS}?amount=0.001&label=pool%20table&message=thanks");
        let uri = parse(Network::Bitcoin, &input).unwrap();
        assert_eq!(uri.address, MAINNET_ADDRESS);
        assert_eq!(uri.amount_sat, Some(100_000));
        assert_eq!(uri.label.as_deref(), Some("pool table"));
        assert_eq!(uri.message.as_deref(), Some("thanks"));
    }

    #[test]
    fn detects_chain_mismatch() {
        assert_eq!(
            parse(Network::Bitcoin, TESTNET_ADDRESS),
            Err(BitcoinUriError::ChainMismatch)
        );
        assert_eq!(
            parse(Network::Testnet, MAINNET_ADDRESS),
            Err(BitcoinUriError::ChainMismatch)
        );
    }

    #[test]
    fn rejects_unknown_required_params() {
        let input = format!("bitcoin:{MAINNET_ADDRESS}?req-somethingyoudontunderstand=50");
        assert_eq!(
            parse(Network::Bitcoin, &input),
            Err(BitcoinUriError::UnhandledRequiredParams)
        );
    }

    #[test]
    fn rejects_foreign_schemes_and_garbage() {
        assert_eq!(
            parse(Network::Bitcoin, "https://example.com"),
            Err(BitcoinUriError::InvalidUri)
        );
        assert_eq!(
            parse(Network::Bitcoin, "not an address"),
            Err(BitcoinUriError::InvalidAddress)
        );
    }

    #[test]
    fn amount_math_is_exact() {
        assert_eq!(parse_amount_btc("1"), Some(100_000_000));
        assert_eq!(parse_amount_btc("0.00000001"), Some(1));
        assert_eq!(parse_amount_btc("0.001"), Some(100_000));
        assert_eq!(parse_amount_btc("20999999.9769"), Some(2_099_999_997_690_000));
        // Sub-sat precision is cut, not rounded.
        assert_eq!(parse_amount_btc("0.000000019"), Some(1));
        assert_eq!(parse_amount_btc("0"), None);
        assert_eq!(parse_amount_btc("x"), None);
        assert_eq!(parse_amount_btc("22000000"), None);
    }

    #[test]
    fn carries_an_embedded_offer() {
        let input = format!(
            "bitcoin:?lno={}",
            crate::test_utils::BOLT12_OFFER
        );
        let uri = parse(Network::Bitcoin, &input).unwrap();
        assert!(uri.address.is_empty());
        assert_eq!(
            uri.offer.unwrap().encoded,
            crate::test_utils::BOLT12_OFFER
        );
    }
}
