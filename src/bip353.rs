use crate::bitcoin_uri::{self, BitcoinUriError};
use crate::interfaces::{HttpTransport, TransportError};
use crate::offer::OfferDetails;
use crate::parser::BadRequestReason;
use bitcoin::Network;
use log::debug;
use rand::seq::SliceRandom;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;

/// Public DNS-over-HTTPS resolvers answering in the Google JSON format.
const DOH_ENDPOINTS: [&str; 2] = [
    "https://dns.google/resolve",
    "https://cloudflare-dns.com/dns-query",
];

const TXT_RECORD_TYPE: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct DohReply {
    #[serde(rename = "Status")]
    pub status: u32,
    /// DNSSEC authenticated-data flag. Offers from unauthenticated zones
    /// must not be paid.
    #[serde(rename = "AD", default)]
    pub authenticated: bool,
    #[serde(rename = "Answer", default)]
    pub answers: Vec<DohRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct DohRecord {
    pub name: String,
    #[serde(default, rename = "type")]
    pub record_type: u32,
    pub data: String,
}

pub(crate) fn bip353_dns_name(username: &str, domain: &str) -> String {
    format!("{username}.user._bitcoin-payment.{domain}.")
}

pub(crate) struct DnsResolver {
    transport: Arc<dyn HttpTransport>,
}

impl DnsResolver {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn lookup_txt(&self, fqdn: &str) -> Result<DohReply, TransportError> {
        let endpoint = DOH_ENDPOINTS
            .choose(&mut rand::thread_rng())
            .expect("endpoint list is not empty");
        let url = Url::parse_with_params(endpoint, &[("name", fqdn), ("type", "txt")])
            .map_err(|e| TransportError::Unreachable { msg: e.to_string() })?;
        let reply = self.transport.get(&url).await?;
        serde_json::from_str(&reply.body)
            .map_err(|e| TransportError::Unreachable { msg: e.to_string() })
    }
}

/// TXT strings longer than 255 bytes arrive as multiple quoted chunks.
fn unquote_txt_data(data: &str) -> String {
    data.replace("\" \"", "").trim_matches('"').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Bip353Resolution {
    Offer(OfferDetails),
    /// The name does not exist, or the zone serves no payment instruction.
    NotFound,
    Failed(BadRequestReason),
}

/// Classifies a DNS answer for `<username>.user._bitcoin-payment.<domain>.`
/// into a payable offer or a typed failure.
pub(crate) fn classify_reply(
    network: Network,
    username: &str,
    domain: &str,
    reply: &DohReply,
) -> Bip353Resolution {
    let dns_name = bip353_dns_name(username, domain);
    if reply.status != 0 || reply.answers.is_empty() {
        debug!("No usable dns answer for {dns_name}");
        return Bip353Resolution::NotFound;
    }
    if !reply.authenticated {
        return Bip353Resolution::Failed(BadRequestReason::Bip353NoDnssec {
            path: dns_name,
        });
    }
    let record = match reply
        .answers
        .iter()
        .find(|record| record.record_type == TXT_RECORD_TYPE && record.name == dns_name)
    {
        Some(record) => record,
        None => {
            return Bip353Resolution::Failed(BadRequestReason::Bip353NameNotFound {
                username: username.to_string(),
                domain: domain.to_string(),
            })
        }
    };

    let uri = unquote_txt_data(&record.data);
    match bitcoin_uri::parse(network, &uri) {
        Err(BitcoinUriError::ChainMismatch) => Bip353Resolution::Failed(
            BadRequestReason::ChainMismatch { expected: network },
        ),
        Err(_) => Bip353Resolution::Failed(BadRequestReason::Bip353InvalidUri {
            path: dns_name,
        }),
        Ok(uri) => match uri.offer {
            Some(offer) => Bip353Resolution::Offer(offer),
            None => Bip353Resolution::Failed(BadRequestReason::Bip353InvalidOffer {
                path: dns_name,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::BOLT12_OFFER;

    fn reply_with(name: &str, data: &str, authenticated: bool) -> DohReply {
        DohReply {
            status: 0,
            authenticated,
            answers: vec![DohRecord {
                name: name.to_string(),
                record_type: TXT_RECORD_TYPE,
                data: data.to_string(),
            }],
        }
    }

    #[test]
    fn builds_the_dns_name() {
        assert_eq!(
            bip353_dns_name("satoshi", "acinq.co"),
            "satoshi.user._bitcoin-payment.acinq.co."
        );
    }

    #[test]
    fn parses_the_google_answer_format() {
        let body = r#"{
            "Status": 0,
            "AD": true,
            "Answer": [
                {"name": "a.user._bitcoin-payment.b.co.", "type": 16, "TTL": 300, "data": "\"bitcoin:?lno=lno1abc\""}
            ]
        }"#;
        let reply: DohReply = serde_json::from_str(body).unwrap();
        assert!(reply.authenticated);
        assert_eq!(reply.answers.len(), 1);
    }

    #[test]
    fn missing_answers_mean_not_found() {
        let reply = DohReply {
            status: 3,
            authenticated: false,
            answers: Vec::new(),
        };
        assert_eq!(
            classify_reply(Network::Bitcoin, "satoshi", "acinq.co", &reply),
            Bip353Resolution::NotFound
        );
    }

    #[test]
    fn unauthenticated_answers_are_refused() {
        let name = bip353_dns_name("satoshi", "acinq.co");
        let reply = reply_with(&name, &format!("\"bitcoin:?lno={BOLT12_OFFER}\""), false);
        assert_eq!(
            classify_reply(Network::Bitcoin, "satoshi", "acinq.co", &reply),
            Bip353Resolution::Failed(BadRequestReason::Bip353NoDnssec { path: name })
        );
    }

    #[test]
    fn name_mismatch_is_not_found() {
        let reply = reply_with(
            "someoneelse.user._bitcoin-payment.acinq.co.",
            "\"bitcoin:?lno=lno1abc\"",
            true,
        );
        assert_eq!(
            classify_reply(Network::Bitcoin, "satoshi", "acinq.co", &reply),
            Bip353Resolution::Failed(BadRequestReason::Bip353NameNotFound {
                username: "satoshi".to_string(),
                domain: "acinq.co".to_string()
            })
        );
    }

    #[test]
    fn resolves_an_offer() {
        let name = bip353_dns_name("satoshi", "acinq.co");
        let reply = reply_with(&name, &format!("\"bitcoin:?lno={BOLT12_OFFER}\""), true);
        assert_eq!(
            classify_reply(Network::Bitcoin, "satoshi", "acinq.co", &reply),
            Bip353Resolution::Offer(OfferDetails {
                encoded: BOLT12_OFFER.to_string()
            })
        );
    }

    #[test]
    fn chunked_txt_data_is_reassembled() {
        assert_eq!(
            unquote_txt_data("\"bitcoin:?lno=lno1ab\" \"cdef\""),
            "bitcoin:?lno=lno1abcdef"
        );
        assert_eq!(unquote_txt_data("\"plain\""), "plain");
        assert_eq!(unquote_txt_data("noquotes"), "noquotes");
    }

    #[test]
    fn records_without_offer_are_invalid() {
        let name = bip353_dns_name("satoshi", "acinq.co");
        let reply = reply_with(&name, "\"bitcoin:?amount=1\"", true);
        assert_eq!(
            classify_reply(Network::Bitcoin, "satoshi", "acinq.co", &reply),
            Bip353Resolution::Failed(BadRequestReason::Bip353InvalidOffer { path: name })
        );
        let name = bip353_dns_name("satoshi", "acinq.co");
        let reply = reply_with(&name, "\"https://not-a-bitcoin-uri\"", true);
        assert_eq!(
            classify_reply(Network::Bitcoin, "satoshi", "acinq.co", &reply),
            Bip353Resolution::Failed(BadRequestReason::Bip353InvalidUri { path: name })
        );
    }
}
