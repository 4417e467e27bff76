use crate::interfaces::{HttpReply, HttpTransport};
use crate::sanitize_input::{
    trim_matching_prefix, BITCOIN_PREFIXES, LIGHTNING_PREFIXES, LNURL_PREFIXES,
};
use log::{debug, info};
use perro::ensure;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;

/// A remote LNURL service misbehaved. The origin host is always carried so
/// the user can judge whom to trust.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteFailure {
    #[error("Service {origin} replied with HTTP status {code}")]
    Code { origin: String, code: u16 },
    #[error("Service {origin} reported an error: {reason}")]
    Detailed { origin: String, reason: String },
    #[error("Service {origin} replied with an unreadable payload")]
    Unreadable { origin: String },
    #[error("Could not connect to {origin}")]
    CouldNotConnect { origin: String },
}

/// LNURL-pay parameters as returned by the service (LUD-06).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LnurlPayDetails {
    pub callback: Url,
    pub min_sendable_msat: u64,
    pub max_sendable_msat: u64,
    pub short_description: String,
    pub long_description: Option<String>,
    pub max_comment_length: Option<u64>,
    /// Host the request was scanned from, shown when asking for payment
    /// input.
    pub domain: String,
}

/// LNURL-withdraw parameters as returned by the service (LUD-03).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LnurlWithdrawDetails {
    pub callback: Url,
    pub k1: String,
    pub default_description: String,
    pub min_withdrawable_msat: u64,
    pub max_withdrawable_msat: u64,
    pub domain: String,
}

/// LNURL-auth challenge (LUD-04). Never fetched automatically; signing is
/// an explicit user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LnurlAuthDetails {
    pub url: Url,
    pub k1: String,
    pub domain: String,
}

/// Outcome of local LNURL extraction, before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lnurl {
    Auth(LnurlAuthDetails),
    /// Must be fetched to learn what the service actually offers.
    Request(Url),
}

pub(crate) fn origin_of(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_string()
}

fn is_acceptable_scheme(url: &Url) -> bool {
    url.scheme() == "https"
        || (url.scheme() == "http"
            && url.host_str().map_or(false, |host| host.ends_with(".onion")))
}

fn decode_bech32_lnurl(input: &str) -> Option<Url> {
    let (hrp, payload) = bech32::decode(input).ok()?;
    if !hrp.as_str().eq_ignore_ascii_case("lnurl") {
        return None;
    }
    let url = Url::parse(&String::from_utf8(payload).ok()?).ok()?;
    is_acceptable_scheme(&url).then_some(url)
}

const LUD17_SCHEMES: [&str; 6] = [
    "lnurlp://", "lnurlp:", "lnurlw://", "lnurlw:", "keyauth://", "keyauth:",
];

/// LUD-17 lnurls use custom schemes in place of https.
fn decode_lud17_lnurl(input: &str) -> Option<Url> {
    let stripped = trim_matching_prefix(input, &LUD17_SCHEMES);
    if stripped.len() == input.len() {
        return None;
    }
    let scheme = if stripped
        .split('/')
        .next()
        .map_or(false, |host| host.ends_with(".onion"))
    {
        "http"
    } else {
        "https"
    };
    Url::parse(&format!("{scheme}://{stripped}")).ok()
}

fn decode_plain_url(input: &str) -> Option<Url> {
    let url = Url::parse(input).ok()?;
    if let Some(fallback) = url
        .query_pairs()
        .find(|(key, _)| key == "lightning")
        .map(|(_, value)| value.to_string())
    {
        // An embedded bech32 lnurl takes priority over the wrapping url.
        if let Some(fallback_url) = decode_bech32_lnurl(&fallback) {
            return Some(fallback_url);
        }
    }
    is_acceptable_scheme(&url).then_some(url)
}

/// Extracts an LNURL from raw input: bech32, LUD-17 scheme, or a plain
/// https url (optionally wrapping a bech32 fallback in its `lightning`
/// parameter). Returns `None` when the input is no LNURL at all.
pub(crate) fn read_lnurl(input: &str) -> Option<Lnurl> {
    let input = trim_matching_prefix(input, &LIGHTNING_PREFIXES);
    let input = trim_matching_prefix(input, &BITCOIN_PREFIXES);
    let input = trim_matching_prefix(input, &LNURL_PREFIXES);

    let url = decode_bech32_lnurl(input)
        .or_else(|| decode_lud17_lnurl(input))
        .or_else(|| decode_plain_url(input))?;

    let tag = url
        .query_pairs()
        .find(|(key, _)| key == "tag")
        .map(|(_, value)| value.to_string());
    if tag.as_deref() == Some("login") {
        let k1 = url
            .query_pairs()
            .find(|(key, _)| key == "k1")
            .map(|(_, value)| value.to_string())?;
        // LUD-04 requires a 32 byte hex challenge.
        if hex::decode(&k1).map_or(true, |k1| k1.len() != 32) {
            info!("Discarding lnurl-auth with malformed k1");
            return None;
        }
        let domain = origin_of(&url);
        return Some(Lnurl::Auth(LnurlAuthDetails { url, k1, domain }));
    }
    Some(Lnurl::Request(url))
}

/// What a fetched LNURL endpoint turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LnurlResponse {
    Pay(LnurlPayDetails),
    Withdraw(LnurlWithdrawDetails),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LnurlFetchError {
    Remote(RemoteFailure),
    /// The service answered with a tag this wallet does not handle.
    Unsupported,
    /// The reply was readable JSON but not a valid LNURL response.
    Invalid,
}

/// LUD-01: HTTP status codes and headers carry no meaning, only the JSON
/// body does. A body that is no JSON, or reports `status: error`, is
/// classified against the origin host.
fn process_reply(origin: &str, reply: &HttpReply) -> Result<Value, RemoteFailure> {
    let json: Value = match serde_json::from_str(&reply.body) {
        Ok(json) => json,
        Err(_) => {
            return Err(RemoteFailure::Unreadable {
                origin: origin.to_string(),
            })
        }
    };
    let is_error = json
        .get("status")
        .and_then(Value::as_str)
        .map_or(false, |status| status.trim().eq_ignore_ascii_case("error"));
    if is_error {
        let reason = json
            .get("reason")
            .and_then(Value::as_str)
            .map(|reason| reason.trim().chars().take(90).filter(|c| *c != '<').collect())
            .unwrap_or_else(String::new);
        if !reason.is_empty() {
            return Err(RemoteFailure::Detailed {
                origin: origin.to_string(),
                reason,
            });
        }
        if !(200..300).contains(&reply.status) {
            return Err(RemoteFailure::Code {
                origin: origin.to_string(),
                code: reply.status,
            });
        }
        return Err(RemoteFailure::Unreadable {
            origin: origin.to_string(),
        });
    }
    Ok(json)
}

/// LUD-06 metadata is a JSON-encoded array of `[mime, content]` pairs.
fn parse_pay_metadata(metadata: &str) -> Result<(String, Option<String>), String> {
    let entries: Vec<Value> =
        serde_json::from_str(metadata).map_err(|e| format!("Invalid metadata JSON: {e}"))?;
    let mut short_description = String::new();
    let mut long_description = None;
    for entry in entries {
        let (key, value) = match (entry.get(0).and_then(Value::as_str), entry.get(1)) {
            (Some(key), Some(value)) => (key, value),
            _ => continue,
        };
        match key {
            "text/plain" => {
                short_description = value.as_str().unwrap_or_default().to_string()
            }
            "text/long-desc" => {
                long_description = value.as_str().map(str::to_string)
            }
            _ => (),
        }
    }
    ensure!(
        !short_description.is_empty(),
        "Metadata missing short description".to_string()
    );
    Ok((short_description, long_description))
}

fn msat_field(json: &Value, field: &str) -> Option<u64> {
    match json.get(field) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64)),
        _ => None,
    }
}

fn parse_lnurl_json(requested_url: &Url, json: &Value) -> Result<LnurlResponse, LnurlFetchError> {
    let domain = origin_of(requested_url);
    let callback = json
        .get("callback")
        .and_then(Value::as_str)
        .and_then(|callback| Url::parse(callback).ok())
        .filter(is_acceptable_scheme)
        .ok_or(LnurlFetchError::Invalid)?;
    let tag = json
        .get("tag")
        .and_then(Value::as_str)
        .ok_or(LnurlFetchError::Invalid)?;
    match tag {
        "withdrawRequest" => {
            let k1 = json
                .get("k1")
                .and_then(Value::as_str)
                .filter(|k1| !k1.is_empty())
                .ok_or(LnurlFetchError::Invalid)?;
            let min = msat_field(json, "minWithdrawable").unwrap_or(0);
            let max = msat_field(json, "maxWithdrawable").unwrap_or(min);
            Ok(LnurlResponse::Withdraw(LnurlWithdrawDetails {
                callback,
                k1: k1.to_string(),
                default_description: json
                    .get("defaultDescription")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                min_withdrawable_msat: min.min(max),
                max_withdrawable_msat: max,
                domain,
            }))
        }
        "payRequest" => {
            let min = msat_field(json, "minSendable")
                .filter(|min| *min > 0)
                .ok_or(LnurlFetchError::Invalid)?;
            let max = msat_field(json, "maxSendable").map_or(min, |max| max.max(min));
            let metadata = json
                .get("metadata")
                .and_then(Value::as_str)
                .ok_or(LnurlFetchError::Invalid)?;
            let (short_description, long_description) =
                parse_pay_metadata(metadata).map_err(|e| {
                    debug!("Rejecting lnurl-pay response: {e}");
                    LnurlFetchError::Invalid
                })?;
            Ok(LnurlResponse::Pay(LnurlPayDetails {
                callback,
                min_sendable_msat: min,
                max_sendable_msat: max,
                short_description,
                long_description,
                max_comment_length: json
                    .get("commentAllowed")
                    .and_then(Value::as_u64)
                    .filter(|len| *len > 0),
                domain,
            }))
        }
        tag => {
            debug!("Lnurl service answered with unhandled tag {tag}");
            Err(LnurlFetchError::Unsupported)
        }
    }
}

/// Talks to LNURL services through the injected transport. All transport
/// failures become [`RemoteFailure::CouldNotConnect`] carrying the host.
#[derive(Clone)]
pub(crate) struct LnurlClient {
    transport: Arc<dyn HttpTransport>,
}

impl LnurlClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn fetch_endpoint(&self, url: &Url) -> Result<LnurlResponse, LnurlFetchError> {
        let origin = origin_of(url);
        debug!("Fetching lnurl endpoint at {origin}");
        let reply = self.transport.get(url).await.map_err(|e| {
            info!("Lnurl endpoint {origin} unreachable: {e}");
            LnurlFetchError::Remote(RemoteFailure::CouldNotConnect {
                origin: origin.clone(),
            })
        })?;
        let json = process_reply(&origin, &reply).map_err(LnurlFetchError::Remote)?;
        parse_lnurl_json(url, &json)
    }

    /// LUD-03 second step: hand the freshly created invoice to the service.
    pub async fn submit_withdraw_invoice(
        &self,
        withdraw: &LnurlWithdrawDetails,
        invoice: &str,
    ) -> Result<(), RemoteFailure> {
        let mut callback = withdraw.callback.clone();
        callback
            .query_pairs_mut()
            .append_pair("k1", &withdraw.k1)
            .append_pair("pr", invoice);
        let origin = origin_of(&callback);
        let reply = self.transport.get(&callback).await.map_err(|e| {
            info!("Lnurl withdraw callback {origin} unreachable: {e}");
            RemoteFailure::CouldNotConnect {
                origin: origin.clone(),
            }
        })?;
        process_reply(&origin, &reply)?;
        Ok(())
    }
}
