use crate::sanitize_input::{
    trim_matching_prefix, BITCOIN_PREFIXES, LIGHTNING_PREFIXES, LNURL_PREFIXES,
};
use nom::bytes::complete::take_while1;
use nom::character::complete::char as nom_char;
use nom::multi::separated_list1;
use nom::{IResult, Parser as NomParser};
use reqwest::Url;

/// A human-readable `user@domain` payment handle. The `₿` prefix commits the
/// sender to BIP-353 resolution; without it the resolution method is decided
/// by what the domain actually serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EmailLikeAddress {
    Bip353 { username: String, domain: String },
    Unknown { username: String, domain: String },
}

impl EmailLikeAddress {
    pub fn username(&self) -> &str {
        match self {
            EmailLikeAddress::Bip353 { username, .. }
            | EmailLikeAddress::Unknown { username, .. } => username,
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            EmailLikeAddress::Bip353 { domain, .. }
            | EmailLikeAddress::Unknown { domain, .. } => domain,
        }
    }

    /// `user@domain` as shown to the user and stored with the payment.
    pub fn display(&self) -> String {
        format!("{}@{}", self.username(), self.domain())
    }
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+')
}

fn is_label_char(c: char) -> bool {
    // Internationalized labels are allowed as-is; the resolver punycodes.
    c.is_ascii_alphanumeric() || c == '-' || !c.is_ascii()
}

fn label(s: &str) -> IResult<&str, &str> {
    take_while1(is_label_char)(s)
}

/// `example.com`-shaped domain: at least two dot-separated labels, no label
/// with leading/trailing hyphens, alphabetic top-level label of length >= 2.
fn domain(s: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(nom_char('.'), label).parse(s)
}

fn is_valid_label(label: &str) -> bool {
    !label.starts_with('-') && !label.ends_with('-')
}

fn is_valid_top_level_domain(label: &str) -> bool {
    label.chars().count() >= 2
        && label.chars().all(|c| c.is_ascii_alphabetic() || !c.is_ascii())
}

fn is_valid_domain(input: &str) -> bool {
    match domain(input) {
        Ok(("", labels)) => {
            labels.len() >= 2
                && labels.iter().all(|l| is_valid_label(l))
                && labels.last().map_or(false, |l| is_valid_top_level_domain(l))
        }
        _ => false,
    }
}

/// Classifies input shaped like an email address. Returns `None` for
/// anything else so the caller can try the next format.
pub(crate) fn parse_email_like(input: &str) -> Option<EmailLikeAddress> {
    if !input.contains('@') {
        return None;
    }
    let token = trim_matching_prefix(input, &BITCOIN_PREFIXES);
    let token = trim_matching_prefix(token, &LIGHTNING_PREFIXES);
    let token = trim_matching_prefix(token, &LNURL_PREFIXES);

    let (username, domain) = token.split_once('@')?;
    // The Bitcoin currency sign is often url-encoded by QR generators.
    let username = username
        .to_lowercase()
        .replace("%e2%82%bf", "₿");
    let domain = domain.to_string();
    if domain.is_empty() || !is_valid_domain(&domain) {
        return None;
    }

    if let Some(stripped) = username.strip_prefix('₿') {
        let stripped = stripped.trim_start_matches('₿');
        if stripped.is_empty() || !stripped.chars().all(is_username_char) {
            return None;
        }
        return Some(EmailLikeAddress::Bip353 {
            username: stripped.to_string(),
            domain,
        });
    }
    if username.is_empty() || !username.chars().all(is_username_char) {
        return None;
    }
    Some(EmailLikeAddress::Unknown { username, domain })
}

/// LUD-16 endpoint for a lightning address.
pub(crate) fn well_known_lnurlp_url(username: &str, domain: &str) -> Option<Url> {
    Url::parse(&format!("https://{domain}/.well-known/lnurlp/{username}")).ok()
}
