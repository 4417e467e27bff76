/// Prefixes are matched with starts_with, longest first, so that a shorter
/// prefix never swallows part of a longer one.
pub(crate) const LIGHTNING_PREFIXES: [&str; 2] = ["lightning://", "lightning:"];
pub(crate) const BITCOIN_PREFIXES: [&str; 2] = ["bitcoin://", "bitcoin:"];
pub(crate) const LNURL_PREFIXES: [&str; 2] = ["lnurl://", "lnurl:"];

/// Reduces scanned or pasted input to the payload line: the first non-blank
/// line, with non-breaking spaces removed and surrounding whitespace trimmed.
pub(crate) fn clean(input: &str) -> String {
    input
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
        .replace('\u{00A0}', "")
        .trim()
        .to_string()
}

/// Removes the first matching prefix, if any. Matching is case-insensitive
/// because QR codes frequently upper-case the scheme (LIGHTNING:LNURL1...).
pub(crate) fn trim_matching_prefix<'a>(input: &'a str, prefixes: &[&str]) -> &'a str {
    for prefix in prefixes {
        if input.len() >= prefix.len() && input[..prefix.len()].eq_ignore_ascii_case(prefix) {
            return &input[prefix.len()..];
        }
    }
    input
}
