use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RuntimeErrorCode {
    NodeUnavailable,
    SwapServiceUnavailable,
    FeeEstimateServiceUnavailable,
    DnsServiceUnavailable,
}

impl Display for RuntimeErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type Error = perro::Error<RuntimeErrorCode>;
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of [`Parser::parse`](crate::Parser::parse) that are not part of
/// the classification result itself.
///
/// Malformed or stale *input* never produces a [`ParseError`], it produces a
/// `ParseResult::BadRequest`. A [`ParseError`] means the call as such did not
/// deliver a result.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A newer parse call was started before this one resolved. The stale
    /// result has been discarded and will never be delivered.
    #[error("Parse call was superseded by a newer one")]
    Superseded,
    /// The resolution step could not reach the network at all.
    #[error("Network unavailable: {msg}")]
    Network { msg: String },
}
