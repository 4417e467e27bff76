use bitcoin::Network;
use std::time::Duration;

/// How long a remote LNURL or DNS call may take before it is reported as
/// [`RemoteFailure::CouldNotConnect`](crate::lnurl::RemoteFailure) instead of
/// staying pending.
pub const DEFAULT_REMOTE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Config {
    pub network: Network,
    /// Timeout applied to every outbound LNURL/DNS request. Forwarded to
    /// [`ReqwestTransport`](crate::ReqwestTransport) when constructing the
    /// default transport.
    pub remote_request_timeout: Duration,
}

impl Config {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            remote_request_timeout: DEFAULT_REMOTE_REQUEST_TIMEOUT,
        }
    }
}
