use crate::interfaces::{
    HttpReply, HttpTransport, OutgoingPaymentStatus, PaymentHistory, TransportError,
};
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// First two invoice examples of BOLT 11 (with payment secret), signed by
/// the well-known spec test node. Created 2017-06-01, long expired by now;
/// classification tests pin `now` close to the creation timestamp instead.
pub(crate) const BOLT11_MAINNET_DONATION: &str = "lnbc1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdpl2pkx2ctnv5sxxmmwwd5kgetjypeh2ursdae8g6twvus8g6rfwvs8qun0dfjkxaq9qrsgq357wnc5r2ueh7ck6q93dj32dlqnls087fxdwk8qakdyafkq3yap9us6v52vjjsrvywa6rt52cm9r9zqt8r2t7mlcwspyetp5h2tztugp9lfyql";
pub(crate) const BOLT11_MAINNET_2500U: &str = "lnbc2500u1pvjluezsp5zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zyg3zygspp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfqypqdq5xysxxatsyp3k7enxv4jsxqzpu9qrsgquk0rl77nj30yxdy8j9vdx85fkpmdla2087ne0xh8nhedh8w27kyke0lp53ut353s06fv3qfegext0eh0ymjpf39tuven09sam30g4vgpfna3rh";
pub(crate) const BOLT11_TIMESTAMP: u64 = 1496314658;
pub(crate) const BOLT11_PAYMENT_HASH: &str =
    "0001020304050607080900010203040506070809000102030405060708090102";

/// Offer published on bolt12.org, mainnet.
pub(crate) const BOLT12_OFFER: &str =
    "lno1pgx9getnwss8vetrw3hhyuckyypwa3eyt44h6txtxquqh7lz5djge4afgfjn7k4rgrkuag0jsd5xvxg";

pub(crate) struct NoHistory;

impl PaymentHistory for NoHistory {
    fn outgoing_payment_status(&self, _payment_hash: &str) -> Option<OutgoingPaymentStatus> {
        None
    }
}

pub(crate) fn no_history() -> NoHistory {
    NoHistory
}

pub(crate) struct FixedHistory {
    payment_hash: String,
    status: OutgoingPaymentStatus,
}

impl PaymentHistory for FixedHistory {
    fn outgoing_payment_status(&self, payment_hash: &str) -> Option<OutgoingPaymentStatus> {
        (payment_hash == self.payment_hash).then_some(self.status)
    }
}

pub(crate) fn history_with(payment_hash: &str, status: OutgoingPaymentStatus) -> FixedHistory {
    FixedHistory {
        payment_hash: payment_hash.to_string(),
        status,
    }
}

/// Transport stub serving canned replies per URL (matched on the URL string
/// prefix), with an optional artificial delay to exercise cancellation.
pub(crate) struct CannedTransport {
    replies: Mutex<HashMap<String, Result<HttpReply, String>>>,
    delay: Option<Duration>,
}

impl CannedTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            delay: None,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            delay: Some(delay),
        }
    }

    pub fn reply(self, url_prefix: &str, status: u16, body: &str) -> Self {
        self.replies.lock().unwrap().insert(
            url_prefix.to_string(),
            Ok(HttpReply {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn unreachable(self, url_prefix: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url_prefix.to_string(), Err("connection refused".to_string()));
        self
    }
}

#[async_trait]
impl HttpTransport for CannedTransport {
    async fn get(&self, url: &Url) -> Result<HttpReply, TransportError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let url = url.to_string();
        let replies = self.replies.lock().unwrap();
        let canned = replies
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());
        match canned {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(msg)) => Err(TransportError::Unreachable { msg }),
            None => Err(TransportError::Unreachable {
                msg: format!("no canned reply for {url}"),
            }),
        }
    }
}
