//! Outbound negotiation flows. Each flow owns its own state machine
//! instance; abandoning a flow is simply dropping the value. `execute` is
//! irreversible once sent and therefore only reachable from `ReadyToSend`,
//! with the exact quoted parameters.

pub mod lnurl_withdraw;
pub mod splice_out;
pub mod swap_out;
