//! Session lifecycle counters
//!
//! - `session_logins_total` (counter): label `outcome` = `success` | `mismatch` | `malformed` | `error`
//! - `session_refreshes_total` (counter): label `outcome` = `success` | `skipped` | `error`
//! - `session_logouts_total` (counter)
//!
//! Hosts install whichever `metrics` recorder they use; without one these
//! calls are no-ops.

pub fn record_login(outcome: &'static str) {
    metrics::counter!("session_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("session_refreshes_total", "outcome" => outcome).increment(1);
}

pub fn record_logout() {
    metrics::counter!("session_logouts_total").increment(1);
}
