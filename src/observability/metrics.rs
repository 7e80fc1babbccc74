//! Metrics collection.
//!
//! # Metrics
//! - `market_remote_calls_total` (counter): contract calls by method, outcome
//! - `market_inclusions_total` (counter): inclusion waits by outcome
//! - `market_session_transitions_total` (counter): connect/disconnect by kind
//! - `market_stale_responses_total` (counter): results discarded by the stale-session guard
//!
//! Updates are no-ops until a recorder is installed.

use metrics::counter;

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_remote_call(method: &'static str, ok: bool) {
    counter!("market_remote_calls_total", "method" => method, "outcome" => outcome(ok))
        .increment(1);
}

pub fn record_inclusion(ok: bool) {
    counter!("market_inclusions_total", "outcome" => outcome(ok)).increment(1);
}

pub fn record_session_transition(kind: &'static str) {
    counter!("market_session_transitions_total", "kind" => kind).increment(1);
}

pub fn record_stale_response(controller: &'static str) {
    counter!("market_stale_responses_total", "controller" => controller).increment(1);
}
