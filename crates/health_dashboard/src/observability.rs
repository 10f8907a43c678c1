//! Counters for authorization outcomes and metric loads.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use health_platform::Metric;

use crate::state::AuthorizationState;

pub const AUTHORIZATION_TOTAL: &str = "health_authorization_total";
pub const METRIC_FETCH_TOTAL: &str = "health_metric_fetch_total";

pub fn record_authorization(outcome: AuthorizationState) {
    metrics::counter!(AUTHORIZATION_TOTAL, "outcome" => outcome_label(outcome)).increment(1);
}

pub fn record_metric_fetch(metric: Metric, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(METRIC_FETCH_TOTAL, "metric" => metric.as_str(), "outcome" => outcome)
        .increment(1);
}

fn outcome_label(state: AuthorizationState) -> &'static str {
    match state {
        AuthorizationState::Unknown => "unknown",
        AuthorizationState::Checking(_) => "checking",
        AuthorizationState::Authorized => "authorized",
        AuthorizationState::Denied => "denied",
        AuthorizationState::Unavailable => "unavailable",
        AuthorizationState::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_terminal_states() {
        assert_eq!(outcome_label(AuthorizationState::Authorized), "authorized");
        assert_eq!(outcome_label(AuthorizationState::Error), "error");
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_authorization(AuthorizationState::Denied);
        record_metric_fetch(Metric::Steps, true);
    }
}
