use chrono::NaiveDate;
use health_platform::Metric;
use serde::Serialize;
use tokio::sync::{broadcast, watch};

/// Buffered notices per subscriber before the oldest are dropped.
const NOTICE_CAPACITY: usize = 32;

/// Step of the authorization flow currently awaiting the platform.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationPhase {
    Availability,
    ExistingGrant,
    Requesting,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "state", content = "phase")]
pub enum AuthorizationState {
    #[default]
    Unknown,
    Checking(AuthorizationPhase),
    Authorized,
    Denied,
    Unavailable,
    Error,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub value: f64,
}

/// Normalized seven-day view of one metric.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct MetricSnapshot {
    pub total: f64,
    pub series: Vec<DailyAggregate>,
    pub raw_payload: String,
}

impl MetricSnapshot {
    /// Builds a snapshot whose total is the sum of `series`.
    pub fn from_series(series: Vec<DailyAggregate>, raw_payload: String) -> Self {
        let total = series.iter().map(|d| d.value).sum();
        Self {
            total,
            series,
            raw_payload,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.raw_payload.is_empty() && self.total == 0.0
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct MetricSnapshots {
    pub steps: MetricSnapshot,
    pub distance: MetricSnapshot,
    pub heart_rate: MetricSnapshot,
    pub calories: MetricSnapshot,
}

impl MetricSnapshots {
    pub fn get(&self, metric: Metric) -> &MetricSnapshot {
        match metric {
            Metric::Steps => &self.steps,
            Metric::Distance => &self.distance,
            Metric::HeartRate => &self.heart_rate,
            Metric::Calories => &self.calories,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut MetricSnapshot {
        match metric {
            Metric::Steps => &mut self.steps,
            Metric::Distance => &mut self.distance,
            Metric::HeartRate => &mut self.heart_rate,
            Metric::Calories => &mut self.calories,
        }
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct DashboardState {
    pub authorized: bool,
    pub authorization: AuthorizationState,
    pub error: Option<String>,
    pub metrics: MetricSnapshots,
}

impl DashboardState {
    pub fn snapshot(&self, metric: Metric) -> &MetricSnapshot {
        self.metrics.get(metric)
    }

    pub(crate) fn set_authorization(&mut self, state: AuthorizationState) {
        self.authorization = state;
        self.authorized = state == AuthorizationState::Authorized;
    }
}

/// User-facing event; rendering is left to the presentation layer.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Notice {
    Unavailable,
    Authorized { freshly_granted: bool },
    AuthorizationDenied,
    AuthorizationFailed { detail: String },
    RemediationOpened,
    RemediationFailed { detail: String },
    MetricFetchFailed { metric: Metric, detail: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Unavailable => {
                f.write_str("Google Fit / Apple Health / Health Connect not available.")
            }
            Notice::Authorized {
                freshly_granted: false,
            } => f.write_str(
                "Already authorized. Loading step, distance, heart rate and calories data...",
            ),
            Notice::Authorized {
                freshly_granted: true,
            } => f.write_str(
                "Permission granted. Loading step, distance, heart rate and calories data...",
            ),
            Notice::AuthorizationDenied => f.write_str("Authorization denied by user."),
            Notice::AuthorizationFailed { detail } => {
                write!(f, "Error during health access: {detail}")
            }
            Notice::RemediationOpened => f.write_str("Opened Health Connect in Play Store."),
            Notice::RemediationFailed { detail } => {
                write!(f, "Failed to open Play Store: {detail}")
            }
            Notice::MetricFetchFailed { metric, detail } => {
                write!(f, "Failed to load {} data: {detail}", metric.label())
            }
        }
    }
}

/// Shared write side of the dashboard: the state channel and the notice feed.
///
/// Cloning is cheap; all clones publish to the same subscribers.
#[derive(Clone)]
pub struct StateHandle {
    state: watch::Sender<DashboardState>,
    notices: broadcast::Sender<Notice>,
}

impl Default for StateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHandle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { state, notices }
    }

    pub fn current(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut DashboardState)) {
        self.state.send_modify(f);
    }

    pub(crate) fn set_authorization(&self, state: AuthorizationState) {
        self.update(|s| s.set_authorization(state));
    }

    pub(crate) fn set_snapshot(&self, metric: Metric, snapshot: MetricSnapshot) {
        self.update(|s| *s.metrics.get_mut(metric) = snapshot);
    }

    pub(crate) fn notify(&self, notice: Notice) {
        tracing::info!(notice = %notice, "notice");
        // No subscribers is fine; nothing is rendering yet.
        let _ = self.notices.send(notice);
    }
}
