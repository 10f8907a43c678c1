use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::Instrument;
use uuid::Uuid;

use crate::domains::{AuthorizationController, MetricAggregationService};
use crate::state::{AuthorizationState, DashboardState, Notice, StateHandle};
use health_platform::{HealthPlatform, Metric};

/// Owns the dashboard state and drives authorization followed by the metric loads.
#[derive(Clone)]
pub struct DashboardService {
    state: StateHandle,
    authorization: AuthorizationController,
    aggregation: MetricAggregationService,
}

impl DashboardService {
    pub fn new(platform: Arc<dyn HealthPlatform>) -> Self {
        let state = StateHandle::new();
        Self {
            authorization: AuthorizationController::new(platform.clone(), state.clone()),
            aggregation: MetricAggregationService::new(platform, state.clone()),
            state,
        }
    }

    /// Copy of the current state.
    pub fn state(&self) -> DashboardState {
        self.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.state.notices()
    }

    pub fn aggregation(&self) -> &MetricAggregationService {
        &self.aggregation
    }

    /// Entry point for the platform-ready signal.
    ///
    /// Every authorization success reloads all four metrics, whether access was
    /// already granted or just granted.
    pub async fn on_platform_ready(&self) -> AuthorizationState {
        let cycle = Uuid::new_v4();
        async {
            tracing::info!("platform ready");
            let outcome = self.authorization.run().await;
            if outcome == AuthorizationState::Authorized {
                let failed = self.load_all().await;
                if !failed.is_empty() {
                    tracing::warn!(?failed, "some metrics could not be loaded");
                }
            }
            outcome
        }
        .instrument(tracing::info_span!("ready_cycle", %cycle))
        .await
    }

    /// Loads every metric in order, one at a time. A failing metric is reported
    /// and skipped; the returned list names the metrics that failed.
    pub async fn load_all(&self) -> Vec<Metric> {
        let mut failed = Vec::new();
        for metric in Metric::ALL {
            if let Err(err) = self.aggregation.fetch(metric).await {
                tracing::warn!(%metric, error = %err, "metric load failed");
                self.state.notify(Notice::MetricFetchFailed {
                    metric,
                    detail: err.to_string(),
                });
                failed.push(metric);
            }
        }
        failed
    }
}
