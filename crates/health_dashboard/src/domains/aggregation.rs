use std::sync::Arc;

use chrono::{DateTime, Utc};
use health_platform::utils::{local_calendar_date, measurement};
use health_platform::{AggregateQuery, HealthPlatform, Metric};
use serde_json::Value;

use crate::error::FetchError;
use crate::observability;
use crate::state::{DailyAggregate, MetricSnapshot, StateHandle};

/// Loads the trailing week of one metric into its snapshot.
///
/// Callers invoke it only after authorization succeeded; it does not check.
#[derive(Clone)]
pub struct MetricAggregationService {
    platform: Arc<dyn HealthPlatform>,
    state: StateHandle,
}

impl MetricAggregationService {
    pub fn new(platform: Arc<dyn HealthPlatform>, state: StateHandle) -> Self {
        Self { platform, state }
    }

    pub async fn fetch(&self, metric: Metric) -> Result<(), FetchError> {
        self.fetch_at(metric, Utc::now()).await
    }

    /// Same as [`fetch`](Self::fetch) with an explicit end of window.
    ///
    /// The snapshot is reset before the query and only replaced once the whole
    /// response validated, so a failure leaves it empty.
    pub async fn fetch_at(&self, metric: Metric, now: DateTime<Utc>) -> Result<(), FetchError> {
        self.state.set_snapshot(metric, MetricSnapshot::default());

        let query = AggregateQuery::trailing_week(metric, now);
        let result = match self.platform.query_aggregated(&query).await {
            Ok(response) => snapshot_from_response(&response),
            Err(e) => Err(FetchError::from(e)),
        };

        match result {
            Ok(snapshot) => {
                tracing::info!(
                    %metric,
                    days = snapshot.series.len(),
                    total = snapshot.total,
                    "metric loaded"
                );
                observability::record_metric_fetch(metric, true);
                self.state.set_snapshot(metric, snapshot);
                Ok(())
            }
            Err(e) => {
                observability::record_metric_fetch(metric, false);
                Err(e)
            }
        }
    }
}

/// Validates the platform response and converts it into a snapshot.
pub fn snapshot_from_response(response: &Value) -> Result<MetricSnapshot, FetchError> {
    let records = response
        .as_array()
        .ok_or_else(|| FetchError::UnexpectedShape(json_kind(response)))?;
    let series = records
        .iter()
        .enumerate()
        .map(|(index, record)| daily_aggregate(index, record))
        .collect::<Result<Vec<_>, _>>()?;
    let raw_payload = serde_json::to_string_pretty(response)?;
    let snapshot = MetricSnapshot::from_series(series, raw_payload);
    if !snapshot.total.is_finite() {
        return Err(FetchError::Overflow);
    }
    Ok(snapshot)
}

fn daily_aggregate(index: usize, record: &Value) -> Result<DailyAggregate, FetchError> {
    let malformed = |reason: String| FetchError::MalformedRecord { index, reason };

    let Some(obj) = record.as_object() else {
        return Err(malformed(format!(
            "expected an object, got {}",
            json_kind(record)
        )));
    };
    let start = obj
        .get("startDate")
        .ok_or_else(|| malformed("missing startDate".into()))?;
    let date = local_calendar_date(start)
        .ok_or_else(|| malformed(format!("unparseable startDate {start}")))?;
    let raw_value = obj
        .get("value")
        .ok_or_else(|| malformed("missing value".into()))?;
    let value =
        measurement(raw_value).ok_or_else(|| malformed(format!("non-numeric value {raw_value}")))?;

    Ok(DailyAggregate { date, value })
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
