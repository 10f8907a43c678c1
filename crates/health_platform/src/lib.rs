//! `HealthPlatform` trait and the types exchanged with the device health store.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod utils;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("bridge rejected credentials: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("platform call rejected: {0}")]
    Rejected(String),
    #[error("operation not supported by this platform")]
    Unsupported,
}

impl PlatformError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 => PlatformError::NotFound(body),
            401 | 403 => PlatformError::Auth(body),
            _ => PlatformError::Status { status, body },
        }
    }
}

/// A health data type the dashboard reads.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Steps,
    Distance,
    HeartRate,
    Calories,
}

impl Metric {
    /// Load order used by the dashboard.
    pub const ALL: [Metric; 4] = [
        Metric::Steps,
        Metric::Distance,
        Metric::HeartRate,
        Metric::Calories,
    ];

    /// Identifier understood by the health plugin.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Steps => "steps",
            Metric::Distance => "distance",
            Metric::HeartRate => "heart_rate",
            Metric::Calories => "calories",
        }
    }

    /// Human readable name used in notices.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Steps => "steps",
            Metric::Distance => "distance",
            Metric::HeartRate => "heart rate",
            Metric::Calories => "calories",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read/write permission sets requested from the platform.
///
/// The only way to build one is [`AuthorizationScope::read_only`], which
/// yields read access to every [`Metric`] and no write access.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AuthorizationScope {
    read: Vec<Metric>,
    write: Vec<Metric>,
}

impl AuthorizationScope {
    pub fn read_only() -> Self {
        Self {
            read: Metric::ALL.to_vec(),
            write: Vec::new(),
        }
    }

    pub fn read(&self) -> &[Metric] {
        &self.read
    }

    pub fn write(&self) -> &[Metric] {
        &self.write
    }
}

impl Default for AuthorizationScope {
    fn default() -> Self {
        Self::read_only()
    }
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Day,
}

/// Parameters of an aggregated query, serialized the way the plugin expects them.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub data_type: Metric,
    pub bucket: Bucket,
}

impl AggregateQuery {
    /// Number of days covered by [`AggregateQuery::trailing_week`].
    pub const WINDOW_DAYS: i64 = 7;

    /// Daily buckets for the seven days ending at `now`.
    pub fn trailing_week(metric: Metric, now: DateTime<Utc>) -> Self {
        Self {
            start_date: now - Duration::days(Self::WINDOW_DAYS),
            end_date: now,
            data_type: metric,
            bucket: Bucket::Day,
        }
    }
}

/// Device health capability. Every call resolves exactly once, either with a
/// value or with the platform's failure.
#[async_trait]
pub trait HealthPlatform: Send + Sync + 'static {
    async fn is_available(&self) -> Result<bool, PlatformError>;

    async fn is_authorized(&self, scope: &AuthorizationScope) -> Result<bool, PlatformError>;

    /// Prompts the user; `Ok(false)` means the user declined.
    async fn request_authorization(
        &self,
        scope: &AuthorizationScope,
    ) -> Result<bool, PlatformError>;

    /// Raw aggregated records, left untyped so callers validate them.
    async fn query_aggregated(
        &self,
        query: &AggregateQuery,
    ) -> Result<serde_json::Value, PlatformError>;

    /// Whether [`HealthPlatform::open_health_store`] is available.
    fn supports_remediation(&self) -> bool {
        false
    }

    /// Send the user to install or enable the underlying health service.
    async fn open_health_store(&self) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported)
    }
}
