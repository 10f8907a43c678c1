//! Health data access core: authorizes read access to the device health store
//! and keeps a seven-day daily view of steps, distance, heart rate and calories.

pub mod domains;
pub mod error;
pub mod observability;
pub mod services;
pub mod state;

mod test_utils;

pub use domains::{AuthorizationController, MetricAggregationService};
pub use error::{AuthorizationError, FetchError};
pub use services::DashboardService;
pub use state::{
    AuthorizationPhase, AuthorizationState, DailyAggregate, DashboardState, MetricSnapshot,
    MetricSnapshots, Notice, StateHandle,
};
