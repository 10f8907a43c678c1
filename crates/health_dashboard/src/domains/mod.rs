//! Decision logic of the dashboard.
//!
//! # Modules
//!
//! - [`authorization`]: availability check, existing grant check and the permission prompt
//! - [`aggregation`]: trailing-week daily aggregates per metric

pub mod aggregation;
pub mod authorization;

pub use aggregation::MetricAggregationService;
pub use authorization::AuthorizationController;
