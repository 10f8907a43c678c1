//! Scripted `HealthPlatform` used by the unit tests.
#![cfg(test)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use health_platform::{AggregateQuery, AuthorizationScope, HealthPlatform, Metric, PlatformError};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    IsAvailable,
    IsAuthorized,
    RequestAuthorization,
    Query(Metric),
    OpenStore,
}

type Reply<T> = Result<T, String>;

/// Every reply is scripted; metrics without a scripted response return `[]`.
pub struct MockPlatform {
    available: Mutex<Reply<bool>>,
    authorized: Mutex<Reply<bool>>,
    grant: Mutex<Reply<bool>>,
    remediation: Option<Reply<()>>,
    responses: Mutex<HashMap<Metric, Reply<Value>>>,
    calls: Mutex<Vec<Call>>,
    queries: Mutex<Vec<AggregateQuery>>,
}

impl MockPlatform {
    fn with(available: Reply<bool>, authorized: Reply<bool>, grant: Reply<bool>) -> Self {
        Self {
            available: Mutex::new(available),
            authorized: Mutex::new(authorized),
            grant: Mutex::new(grant),
            remediation: None,
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn granted() -> Self {
        Self::with(Ok(true), Ok(true), Ok(true))
    }

    pub fn needs_prompt(grant: bool) -> Self {
        Self::with(Ok(true), Ok(false), Ok(grant))
    }

    pub fn unavailable() -> Self {
        Self::with(Ok(false), Ok(true), Ok(true))
    }

    pub fn rejecting_availability(self, msg: &str) -> Self {
        *self.available.lock().unwrap() = Err(msg.into());
        self
    }

    pub fn rejecting_check(self, msg: &str) -> Self {
        *self.authorized.lock().unwrap() = Err(msg.into());
        self
    }

    pub fn rejecting_request(self, msg: &str) -> Self {
        *self.grant.lock().unwrap() = Err(msg.into());
        self
    }

    pub fn with_remediation(mut self, outcome: Reply<()>) -> Self {
        self.remediation = Some(outcome);
        self
    }

    pub fn with_records(self, metric: Metric, records: Value) -> Self {
        self.responses.lock().unwrap().insert(metric, Ok(records));
        self
    }

    pub fn failing_metric(self, metric: Metric, msg: &str) -> Self {
        self.fail_metric(metric, msg);
        self
    }

    pub fn fail_metric(&self, metric: Metric, msg: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(metric, Err(msg.into()));
    }

    pub fn set_grant(&self, grant: bool) {
        *self.grant.lock().unwrap() = Ok(grant);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<AggregateQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn reply<T: Clone>(slot: &Mutex<Reply<T>>) -> Result<T, PlatformError> {
    slot.lock()
        .unwrap()
        .clone()
        .map_err(PlatformError::Rejected)
}

#[async_trait]
impl HealthPlatform for MockPlatform {
    async fn is_available(&self) -> Result<bool, PlatformError> {
        self.record(Call::IsAvailable);
        reply(&self.available)
    }

    async fn is_authorized(&self, _scope: &AuthorizationScope) -> Result<bool, PlatformError> {
        self.record(Call::IsAuthorized);
        reply(&self.authorized)
    }

    async fn request_authorization(
        &self,
        _scope: &AuthorizationScope,
    ) -> Result<bool, PlatformError> {
        self.record(Call::RequestAuthorization);
        reply(&self.grant)
    }

    async fn query_aggregated(&self, query: &AggregateQuery) -> Result<Value, PlatformError> {
        self.record(Call::Query(query.data_type));
        self.queries.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .get(&query.data_type)
            .cloned()
            .unwrap_or_else(|| Ok(json!([])))
            .map_err(PlatformError::Rejected)
    }

    fn supports_remediation(&self) -> bool {
        self.remediation.is_some()
    }

    async fn open_health_store(&self) -> Result<(), PlatformError> {
        self.record(Call::OpenStore);
        match &self.remediation {
            Some(outcome) => outcome.clone().map_err(PlatformError::Rejected),
            None => Err(PlatformError::Unsupported),
        }
    }
}
