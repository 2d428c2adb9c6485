use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::ApiError;
use crate::model::DataSet;

use super::{ApiClient, ApiRequest};

const DEMO_WEATHER: &str = include_str!("../../fixtures/demo_weather.json");

/// In-process client that answers from a JSON payload instead of the network.
///
/// Weather requests only get the data sets listed in their `dataSets` query,
/// availability requests get the keys present in the payload.
#[derive(Debug)]
pub struct MockApiClient {
    payload: Value,
    exclude_next_hour: bool,
    exclude_daily: bool,
    failure: Option<String>,
    held: bool,
    gate: Semaphore,
    calls: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A request as the mock saw it, with absent queries already dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub resource: String,
    pub queries: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn query(&self, name: &str) -> Option<&str> {
        self.queries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl MockApiClient {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            exclude_next_hour: false,
            exclude_daily: false,
            failure: None,
            held: false,
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Client serving the bundled demo forecast for a rainy November morning.
    pub fn demo() -> Result<Self, ApiError> {
        Ok(Self::new(serde_json::from_str(DEMO_WEATHER)?))
    }

    /// Leave next-hour data out of every response.
    pub fn without_next_hour(mut self) -> Self {
        self.exclude_next_hour = true;
        self
    }

    /// Leave daily data out of every response.
    pub fn without_daily(mut self) -> Self {
        self.exclude_daily = true;
        self
    }

    /// Fail every request with [`ApiError::Response`].
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Hold every response until [`release`](Self::release) is called.
    pub fn held(mut self) -> Self {
        self.held = true;
        self
    }

    /// Lets held and future requests complete.
    pub fn release(&self) {
        self.gate.close();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    fn respond(&self, resource: &str, queries: &[(&'static str, Option<String>)]) -> Value {
        let Value::Object(all) = &self.payload else {
            return self.payload.clone();
        };

        if resource.starts_with("/api/v1/availability/") {
            return Value::Array(all.keys().cloned().map(Value::String).collect());
        }

        let requested: Vec<&str> = queries
            .iter()
            .find(|(name, _)| *name == "dataSets")
            .and_then(|(_, value)| value.as_deref())
            .map(|v| v.split(',').collect())
            .unwrap_or_default();

        let excluded = |key: &str| {
            (self.exclude_next_hour && key == DataSet::ForecastNextHour.as_str())
                || (self.exclude_daily && key == DataSet::ForecastDaily.as_str())
        };

        let selected: Map<String, Value> = all
            .iter()
            .filter(|(key, _)| requested.contains(&key.as_str()) && !excluded(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Value::Object(selected)
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn perform<R: ApiRequest>(&self, request: &R) -> Result<R::Response, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let resource = request.resource();
        let queries = request.queries();
        self.requests.lock().push(RecordedRequest {
            resource: resource.clone(),
            queries: queries
                .iter()
                .filter_map(|(name, value)| value.clone().map(|v| (name.to_string(), v)))
                .collect(),
        });
        debug!(%resource, "Mock request");

        if self.held {
            // closed by `release`; the error just means "go ahead"
            let _ = self.gate.acquire().await;
        }

        if let Some(message) = &self.failure {
            return Err(ApiError::Response(message.clone()));
        }

        let response = self.respond(&resource, &queries);
        Ok(serde_json::from_value(response)?)
    }
}
