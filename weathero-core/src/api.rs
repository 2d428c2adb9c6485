use crate::{
    Config,
    error::ApiError,
    model::{DataSet, Location, Weather},
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

pub mod mock;
pub mod weatherkit;

pub use mock::{MockApiClient, RecordedRequest};
pub use weatherkit::WeatherKitClient;

pub const DEFAULT_COUNTRY_CODE: &str = "GB";
pub const DEFAULT_TIMEZONE: &str = "GMT";

/// Describes one call against the weather API and the type it decodes into.
pub trait ApiRequest: Send + Sync + Debug {
    type Response: DeserializeOwned + Send + 'static;

    /// Path of the resource, starting with `/`.
    fn resource(&self) -> String;

    /// Query parameters in order. Entries with a `None` value are left out.
    fn queries(&self) -> Vec<(&'static str, Option<String>)> {
        Vec::new()
    }

    fn method(&self) -> Method {
        Method::GET
    }

    fn body(&self) -> Option<Vec<u8>> {
        None
    }

    fn headers(&self) -> Vec<(&'static str, Option<String>)> {
        Vec::new()
    }
}

/// Performs [`ApiRequest`]s. A call is single-shot; dropping the future cancels it.
#[async_trait]
pub trait ApiClient: Send + Sync + Debug {
    async fn perform<R: ApiRequest>(&self, request: &R) -> Result<R::Response, ApiError>;
}

/// Forecast request for a set of data sets at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub location: Location,
    pub country_code: String,
    pub data_sets: Vec<DataSet>,
    pub timezone: String,
    /// Defaults to now on the server when absent.
    pub current_as_of: Option<DateTime<Utc>>,
    /// Defaults to today on the server when absent.
    pub daily_start: Option<DateTime<Utc>>,
    /// Defaults to ten days from now on the server when absent.
    pub daily_end: Option<DateTime<Utc>>,
    pub hourly_start: Option<DateTime<Utc>>,
    pub hourly_end: Option<DateTime<Utc>>,
}

impl WeatherRequest {
    pub fn new(location: Location, data_sets: Vec<DataSet>) -> Self {
        Self {
            location,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            data_sets,
            timezone: DEFAULT_TIMEZONE.to_string(),
            current_as_of: None,
            daily_start: None,
            daily_end: None,
            hourly_start: None,
            hourly_end: None,
        }
    }

    pub fn data_sets_query(&self) -> String {
        self.data_sets.iter().map(DataSet::as_str).collect::<Vec<_>>().join(",")
    }
}

impl ApiRequest for WeatherRequest {
    type Response = Weather;

    fn resource(&self) -> String {
        format!(
            "/api/v1/weather/en/{}/{}",
            self.location.latitude, self.location.longitude
        )
    }

    fn queries(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("country", Some(self.country_code.clone())),
            ("dataSets", Some(self.data_sets_query())),
            ("timezone", Some(self.timezone.clone())),
            ("currentAsOf", iso8601(self.current_as_of)),
            ("dailyStart", iso8601(self.daily_start)),
            ("dailyEnd", iso8601(self.daily_end)),
            ("hourlyStart", iso8601(self.hourly_start)),
            ("hourlyEnd", iso8601(self.hourly_end)),
        ]
    }
}

/// Asks which data sets are available at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityRequest {
    pub location: Location,
    pub country_code: String,
}

impl AvailabilityRequest {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

impl ApiRequest for AvailabilityRequest {
    type Response = Vec<DataSet>;

    fn resource(&self) -> String {
        format!(
            "/api/v1/availability/{}/{}",
            self.location.latitude, self.location.longitude
        )
    }

    fn queries(&self) -> Vec<(&'static str, Option<String>)> {
        vec![("country", Some(self.country_code.clone()))]
    }
}

fn iso8601(date: Option<DateTime<Utc>>) -> Option<String> {
    date.map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Construct the HTTP client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<WeatherKitClient> {
    let token = config.api_token().ok_or_else(|| {
        anyhow::anyhow!(
            "No API token configured.\n\
             Hint: run `weathero configure` or set {}.",
            crate::config::TOKEN_ENV_VAR
        )
    })?;

    let client = WeatherKitClient::new(&config.base_url, Some(token), config.request_timeout())?;
    Ok(client)
}
