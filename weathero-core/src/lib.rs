//! Core library for the `weathero` weather dashboard.
//!
//! This crate defines:
//! - The weather API contract and its HTTP and in-process clients
//! - Pure reducers turning raw forecast records into display models
//! - The forecast controller: location, fetch de-duplication, observable results
//! - Configuration & credentials handling
//!
//! It is used by `weathero-cli`, but any front end can compose a
//! [`ForecastController`] and subscribe to its channels.

pub mod api;
pub mod classify;
pub mod config;
pub mod controller;
pub mod error;
pub mod forecast;
pub mod model;
pub mod observable;

pub use api::{ApiClient, ApiRequest, AvailabilityRequest, MockApiClient, WeatherKitClient, WeatherRequest};
pub use config::Config;
pub use controller::{ControllerOptions, FetchResult, ForecastController, NextDaysResult, NextHourResult};
pub use error::{ApiError, FetchError};
pub use forecast::{DaySummary, MinutePrecipitation, TemperatureRange};
pub use model::{DataSet, Location, Weather};
pub use observable::{Observable, SubscriptionId};
