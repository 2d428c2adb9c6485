use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// A point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both coordinates are finite and within their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Readable fallback name used when no place name is known.
    pub fn label(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }
}

/// Data sets the weather API can return in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSet {
    CurrentWeather,
    ForecastDaily,
    ForecastHourly,
    ForecastNextHour,
    WeatherAlerts,
}

impl DataSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSet::CurrentWeather => "currentWeather",
            DataSet::ForecastDaily => "forecastDaily",
            DataSet::ForecastHourly => "forecastHourly",
            DataSet::ForecastNextHour => "forecastNextHour",
            DataSet::WeatherAlerts => "weatherAlerts",
        }
    }

    pub const fn all() -> &'static [DataSet] {
        &[
            DataSet::CurrentWeather,
            DataSet::ForecastDaily,
            DataSet::ForecastHourly,
            DataSet::ForecastNextHour,
            DataSet::WeatherAlerts,
        ]
    }
}

impl std::fmt::Display for DataSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for DataSet {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DataSet::all()
            .iter()
            .copied()
            .find(|d| d.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown data set '{value}'. Supported data sets: currentWeather, \
                     forecastDaily, forecastHourly, forecastNextHour, weatherAlerts."
                )
            })
    }
}

/// Full weather payload. Every data set is optional; only requested ones are returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_weather: Option<CurrentWeather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_daily: Option<DailyForecast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_hourly: Option<HourlyForecast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_next_hour: Option<NextHourForecast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_alerts: Option<WeatherAlertCollection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrecipitationType {
    Clear,
    Precipitation,
    Rain,
    Snow,
    Sleet,
    Hail,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PressureTrend {
    Rising,
    Falling,
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoonPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    Full,
    WaxingGibbous,
    WaningGibbous,
    ThirdQuarter,
    WaningCrescent,
}

// Temperatures are in degrees Celsius throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub as_of: DateTime<Utc>,
    pub cloud_cover: f64,
    pub condition_code: String,
    pub daylight: bool,
    pub humidity: f64,
    pub precipitation_intensity: f64,
    pub pressure: f64,
    pub pressure_trend: PressureTrend,
    pub temperature: f64,
    pub temperature_apparent: f64,
    pub temperature_dew_point: f64,
    pub uv_index: i32,
    pub visibility: f64,
    pub wind_direction: i32,
    pub wind_gust: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecast {
    pub days: Vec<DayWeatherConditions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWeatherConditions {
    pub condition_code: String,
    #[serde(default)]
    pub daytime_forecast: Option<DayPartForecast>,
    pub forecast_end: DateTime<Utc>,
    pub forecast_start: DateTime<Utc>,
    pub max_uv_index: i32,
    pub moon_phase: MoonPhase,
    #[serde(default)]
    pub moonrise: Option<DateTime<Utc>>,
    #[serde(default)]
    pub moonset: Option<DateTime<Utc>>,
    #[serde(default)]
    pub overnight_forecast: Option<DayPartForecast>,
    pub precipitation_amount: f64,
    pub precipitation_chance: f64,
    pub precipitation_type: PrecipitationType,
    pub snowfall_amount: f64,
    #[serde(default)]
    pub solar_midnight: Option<DateTime<Utc>>,
    #[serde(default)]
    pub solar_noon: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sunrise: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sunset: Option<DateTime<Utc>>,
    pub temperature_max: f64,
    pub temperature_min: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPartForecast {
    pub cloud_cover: f64,
    pub condition_code: String,
    pub forecast_end: DateTime<Utc>,
    pub forecast_start: DateTime<Utc>,
    pub humidity: f64,
    pub precipitation_amount: f64,
    pub precipitation_chance: f64,
    pub precipitation_type: PrecipitationType,
    pub snowfall_amount: f64,
    pub wind_direction: i32,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub hours: Vec<HourWeatherConditions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourWeatherConditions {
    pub cloud_cover: f64,
    pub condition_code: String,
    #[serde(default)]
    pub daylight: Option<bool>,
    pub forecast_start: DateTime<Utc>,
    pub humidity: f64,
    pub precipitation_chance: f64,
    pub precipitation_type: PrecipitationType,
    #[serde(default)]
    pub precipitation_amount: Option<f64>,
    pub pressure: f64,
    #[serde(default)]
    pub pressure_trend: Option<PressureTrend>,
    #[serde(default)]
    pub snowfall_intensity: Option<f64>,
    pub temperature: f64,
    pub temperature_apparent: f64,
    #[serde(default)]
    pub temperature_dew_point: Option<f64>,
    pub uv_index: i32,
    pub visibility: f64,
    #[serde(default)]
    pub wind_direction: Option<i32>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextHourForecast {
    #[serde(default)]
    pub forecast_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub forecast_start: Option<DateTime<Utc>>,
    pub minutes: Vec<ForecastMinute>,
    #[serde(default)]
    pub summary: Vec<ForecastPeriodSummary>,
}

/// One minute of the next-hour forecast, as delivered (unordered).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastMinute {
    pub precipitation_chance: f64,
    pub precipitation_intensity: f64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriodSummary {
    pub condition: PrecipitationType,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub precipitation_chance: f64,
    pub precipitation_intensity: f64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAlertCollection {
    pub alerts: Vec<WeatherAlertSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlertSummary {
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    pub certainty: Certainty,
    pub country_code: String,
    pub description: String,
    #[serde(default)]
    pub details_url: Option<String>,
    pub effective_time: DateTime<Utc>,
    #[serde(default)]
    pub event_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_onset_time: Option<DateTime<Utc>>,
    pub expire_time: DateTime<Utc>,
    pub id: String,
    pub issued_time: DateTime<Utc>,
    pub responses: Vec<ResponseType>,
    pub severity: Severity,
    pub source: String,
    #[serde(default)]
    pub urgency: Option<Urgency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Certainty {
    Observed,
    Likely,
    Possible,
    Unlikely,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseType {
    Shelter,
    Evacuate,
    Prepare,
    Execute,
    Avoid,
    Monitor,
    Assess,
    AllClear,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    Immediate,
    Expected,
    Future,
    Past,
    Unknown,
}
