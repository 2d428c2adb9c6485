//! Reduction of raw API records into display models.
//!
//! Everything here is pure: the same input always gives the same output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{COLD_TEMPERATURE, HOT_TEMPERATURE};
use crate::model::{DayWeatherConditions, ForecastMinute, PrecipitationType};

/// Precipitation for one minute of the coming hour.
///
/// `offset` is the minute's rank after sorting by start time, not a time difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinutePrecipitation {
    pub precipitation: f64,
    pub offset: usize,
}

/// The parts of a forecast day the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub precipitation_type: PrecipitationType,
    pub precipitation_amount: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub forecast_start: DateTime<Utc>,
}

/// Closed temperature interval spanning a set of days. `min < max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    min: f64,
    max: f64,
}

impl TemperatureRange {
    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Position of `value` relative to the range, 0.0 at `min` and 1.0 at `max`.
    /// Values outside the range map outside `[0, 1]`.
    pub fn fraction(&self, value: f64) -> f64 {
        (value - self.min) / self.width()
    }

    /// Start and end fractions of one day's bar inside this range.
    pub fn bar(&self, day: &DaySummary) -> (f64, f64) {
        (
            self.fraction(day.min_temperature),
            self.fraction(day.max_temperature),
        )
    }

    /// Cold, mid and hot gradient locations for a bar drawn over this range.
    pub fn gradient_stops(&self) -> [f64; 3] {
        let cold = self.fraction(COLD_TEMPERATURE);
        let hot = self.fraction(HOT_TEMPERATURE);
        [cold, (cold + hot) / 2.0, hot]
    }
}

/// Sorts minutes by start time and re-indexes them by position.
pub fn reduce_minutes(minutes: &[ForecastMinute]) -> Vec<MinutePrecipitation> {
    let mut sorted: Vec<&ForecastMinute> = minutes.iter().collect();
    // stable: equal start times keep their delivered order
    sorted.sort_by_key(|m| m.start_time);

    sorted
        .into_iter()
        .enumerate()
        .map(|(offset, minute)| MinutePrecipitation {
            precipitation: minute.precipitation_intensity,
            offset,
        })
        .collect()
}

/// Sorts days by forecast start and projects the displayed fields.
pub fn reduce_days(days: &[DayWeatherConditions]) -> Vec<DaySummary> {
    let mut sorted: Vec<&DayWeatherConditions> = days.iter().collect();
    sorted.sort_by_key(|d| d.forecast_start);

    sorted
        .into_iter()
        .map(|day| DaySummary {
            precipitation_type: day.precipitation_type,
            precipitation_amount: day.precipitation_amount,
            min_temperature: day.temperature_min,
            max_temperature: day.temperature_max,
            forecast_start: day.forecast_start,
        })
        .collect()
}

/// Range from the lowest minimum to the highest maximum.
///
/// Returns `None` for an empty slice and for a degenerate range where the
/// maximum does not exceed the minimum.
pub fn temperature_range(days: &[DaySummary]) -> Option<TemperatureRange> {
    let min = days.iter().map(|d| d.min_temperature).reduce(f64::min)?;
    let max = days.iter().map(|d| d.max_temperature).reduce(f64::max)?;

    (max > min).then_some(TemperatureRange { min, max })
}
