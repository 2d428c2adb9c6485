//! Weather classifications used when presenting forecasts.

use std::ops::Range;

use crate::forecast::{DaySummary, MinutePrecipitation};
use crate::model::PrecipitationType;

/// Precipitation intensity bands in millimetres per hour.
pub const LIGHT_RAIN: Range<f64> = 0.0..2.5;
pub const MODERATE_RAIN: Range<f64> = 2.5..7.5;
pub const HEAVY_RAIN: Range<f64> = 7.5..50.0;

/// Upper bound of the next-hour chart. Anything above is clipped.
pub const RAIN_CHART_MAX: f64 = 15.0;

/// Temperature anchors (°C) for the cold and hot ends of a gradient.
pub const COLD_TEMPERATURE: f64 = -10.0;
pub const HOT_TEMPERATURE: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainIntensity {
    Light,
    Moderate,
    Heavy,
    Violent,
}

impl RainIntensity {
    pub fn classify(intensity: f64) -> Self {
        if intensity < LIGHT_RAIN.end {
            RainIntensity::Light
        } else if MODERATE_RAIN.contains(&intensity) {
            RainIntensity::Moderate
        } else if HEAVY_RAIN.contains(&intensity) {
            RainIntensity::Heavy
        } else {
            RainIntensity::Violent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RainIntensity::Light => "light",
            RainIntensity::Moderate => "moderate",
            RainIntensity::Heavy => "heavy",
            RainIntensity::Violent => "violent",
        }
    }
}

/// True if any minute of the coming hour has precipitation.
pub fn has_precipitation(minutes: &[MinutePrecipitation]) -> bool {
    minutes.iter().any(|m| m.precipitation > 0.0)
}

/// Icon shown next to a forecast day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherSymbol {
    Sun,
    Rain,
    HeavyRain,
    Snowflake,
    Snow,
    Sleet,
    Hail,
    Unknown,
}

impl WeatherSymbol {
    pub fn for_day(day: &DaySummary) -> Self {
        let light = LIGHT_RAIN.contains(&day.precipitation_amount);
        match day.precipitation_type {
            PrecipitationType::Rain | PrecipitationType::Precipitation if light => {
                WeatherSymbol::Rain
            }
            PrecipitationType::Rain | PrecipitationType::Precipitation => WeatherSymbol::HeavyRain,
            PrecipitationType::Clear => WeatherSymbol::Sun,
            PrecipitationType::Snow if light => WeatherSymbol::Snowflake,
            PrecipitationType::Snow => WeatherSymbol::Snow,
            PrecipitationType::Sleet => WeatherSymbol::Sleet,
            PrecipitationType::Hail => WeatherSymbol::Hail,
            PrecipitationType::Mixed => WeatherSymbol::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherSymbol::Sun => "sun",
            WeatherSymbol::Rain => "rain",
            WeatherSymbol::HeavyRain => "heavy rain",
            WeatherSymbol::Snowflake => "light snow",
            WeatherSymbol::Snow => "snow",
            WeatherSymbol::Sleet => "sleet",
            WeatherSymbol::Hail => "hail",
            WeatherSymbol::Unknown => "mixed",
        }
    }
}
