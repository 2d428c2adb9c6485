//! Plain-text rendering of controller channels.

use weathero_core::{
    DataSet, FetchResult, Location, NextDaysResult, NextHourResult, TemperatureRange,
    classify::{RAIN_CHART_MAX, RainIntensity, WeatherSymbol, has_precipitation},
    forecast::{DaySummary, MinutePrecipitation},
};

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const BAR_WIDTH: usize = 24;

pub fn location_header(location: &Location) -> String {
    format!("Forecast for {}\n\n", location.label())
}

pub fn next_hour(result: &NextHourResult) -> String {
    match result {
        FetchResult::Absent => "Next hour: loading...\n\n".to_string(),
        FetchResult::Failure(err) => format!("Failed to get hourly data: {err}\n\n"),
        FetchResult::Success(minutes) if !has_precipitation(minutes) => {
            "Next hour: no precipitation for the next hour\n\n".to_string()
        }
        FetchResult::Success(minutes) => {
            let mut out = format!("Next hour  |{}|\n", sparkline(minutes));
            if let Some(peak) = minutes
                .iter()
                .max_by(|a, b| a.precipitation.total_cmp(&b.precipitation))
            {
                out.push_str(&format!(
                    "           peak {:.1} mm/h ({}) at +{} min\n",
                    peak.precipitation,
                    RainIntensity::classify(peak.precipitation).as_str(),
                    peak.offset
                ));
            }
            out.push('\n');
            out
        }
    }
}

/// One character per minute, scaled to the chart maximum. Dry minutes are blank.
fn sparkline(minutes: &[MinutePrecipitation]) -> String {
    minutes
        .iter()
        .map(|m| {
            if m.precipitation <= 0.0 {
                return ' ';
            }
            let level = m.precipitation.min(RAIN_CHART_MAX) / RAIN_CHART_MAX;
            let index = (level * (SPARKS.len() - 1) as f64).round() as usize;
            SPARKS[index.min(SPARKS.len() - 1)]
        })
        .collect()
}

pub fn next_days(result: &NextDaysResult, range: Option<TemperatureRange>) -> String {
    let days = match result {
        FetchResult::Absent => return "Daily forecast: loading...\n".to_string(),
        FetchResult::Failure(err) => return format!("Failed to get daily data: {err}\n"),
        FetchResult::Success(days) if days.is_empty() => {
            return "Daily forecast: no days returned\n".to_string();
        }
        FetchResult::Success(days) => days,
    };

    let mut out = String::new();
    if let Some(range) = range {
        out.push_str(&format!(
            "Temperatures from {:.1}° to {:.1}°\n",
            range.min(),
            range.max()
        ));
    }
    for day in days {
        out.push_str(&day_row(day, range));
    }
    out
}

fn day_row(day: &DaySummary, range: Option<TemperatureRange>) -> String {
    let weekday = day.forecast_start.format("%A").to_string();
    format!(
        "{:<9}  {:<10}  {:>6.1}°  {}  {:<6.1}°\n",
        weekday,
        WeatherSymbol::for_day(day).label(),
        day.min_temperature,
        temperature_bar(day, range),
        day.max_temperature
    )
}

/// Bar spanning the day's min to max, positioned inside the range of all days.
/// Without a range every day spans the full width.
fn temperature_bar(day: &DaySummary, range: Option<TemperatureRange>) -> String {
    let (start, end) = match range {
        Some(range) => {
            let (from, to) = range.bar(day);
            let cell = |f: f64| (f.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
            let start = cell(from).min(BAR_WIDTH - 1);
            (start, cell(to).max(start + 1))
        }
        None => (0, BAR_WIDTH),
    };

    (0..BAR_WIDTH)
        .map(|i| if (start..end).contains(&i) { '━' } else { '·' })
        .collect()
}

pub fn availability(location: &Location, available: &[DataSet]) -> String {
    if available.is_empty() {
        return format!("No data sets available at {}\n", location.label());
    }
    let mut out = format!("Data sets available at {}:\n", location.label());
    for data_set in available {
        out.push_str(&format!("  {data_set}\n"));
    }
    out
}
