use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use inquire::Password;
use tokio::sync::mpsc;
use tracing::{debug, info};
use weathero_core::{
    ApiClient, AvailabilityRequest, Config, ControllerOptions, DataSet, ForecastController,
    Location, MockApiClient, WeatherKitClient,
    api::client_from_config,
    config::TOKEN_ENV_VAR,
};

use crate::render;

/// Used by `--demo` when no location is given or configured.
const DEMO_LOCATION: Location = Location::new(51.493169, -0.098912);

/// Extra time on top of the request timeout before giving up on the channels.
const SETTLE_GRACE: Duration = Duration::from_secs(1);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathero", version, about = "Next-hour rain and ten-day forecast")]
pub struct Cli {
    /// Print debug logs to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Default, Args)]
pub struct LocationArgs {
    /// Latitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,
}

impl LocationArgs {
    /// The location given on the command line, if any.
    pub fn given(&self) -> Result<Option<Location>> {
        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Location::new(latitude, longitude),
            (None, None) => return Ok(None),
            _ => bail!("--latitude and --longitude must be given together"),
        };
        if !location.is_valid() {
            bail!("Invalid location: {}", location.label());
        }
        Ok(Some(location))
    }

    /// Command line first, then the configured default, then `fallback`.
    pub fn resolve(&self, config: &Config, fallback: Option<Location>) -> Result<Location> {
        if let Some(location) = self.given()? {
            return Ok(location);
        }
        match (config.default_location, fallback) {
            (Some(location), _) | (None, Some(location)) => Ok(location),
            (None, None) => config.default_location(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API token, request defaults and a default location.
    Configure {
        /// API bearer token. Prompted for when neither this nor the stored token is set.
        #[arg(long)]
        token: Option<String>,

        /// ISO country code sent with every request, e.g. "GB".
        #[arg(long)]
        country: Option<String>,

        /// Timezone name sent with every forecast request, e.g. "GMT".
        #[arg(long)]
        timezone: Option<String>,

        /// Base URL of the weather service.
        #[arg(long)]
        base_url: Option<String>,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Fetch and show the next-hour rain chart and the daily forecast.
    Show {
        #[command(flatten)]
        location: LocationArgs,

        /// Start of the daily and hourly forecast (RFC 3339). Defaults to now.
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Data sets to request, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "forecastNextHour,forecastDaily")]
        data: Vec<String>,

        /// Use bundled sample data instead of the network.
        #[arg(long)]
        demo: bool,
    },

    /// List the data sets the service offers at a location.
    Availability {
        #[command(flatten)]
        location: LocationArgs,

        /// Use bundled sample data instead of the network.
        #[arg(long)]
        demo: bool,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure {
                token,
                country,
                timezone,
                base_url,
                location,
            } => configure(token, country, timezone, base_url, &location),
            Command::Show {
                location,
                from,
                data,
                demo,
            } => {
                let config = Config::load()?;
                let data_sets = parse_data_sets(&data)?;
                let location = location.resolve(&config, demo.then_some(DEMO_LOCATION))?;
                let mut options = ControllerOptions::from_config(&config);
                options.forecast_start = from;

                let output = if demo {
                    show(Arc::new(MockApiClient::demo()?), location, options, &data_sets).await?
                } else {
                    let client = client_from_config(&config)?;
                    show(Arc::new(client), location, options, &data_sets).await?
                };
                print!("{output}");
                Ok(())
            }
            Command::Availability { location, demo } => {
                let config = Config::load()?;
                let location = location.resolve(&config, demo.then_some(DEMO_LOCATION))?;
                let mut request = AvailabilityRequest::new(location);
                request.country_code = config.country_code.clone();

                let available = if demo {
                    MockApiClient::demo()?.perform(&request).await?
                } else {
                    client_from_config(&config)?.perform(&request).await?
                };
                print!("{}", render::availability(&location, &available));
                Ok(())
            }
        }
    }
}

fn configure(
    token: Option<String>,
    country: Option<String>,
    timezone: Option<String>,
    base_url: Option<String>,
    location: &LocationArgs,
) -> Result<()> {
    let mut config = Config::load()?;

    if let Some(base_url) = base_url {
        // reject URLs the client could never use
        WeatherKitClient::new(&base_url, None, config.request_timeout())
            .with_context(|| format!("Invalid base URL: {base_url}"))?;
        config.base_url = base_url;
    }
    if let Some(country) = country {
        config.country_code = country;
    }
    if let Some(timezone) = timezone {
        config.timezone = timezone;
    }
    if let Some(location) = location.given()? {
        config.default_location = Some(location);
    }

    match token {
        Some(token) => config.api_token = Some(token),
        None if config.api_token.is_none() && std::env::var(TOKEN_ENV_VAR).is_err() => {
            let token = Password::new("API token:")
                .without_confirmation()
                .prompt()
                .context("Failed to read API token")?;
            if token.trim().is_empty() {
                bail!("API token cannot be empty");
            }
            config.api_token = Some(token.trim().to_string());
        }
        None => debug!("Keeping existing API token"),
    }

    let path = config.save()?;
    info!(path = %path.display(), "Configuration saved");
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn parse_data_sets(names: &[String]) -> Result<Vec<DataSet>> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(DataSet::try_from)
        .collect()
}

/// Runs one fetch through a controller and renders the channels once they settle.
pub async fn show<C: ApiClient + 'static>(
    client: Arc<C>,
    location: Location,
    options: ControllerOptions,
    data_sets: &[DataSet],
) -> Result<String> {
    let wants_next_hour = data_sets.contains(&DataSet::ForecastNextHour);
    let wants_next_days = data_sets.contains(&DataSet::ForecastDaily);
    if !wants_next_hour && !wants_next_days {
        bail!("Nothing to show: request forecastNextHour and/or forecastDaily");
    }

    let wait = options.timeout + SETTLE_GRACE;
    let controller = ForecastController::new(client, location, options);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let hour_tx = tx.clone();
    controller.next_hour().subscribe(move |_| {
        let _ = hour_tx.send(());
    });
    controller.next_days().subscribe(move |_| {
        let _ = tx.send(());
    });

    if !controller.get_data(data_sets) {
        bail!("Could not start the forecast fetch");
    }

    let settled = |controller: &ForecastController<C>| {
        (!wants_next_hour || !controller.next_hour().get().is_absent())
            && (!wants_next_days || !controller.next_days().get().is_absent())
    };
    while !settled(&controller) {
        tokio::time::timeout(wait, rx.recv())
            .await
            .context("Timed out waiting for the forecast")?
            .ok_or_else(|| anyhow!("Forecast channels closed"))?;
    }

    let mut output = render::location_header(&controller.location());
    if wants_next_hour {
        output.push_str(&render::next_hour(&controller.next_hour().get()));
    }
    if wants_next_days {
        output.push_str(&render::next_days(
            &controller.next_days().get(),
            controller.days_temperature_range(),
        ));
    }
    Ok(output)
}
