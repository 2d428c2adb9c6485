//! The forecast-fetch state machine behind the dashboard.
//!
//! A [`ForecastController`] owns the current location and two result channels,
//! next-hour precipitation and next-days summaries. At most one fetch is in
//! flight at a time, shared across both channels. Changing the location drops
//! every result and cancels the pending fetch before the setter returns.
//!
//! Fetches run as tokio tasks. Each one carries a token; a result is only
//! committed if its token is still current, so a fetch that completes after
//! being superseded never touches the channels.

use std::{cell::RefCell, fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    Config,
    api::{ApiClient, DEFAULT_COUNTRY_CODE, DEFAULT_TIMEZONE, WeatherRequest},
    error::{ApiError, FetchError},
    forecast::{self, DaySummary, MinutePrecipitation, TemperatureRange},
    model::{DataSet, Location, Weather},
    observable::Observable,
};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Tri-state content of a channel. "Loading" is never stored; see
/// [`ForecastController::is_loading_next_hour`].
#[derive(Debug, Clone)]
pub enum FetchResult<T> {
    Absent,
    Success(T),
    Failure(FetchError),
}

impl<T> Default for FetchResult<T> {
    fn default() -> Self {
        FetchResult::Absent
    }
}

impl<T> FetchResult<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, FetchResult::Absent)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchResult::Failure(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            FetchResult::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchError> {
        match self {
            FetchResult::Failure(err) => Some(err),
            _ => None,
        }
    }
}

pub type NextHourResult = FetchResult<Vec<MinutePrecipitation>>;
pub type NextDaysResult = FetchResult<Vec<DaySummary>>;

/// Request settings fixed for the controller's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    pub country_code: String,
    pub timezone: String,
    /// Start of the daily and hourly forecasts. `None` means "from now".
    pub forecast_start: Option<DateTime<Utc>>,
    pub timeout: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            forecast_start: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            country_code: config.country_code.clone(),
            timezone: config.timezone.clone(),
            forecast_start: None,
            timeout: config.request_timeout(),
        }
    }
}

pub struct ForecastController<C: ApiClient + 'static> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    client: Arc<C>,
    options: ControllerOptions,
    // Reentrant so that subscriber callbacks may call back into the controller.
    // A `RefMut` is never held while callbacks run.
    state: ReentrantMutex<RefCell<FetchState>>,
    location: Observable<Location>,
    next_hour: Observable<NextHourResult>,
    next_days: Observable<NextDaysResult>,
}

struct FetchState {
    location: Location,
    in_flight: Option<JoinHandle<()>>,
    /// Bumped by every fetch and every location change.
    token: u64,
    /// Bumped by location changes only.
    epoch: u64,
}

impl<C: ApiClient + 'static> ForecastController<C> {
    pub fn new(client: Arc<C>, location: Location, options: ControllerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                options,
                state: ReentrantMutex::new(RefCell::new(FetchState {
                    location,
                    in_flight: None,
                    token: 0,
                    epoch: 0,
                })),
                location: Observable::new(location),
                next_hour: Observable::new(FetchResult::Absent),
                next_days: Observable::new(FetchResult::Absent),
            }),
        }
    }

    pub fn location(&self) -> Location {
        self.inner.state.lock().borrow().location
    }

    /// Published after both channels have been cleared.
    pub fn location_channel(&self) -> &Observable<Location> {
        &self.inner.location
    }

    pub fn next_hour(&self) -> &Observable<NextHourResult> {
        &self.inner.next_hour
    }

    pub fn next_days(&self) -> &Observable<NextDaysResult> {
        &self.inner.next_days
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.state.lock().borrow().in_flight.is_some()
    }

    pub fn is_loading_next_hour(&self) -> bool {
        self.is_fetching() && self.inner.next_hour.get().is_absent()
    }

    pub fn is_loading_next_days(&self) -> bool {
        self.is_fetching() && self.inner.next_days.get().is_absent()
    }

    /// Temperature span of the current next-days result, if it has one.
    pub fn days_temperature_range(&self) -> Option<TemperatureRange> {
        match self.inner.next_days.get() {
            FetchResult::Success(days) => forecast::temperature_range(&days),
            _ => None,
        }
    }

    /// Replaces the location. Any results and any pending fetch are dropped
    /// before location subscribers hear about it. Setting the current location
    /// again does nothing.
    pub fn set_location(&self, location: Location) {
        let guard = self.inner.state.lock();
        let epoch = {
            let mut state = guard.borrow_mut();
            if state.location == location {
                return;
            }
            if let Some(handle) = state.in_flight.take() {
                handle.abort();
                debug!("Cancelled in-flight fetch");
            }
            state.location = location;
            state.token += 1;
            state.epoch += 1;
            state.epoch
        };
        info!(latitude = location.latitude, longitude = location.longitude, "Location changed");

        // A subscriber may move the location again; stop as soon as that happens.
        let current = || guard.borrow().epoch == epoch;
        self.inner.next_hour.set(FetchResult::Absent);
        if current() {
            self.inner.next_days.set(FetchResult::Absent);
        }
        if current() {
            self.inner.location.set(location);
        }
    }

    /// Starts one combined fetch for `data_sets` at the current location.
    ///
    /// Returns `false` without doing anything if a fetch is already in flight,
    /// if `data_sets` is empty, or if there is no tokio runtime to run on.
    /// Results arrive through [`next_hour`](Self::next_hour) and
    /// [`next_days`](Self::next_days).
    pub fn get_data(&self, data_sets: &[DataSet]) -> bool {
        let mut requested: Vec<DataSet> = Vec::with_capacity(data_sets.len());
        for data_set in data_sets {
            if !requested.contains(data_set) {
                requested.push(*data_set);
            }
        }
        if requested.is_empty() {
            warn!("get_data called without any data sets");
            return false;
        }

        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();
        if state.in_flight.is_some() {
            debug!(?requested, "Fetch already in flight, ignoring request");
            return false;
        }
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot fetch forecast outside a tokio runtime: {e}");
                return false;
            }
        };

        state.token += 1;
        let token = state.token;
        let request = self.inner.build_request(state.location, requested);
        info!(data_sets = %request.data_sets_query(), token, "Fetching forecast");

        // The task cannot commit before the handle is stored: it needs the state lock.
        let inner = Arc::clone(&self.inner);
        state.in_flight = Some(runtime.spawn(async move { inner.fetch(request, token).await }));
        true
    }
}

impl<C: ApiClient + 'static> Inner<C> {
    fn build_request(&self, location: Location, data_sets: Vec<DataSet>) -> WeatherRequest {
        let mut request = WeatherRequest::new(location, data_sets);
        request.country_code = self.options.country_code.clone();
        request.timezone = self.options.timezone.clone();
        request.daily_start = self.options.forecast_start;
        request.hourly_start = self.options.forecast_start;
        request
    }

    async fn fetch(&self, request: WeatherRequest, token: u64) {
        let mut pending = PendingCommit {
            inner: self,
            token,
            data_sets: &request.data_sets,
            committed: false,
        };

        let timeout = self.options.timeout;
        let result = match tokio::time::timeout(timeout, self.client.perform(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(timeout)),
        };
        pending.committed = true;
        self.commit(token, &request.data_sets, result.map_err(FetchError::from));
    }

    fn commit(&self, token: u64, data_sets: &[DataSet], result: Result<Weather, FetchError>) {
        let guard = self.state.lock();
        let epoch = {
            let mut state = guard.borrow_mut();
            if state.token != token {
                debug!(token, current = state.token, "Discarding stale fetch result");
                return;
            }
            state.in_flight = None;
            state.epoch
        };
        let current = || guard.borrow().epoch == epoch;

        let wants_next_hour = data_sets.contains(&DataSet::ForecastNextHour);
        let wants_next_days = data_sets.contains(&DataSet::ForecastDaily);

        match result {
            Err(err) => {
                warn!(error = %err, "Forecast fetch failed");
                if wants_next_hour && current() {
                    self.next_hour.set(FetchResult::Failure(err.clone()));
                }
                if wants_next_days && current() {
                    self.next_days.set(FetchResult::Failure(err));
                }
            }
            Ok(weather) => {
                if wants_next_hour && current() {
                    let value = match &weather.forecast_next_hour {
                        Some(next_hour) => {
                            FetchResult::Success(forecast::reduce_minutes(&next_hour.minutes))
                        }
                        None => FetchResult::Failure(FetchError::DataNotFound(
                            DataSet::ForecastNextHour,
                        )),
                    };
                    self.next_hour.set(value);
                }
                if wants_next_days && current() {
                    let value = match &weather.forecast_daily {
                        Some(daily) => FetchResult::Success(forecast::reduce_days(&daily.days)),
                        None => {
                            FetchResult::Failure(FetchError::DataNotFound(DataSet::ForecastDaily))
                        }
                    };
                    self.next_days.set(value);
                }
            }
        }
    }
}

/// Lives inside the fetch future. If the future is dropped before committing
/// (the task panicked), the fetch is committed as [`FetchError::Interrupted`].
/// Aborted fetches have a stale token by then, so nothing is published for them.
struct PendingCommit<'a, C: ApiClient + 'static> {
    inner: &'a Inner<C>,
    token: u64,
    data_sets: &'a [DataSet],
    committed: bool,
}

impl<C: ApiClient + 'static> Drop for PendingCommit<'_, C> {
    fn drop(&mut self) {
        if !self.committed {
            debug!(token = self.token, "Fetch dropped before committing");
            self.inner
                .commit(self.token, self.data_sets, Err(FetchError::Interrupted));
        }
    }
}

impl<C: ApiClient + 'static> Drop for ForecastController<C> {
    fn drop(&mut self) {
        let guard = self.inner.state.lock();
        let handle = {
            let mut state = guard.borrow_mut();
            state.token += 1;
            state.in_flight.take()
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl<C: ApiClient + 'static> fmt::Debug for ForecastController<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastController")
            .field("location", &self.location())
            .field("fetching", &self.is_fetching())
            .field("options", &self.inner.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiRequest, MockApiClient};
    use tokio::sync::mpsc;

    const LONDON: Location = Location::new(51.493169, -0.098912);
    const ELSEWHERE: Location = Location::new(1.0, 1.0);

    fn controller(client: MockApiClient) -> (ForecastController<MockApiClient>, Arc<MockApiClient>) {
        let client = Arc::new(client);
        let controller =
            ForecastController::new(Arc::clone(&client), LONDON, ControllerOptions::default());
        (controller, client)
    }

    fn record<T: Clone + Send + 'static>(
        channel: &Observable<FetchResult<T>>,
    ) -> mpsc::UnboundedReceiver<FetchResult<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        channel.subscribe(move |value| {
            let _ = tx.send(value.clone());
        });
        rx
    }

    async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a channel update")
            .expect("channel closed")
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn publishes_next_hour_result() {
        let (controller, _) = controller(MockApiClient::demo().unwrap());
        let mut hours = record(controller.next_hour());
        let mut days = record(controller.next_days());

        assert!(controller.get_data(&[DataSet::ForecastNextHour]));

        let minutes = next(&mut hours).await.success().cloned().expect("success");
        assert_eq!(minutes.len(), 60);
        assert!(minutes.iter().enumerate().all(|(i, m)| m.offset == i));
        assert!(!controller.is_fetching());
        // next-days was not requested
        assert!(days.try_recv().is_err());
        assert!(controller.next_days().get().is_absent());
    }

    #[tokio::test]
    async fn publishes_next_days_result_sorted_with_range() {
        let (controller, _) = controller(MockApiClient::demo().unwrap());
        let mut days = record(controller.next_days());

        controller.get_data(&[DataSet::ForecastDaily]);

        let summaries = next(&mut days).await.success().cloned().expect("success");
        assert_eq!(summaries.len(), 10);
        assert!(summaries.windows(2).all(|w| w[0].forecast_start <= w[1].forecast_start));

        let range = controller.days_temperature_range().expect("range");
        assert_eq!(range.min(), -3.2);
        assert_eq!(range.max(), 12.0);
    }

    #[tokio::test]
    async fn missing_daily_data_is_data_not_found() {
        let (controller, _) = controller(MockApiClient::demo().unwrap().without_daily());
        let mut days = record(controller.next_days());
        let mut hours = record(controller.next_hour());

        controller.get_data(&[DataSet::ForecastDaily]);

        let result = next(&mut days).await;
        assert!(matches!(
            result.failure(),
            Some(FetchError::DataNotFound(DataSet::ForecastDaily))
        ));
        settle().await;
        assert!(hours.try_recv().is_err());
        assert!(controller.next_hour().get().is_absent());
    }

    #[tokio::test]
    async fn missing_next_hour_data_is_data_not_found() {
        let (controller, _) = controller(MockApiClient::demo().unwrap().without_next_hour());
        let mut hours = record(controller.next_hour());
        let mut days = record(controller.next_days());

        controller.get_data(&[DataSet::ForecastNextHour, DataSet::ForecastDaily]);

        assert!(matches!(
            next(&mut hours).await.failure(),
            Some(FetchError::DataNotFound(DataSet::ForecastNextHour))
        ));
        assert!(next(&mut days).await.is_success());
    }

    #[tokio::test]
    async fn fetch_failure_reaches_both_channels_as_one_error() {
        let (controller, _) = controller(MockApiClient::demo().unwrap().failing("offline"));
        let mut hours = record(controller.next_hour());
        let mut days = record(controller.next_days());

        controller.get_data(&[DataSet::ForecastNextHour, DataSet::ForecastDaily]);

        let hour_err = next(&mut hours).await.failure().cloned().expect("failure");
        let day_err = next(&mut days).await.failure().cloned().expect("failure");
        match (hour_err, day_err) {
            (FetchError::Api(a), FetchError::Api(b)) => {
                assert!(Arc::ptr_eq(&a, &b));
                assert!(matches!(*a, ApiError::Response(ref m) if m == "offline"));
            }
            other => panic!("expected api errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_request_while_pending_is_ignored() {
        let (controller, client) = controller(MockApiClient::demo().unwrap().held());
        let mut hours = record(controller.next_hour());

        assert!(controller.get_data(&[DataSet::ForecastNextHour]));
        assert!(!controller.get_data(&[DataSet::ForecastNextHour]));
        // a different data set is coupled to the same in-flight guard
        assert!(!controller.get_data(&[DataSet::ForecastDaily]));
        settle().await;

        assert_eq!(client.calls(), 1);
        assert!(controller.is_loading_next_hour());
        assert!(controller.is_loading_next_days());

        client.release();
        assert!(next(&mut hours).await.is_success());
        assert!(!controller.is_loading_next_hour());
        assert!(controller.next_days().get().is_absent());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn location_change_discards_pending_fetch() {
        let (controller, client) = controller(MockApiClient::demo().unwrap().held());
        let mut hours = record(controller.next_hour());

        controller.get_data(&[DataSet::ForecastNextHour]);
        settle().await;
        assert_eq!(client.calls(), 1);

        controller.set_location(ELSEWHERE);
        assert!(controller.next_hour().get().is_absent());
        assert!(!controller.is_fetching());
        assert!(next(&mut hours).await.is_absent());

        client.release();
        settle().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(controller.next_hour().get().is_absent());
        assert!(hours.try_recv().is_err());
    }

    #[test]
    fn stale_result_is_not_committed() {
        let (controller, _) = controller(MockApiClient::demo().unwrap());
        let stale_token = controller.inner.state.lock().borrow().token;
        controller.set_location(ELSEWHERE);

        controller.inner.commit(
            stale_token,
            &[DataSet::ForecastNextHour],
            Err(ApiError::Response("late".into()).into()),
        );

        assert!(controller.next_hour().get().is_absent());
    }

    #[tokio::test]
    async fn changing_location_clears_data() {
        let (controller, client) = controller(MockApiClient::demo().unwrap());
        let mut hours = record(controller.next_hour());
        let mut days = record(controller.next_days());

        controller.get_data(&[DataSet::ForecastNextHour, DataSet::ForecastDaily]);
        assert!(next(&mut hours).await.is_success());
        assert!(next(&mut days).await.is_success());

        let (tx, mut locations) = mpsc::unbounded_channel();
        let hour_channel = Arc::clone(&controller.inner);
        controller.location_channel().subscribe(move |location| {
            // channels must already be clear when the location is published
            let _ = tx.send((*location, hour_channel.next_hour.get().is_absent()));
        });

        controller.set_location(ELSEWHERE);

        assert!(controller.next_hour().get().is_absent());
        assert!(controller.next_days().get().is_absent());
        assert!(controller.days_temperature_range().is_none());
        assert_eq!(controller.location(), ELSEWHERE);
        assert_eq!(next(&mut locations).await, (ELSEWHERE, true));

        assert!(controller.get_data(&[DataSet::ForecastDaily]));
        assert!(next(&mut days).await.is_absent());
        assert!(next(&mut days).await.is_success());
        assert_eq!(client.requests()[1].resource, "/api/v1/weather/en/1/1");
    }

    #[tokio::test]
    async fn setting_same_location_keeps_data() {
        let (controller, _) = controller(MockApiClient::demo().unwrap());
        let mut hours = record(controller.next_hour());

        controller.get_data(&[DataSet::ForecastNextHour]);
        assert!(next(&mut hours).await.is_success());

        controller.set_location(LONDON);

        assert!(controller.next_hour().get().is_success());
        assert!(hours.try_recv().is_err());
    }

    #[tokio::test]
    async fn location_change_from_callback_drops_rest_of_commit() {
        let client = Arc::new(MockApiClient::demo().unwrap());
        let controller = Arc::new(ForecastController::new(
            Arc::clone(&client),
            LONDON,
            ControllerOptions::default(),
        ));
        let mut days = record(controller.next_days());

        let weak = Arc::downgrade(&controller);
        controller.next_hour().subscribe(move |result| {
            if let (true, Some(controller)) = (result.is_success(), weak.upgrade()) {
                controller.set_location(ELSEWHERE);
            }
        });

        controller.get_data(&[DataSet::ForecastNextHour, DataSet::ForecastDaily]);

        // only the clear from the location change arrives on next-days
        assert!(next(&mut days).await.is_absent());
        settle().await;
        assert!(days.try_recv().is_err());
        assert!(controller.next_hour().get().is_absent());
        assert_eq!(controller.location(), ELSEWHERE);
    }

    #[tokio::test]
    async fn retry_from_failure_callback_starts_new_fetch() {
        let client = Arc::new(MockApiClient::demo().unwrap().failing("offline"));
        let controller = Arc::new(ForecastController::new(
            Arc::clone(&client),
            LONDON,
            ControllerOptions::default(),
        ));
        let mut hours = record(controller.next_hour());

        let weak = Arc::downgrade(&controller);
        let retried = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&retried);
        controller.next_hour().subscribe(move |result| {
            let first = !flag.swap(true, std::sync::atomic::Ordering::SeqCst);
            if let (true, true, Some(controller)) = (result.is_failure(), first, weak.upgrade()) {
                assert!(controller.get_data(&[DataSet::ForecastNextHour]));
            }
        });

        controller.get_data(&[DataSet::ForecastNextHour]);

        assert!(next(&mut hours).await.is_failure());
        assert!(next(&mut hours).await.is_failure());
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn empty_data_sets_do_nothing() {
        let (controller, client) = controller(MockApiClient::demo().unwrap());

        assert!(!controller.get_data(&[]));
        settle().await;

        assert_eq!(client.calls(), 0);
        assert!(!controller.is_fetching());
    }

    #[test]
    fn get_data_outside_runtime_does_nothing() {
        let (controller, client) = controller(MockApiClient::demo().unwrap());

        assert!(!controller.get_data(&[DataSet::ForecastDaily]));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn request_uses_options_and_deduplicated_data_sets() {
        let start = "2022-11-14T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let client = Arc::new(MockApiClient::demo().unwrap());
        let options = ControllerOptions {
            country_code: "IE".into(),
            timezone: "Europe/Dublin".into(),
            forecast_start: Some(start),
            ..ControllerOptions::default()
        };
        let controller = ForecastController::new(Arc::clone(&client), LONDON, options);
        let mut days = record(controller.next_days());

        controller.get_data(&[DataSet::ForecastDaily, DataSet::ForecastDaily]);
        next(&mut days).await;

        let request = &client.requests()[0];
        assert_eq!(request.query("country"), Some("IE"));
        assert_eq!(request.query("timezone"), Some("Europe/Dublin"));
        assert_eq!(request.query("dataSets"), Some("forecastDaily"));
        assert_eq!(request.query("dailyStart"), Some("2022-11-14T00:00:00Z"));
        assert_eq!(request.query("hourlyStart"), Some("2022-11-14T00:00:00Z"));
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        let client = Arc::new(MockApiClient::demo().unwrap().held());
        let options = ControllerOptions {
            timeout: Duration::from_millis(50),
            ..ControllerOptions::default()
        };
        let controller = ForecastController::new(client, LONDON, options);
        let mut hours = record(controller.next_hour());

        controller.get_data(&[DataSet::ForecastNextHour]);

        let err = next(&mut hours).await.failure().cloned().expect("failure");
        assert!(matches!(err, FetchError::Api(ref e) if matches!(**e, ApiError::Timeout(_))));
        assert!(!controller.is_fetching());
    }

    #[tokio::test]
    async fn dropping_controller_aborts_fetch() {
        let (controller, client) = controller(MockApiClient::demo().unwrap().held());
        let mut hours = record(controller.next_hour());

        assert!(controller.get_data(&[DataSet::ForecastNextHour]));
        settle().await;
        drop(controller);

        // the aborted task releases the last handle on the channels
        let closed = tokio::time::timeout(Duration::from_secs(2), hours.recv())
            .await
            .expect("fetch task was not aborted");
        assert!(closed.is_none());
        assert_eq!(client.calls(), 1);
    }

    #[derive(Debug)]
    struct PanickingClient;

    #[async_trait::async_trait]
    impl ApiClient for PanickingClient {
        async fn perform<R: ApiRequest>(&self, _request: &R) -> Result<R::Response, ApiError> {
            panic!("client bug");
        }
    }

    #[tokio::test]
    async fn panicking_client_fails_channels_and_allows_retry() {
        let controller = ForecastController::new(
            Arc::new(PanickingClient),
            LONDON,
            ControllerOptions::default(),
        );
        let mut hours = record(controller.next_hour());
        let mut days = record(controller.next_days());

        assert!(controller.get_data(&[DataSet::ForecastNextHour, DataSet::ForecastDaily]));

        let hour = next(&mut hours).await;
        let day = next(&mut days).await;
        assert!(matches!(hour.failure(), Some(FetchError::Interrupted)));
        assert!(matches!(day.failure(), Some(FetchError::Interrupted)));
        assert!(!controller.is_fetching());
        assert!(controller.get_data(&[DataSet::ForecastNextHour]));
    }

    #[test]
    fn runtime_without_timers_does_not_wedge_controller() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let (controller, client) = controller(MockApiClient::demo().unwrap());
        let mut hours = record(controller.next_hour());

        runtime.block_on(async {
            assert!(controller.get_data(&[DataSet::ForecastNextHour]));
            for _ in 0..50 {
                tokio::task::yield_now().await;
            }

            // the timeout cannot be armed, so the task dies before calling the client
            assert_eq!(client.calls(), 0);
            assert!(!controller.is_fetching());
            assert!(matches!(
                hours.try_recv().ok().as_ref().and_then(FetchResult::failure),
                Some(FetchError::Interrupted)
            ));
            assert!(controller.get_data(&[DataSet::ForecastNextHour]));
        });
    }
}
