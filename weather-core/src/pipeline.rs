use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    client::WeatherClient,
    config::Config,
    error::{Busy, PipelineFailure},
    location::{self, LocationProvider, location_provider_from_config},
    model::LocationRequest,
    presenter::{self, Screen, ViewState},
};

/// Location, then weather, then display; one trigger at a time.
///
/// Clones share the in-flight flag, so a trigger on any clone is rejected
/// while another clone is still running.
#[derive(Debug, Clone)]
pub struct WeatherPipeline {
    location: Arc<dyn LocationProvider>,
    request: LocationRequest,
    client: WeatherClient,
    in_flight: Arc<AtomicBool>,
}

impl WeatherPipeline {
    pub fn new(location: Box<dyn LocationProvider>, client: WeatherClient) -> Self {
        Self {
            location: Arc::from(location),
            request: LocationRequest::default(),
            client,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_location_request(mut self, request: LocationRequest) -> Self {
        self.request = request;
        self
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = config.weather_client()?;
        let location = location_provider_from_config(&config.location, &config.user_agent)?;

        Ok(Self::new(location, client).with_location_request(config.location.request()))
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run once from an empty view.
    pub async fn trigger(&self, screen: &mut dyn Screen) -> Result<ViewState, Busy> {
        self.trigger_from(ViewState::default(), screen).await
    }

    /// Run once, starting from the view currently on screen.
    ///
    /// Returns [`Busy`] without touching the screen if another run holds the
    /// in-flight flag. The returned view always has `loading == false`.
    pub async fn trigger_from(
        &self,
        previous: ViewState,
        screen: &mut dyn Screen,
    ) -> Result<ViewState, Busy> {
        let Some(_flight) = InFlight::claim(&self.in_flight) else {
            tracing::debug!("trigger ignored, request already in flight");
            return Err(Busy);
        };

        let mut scope = LoadingScope::enter(screen, previous);

        if let Err(failure) = self.run(&mut scope).await {
            tracing::warn!(error = %failure, "weather request failed");
            scope.update(|view| view.show_error(failure.user_message()));
        }

        Ok(scope.finish())
    }

    async fn run(&self, scope: &mut LoadingScope<'_>) -> Result<(), PipelineFailure> {
        let coords = location::resolve(self.location.as_ref(), &self.request).await?;
        tracing::debug!(lat = coords.latitude, lon = coords.longitude, "location obtained");
        scope.update(|view| view.set_location(coords));

        let snapshot = self.client.fetch(coords).await?;

        let details = presenter::render(&snapshot)?;
        scope.update(|view| view.show_details(details));
        tracing::info!(location = %snapshot.location_name, "weather displayed");

        Ok(())
    }
}

/// Held for the duration of one run; releases the flag on drop.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Loading indicator on entry, off on every exit path, including the
/// trigger future being dropped mid-flight.
struct LoadingScope<'a> {
    screen: &'a mut dyn Screen,
    view: ViewState,
    finished: bool,
}

impl<'a> LoadingScope<'a> {
    fn enter(screen: &'a mut dyn Screen, mut view: ViewState) -> Self {
        view.begin_loading();
        screen.render(&view);
        Self { screen, view, finished: false }
    }

    fn update(&mut self, f: impl FnOnce(&mut ViewState)) {
        f(&mut self.view);
        self.screen.render(&self.view);
    }

    fn finish(mut self) -> ViewState {
        self.close();
        std::mem::take(&mut self.view)
    }

    fn close(&mut self) {
        if !self.finished {
            self.finished = true;
            self.view.end_loading();
            self.screen.render(&self.view);
        }
    }
}

impl Drop for LoadingScope<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
