use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    config::{LocationConfig, LocationSource},
    error::{LocationFailure, PipelineFailure},
    model::{Coordinates, LocationRequest},
};

pub mod ip;

pub use ip::IpLocationProvider;

/// Stage one: where is the device right now.
#[async_trait]
pub trait LocationProvider: Send + Sync + Debug {
    /// `Ok(None)` means the service answered without producing a fix.
    async fn locate(
        &self,
        request: &LocationRequest,
    ) -> Result<Option<Coordinates>, LocationFailure>;

    fn is_supported(&self) -> bool {
        true
    }
}

/// One attempt at resolving coordinates, no retry.
pub async fn resolve(
    provider: &dyn LocationProvider,
    request: &LocationRequest,
) -> Result<Coordinates, PipelineFailure> {
    match provider.locate(request).await {
        Ok(Some(coords)) if coords.is_valid() => Ok(coords),
        Ok(Some(coords)) => Err(LocationFailure::Other(format!(
            "coordinates out of range: {}, {}",
            coords.latitude, coords.longitude
        ))
        .into()),
        Ok(None) => Err(PipelineFailure::EmptyLocation),
        Err(e) => Err(e.into()),
    }
}

/// Coordinates supplied up front, from config or the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    coords: Coordinates,
}

impl FixedLocationProvider {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn locate(
        &self,
        _request: &LocationRequest,
    ) -> Result<Option<Coordinates>, LocationFailure> {
        Ok(Some(self.coords))
    }
}

/// A host without any location capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocationProvider;

#[async_trait]
impl LocationProvider for UnsupportedLocationProvider {
    async fn locate(
        &self,
        _request: &LocationRequest,
    ) -> Result<Option<Coordinates>, LocationFailure> {
        Err(LocationFailure::Unsupported)
    }

    fn is_supported(&self) -> bool {
        false
    }
}

/// Applies capability, service switch, permission and timeout, in that order,
/// before delegating to the wrapped provider.
#[derive(Debug)]
pub struct GuardedLocationProvider {
    inner: Box<dyn LocationProvider>,
    enabled: bool,
    permission_granted: bool,
}

impl GuardedLocationProvider {
    pub fn new(inner: Box<dyn LocationProvider>, enabled: bool, permission_granted: bool) -> Self {
        Self { inner, enabled, permission_granted }
    }
}

#[async_trait]
impl LocationProvider for GuardedLocationProvider {
    async fn locate(
        &self,
        request: &LocationRequest,
    ) -> Result<Option<Coordinates>, LocationFailure> {
        if !self.inner.is_supported() {
            return Err(LocationFailure::Unsupported);
        }
        if !self.enabled {
            return Err(LocationFailure::Disabled);
        }
        if !self.permission_granted {
            return Err(LocationFailure::PermissionDenied);
        }

        match tokio::time::timeout(request.timeout, self.inner.locate(request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    timeout_ms = request.timeout.as_millis() as u64,
                    "location request timed out"
                );
                Ok(None)
            }
        }
    }

    fn is_supported(&self) -> bool {
        self.inner.is_supported()
    }
}

/// Build the guarded provider for the configured source.
pub fn location_provider_from_config(
    config: &LocationConfig,
    user_agent: &str,
) -> anyhow::Result<Box<dyn LocationProvider>> {
    let inner: Box<dyn LocationProvider> = match config.source {
        LocationSource::Ip => Box::new(IpLocationProvider::new(user_agent)?),
        LocationSource::Fixed => {
            let coords = config.fixed_coordinates().ok_or_else(|| {
                anyhow::anyhow!(
                    "Location source 'fixed' has no coordinates configured.\n\
                     Hint: run `geoweather configure` or pass --lat and --lon."
                )
            })?;
            Box::new(FixedLocationProvider::new(coords))
        }
        LocationSource::None => Box::new(UnsupportedLocationProvider),
    };

    Ok(Box::new(GuardedLocationProvider::new(inner, config.enabled, config.permission_granted)))
}
