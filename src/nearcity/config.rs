use std::fs::File;
use std::num::{NonZeroU64, NonZeroUsize};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable consulted when the config file carries no api key.
pub const API_KEY_ENV: &str = "NEARCITY_GEOCODER_API_KEY";

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearcityConfig {
    pub http_address: String,

    // sqlite database url
    pub database: String,

    pub geocoder: GeocoderConfig,

    #[serde(default)]
    pub nearest: NearestConfig,

    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocoderConfig {
    /// Base url of the geocoding api, without the `/v1/geocoding` path.
    pub url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "timeout_in_seconds_default")]
    pub timeout_in_seconds: NonZeroU64,
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_in_seconds.get())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestConfig {
    /// Number of cities returned by a nearest query without an explicit count.
    #[serde(default = "count_default")]
    pub count: NonZeroUsize,

    #[serde(default = "earth_radius_km_default")]
    pub earth_radius_km: f64,
}

impl Default for NearestConfig {
    fn default() -> Self {
        Self {
            count: count_default(),
            earth_radius_km: earth_radius_km_default(),
        }
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<NearcityConfig> {
    let path = path.as_ref();

    let fp = File::open(path).with_context(|| format!("open config {:?}", path))?;
    let mut config: NearcityConfig = serde_yaml::from_reader(fp)
        .with_context(|| format!("parse config {:?}", path))?;

    let from_file = config.geocoder.api_key.take().filter(|key| !key.is_empty());
    config.geocoder.api_key = from_file.or_else(|| std::env::var(API_KEY_ENV).ok());

    Ok(config)
}

fn timeout_in_seconds_default() -> NonZeroU64 {
    NonZeroU64::new(10).unwrap_or(NonZeroU64::MIN)
}

fn count_default() -> NonZeroUsize {
    nearcity_geo::DEFAULT_COUNT
}

fn earth_radius_km_default() -> f64 {
    nearcity_geo::EARTH_RADIUS_KM
}
