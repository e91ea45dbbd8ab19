use std::sync::Arc;

use anyhow::Result;

use crate::nearcity::geocoder::HttpGeocoder;
use crate::nearcity::store::CityStore;

pub mod nearcity;
pub mod nearcity_web;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./nearcity.config.yaml".to_owned());

    let config = nearcity::config::load(&config_path)?;

    let telemetry = nearcity::telemetry::init(config.otlp_endpoint.as_deref())?;

    let store = CityStore::open(&config.database).await?;
    let geocoder = HttpGeocoder::new(&config.geocoder)?;

    let result = nearcity_web::serve(nearcity_web::Options {
        store,
        geocoder: Arc::new(geocoder),
        nearest: config.nearest,
        addr: config.http_address,
    }).await;

    telemetry.shutdown();

    result
}
