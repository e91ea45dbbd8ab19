use derive_more::{Display, From};
use nearcity_geo::{Coordinates, Located};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod db;
pub mod geocoder;
pub mod store;
pub mod telemetry;

/// Identifier of a stored [City]. Assigned by the database, never reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, From, Display)]
#[derive(Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct CityId(i64);

/// A named city at a fixed, geocoded position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Located for City {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
