use std::num::NonZeroUsize;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use itertools::Itertools;
use nearcity_geo::{Coordinates, Neighbor};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::nearcity::{City, CityId};
use crate::nearcity_web::handlers::WebError;
use crate::nearcity_web::AppState;

#[derive(Deserialize)]
pub struct CreateCityRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct NearestQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub count: Option<usize>,
}

#[derive(Serialize)]
struct MessageView {
    message: &'static str,
}

#[derive(Serialize)]
struct NearestCityView<'a> {
    name: &'a str,
    latitude: f64,
    longitude: f64,
    distance: f64,
}

impl<'a> From<&'a Neighbor<City>> for NearestCityView<'a> {
    fn from(neighbor: &'a Neighbor<City>) -> Self {
        Self {
            name: &neighbor.item.name,
            latitude: neighbor.item.latitude,
            longitude: neighbor.item.longitude,
            distance: neighbor.distance,
        }
    }
}

#[instrument(skip_all)]
pub async fn handle_city_create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCityRequest>,
) -> Result<Response, WebError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(WebError::bad_request("City name must not be empty"));
    }

    let coordinates = state
        .geocoder
        .locate(name)
        .await
        .map_err(WebError::bad_gateway)?;

    let Some(coordinates) = coordinates else {
        info!("Could not geocode city {:?}", name);
        return Err(WebError::bad_request("Failed to retrieve city coordinates"));
    };

    let city = state.store.create(name, coordinates).await?;
    info!("Added city {:?} with id {}", city.name, city.id);

    Ok((StatusCode::CREATED, Json(city)).into_response())
}

#[instrument(skip_all, fields(% id))]
pub async fn handle_city_delete(
    Path(id): Path<CityId>,
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    if !state.store.delete(id).await? {
        return Err(WebError::not_found("City not found"));
    }

    info!("Deleted city {}", id);

    let message = MessageView { message: "City deleted successfully" };
    Ok(Json(message).into_response())
}

#[instrument(skip_all)]
pub async fn handle_cities_get(State(state): State<AppState>) -> Result<Response, WebError> {
    let cities = state.store.list().await?;
    Ok(Json(cities).into_response())
}

#[instrument(skip_all, fields(latitude = query.latitude, longitude = query.longitude))]
pub async fn handle_nearest_get(
    Query(query): Query<NearestQuery>,
    State(state): State<AppState>,
) -> Result<Response, WebError> {
    let count = match query.count {
        None => state.nearest.count,
        Some(count) => NonZeroUsize::new(count)
            .ok_or_else(|| WebError::bad_request("count must be at least 1"))?,
    };

    let origin = Coordinates::new(query.latitude, query.longitude);

    let cities = state.store.list().await?;
    let nearest = nearcity_geo::nearest(origin, cities, count, state.nearest.earth_radius_km)
        .ok_or_else(|| WebError::not_found("No cities found in the database"))?;

    let view = nearest.iter().map(NearestCityView::from).collect_vec();
    Ok(Json(view).into_response())
}
