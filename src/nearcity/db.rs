use std::ops::DerefMut;

use anyhow::Result;
use nearcity_geo::Coordinates;
use sqlx::{Sqlite, Transaction};

use crate::nearcity::{City, CityId};

#[derive(sqlx::FromRow)]
struct CityRow {
    pub id: CityId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

/// Inserts a new city and returns it with its generated id.
pub async fn insert_city(tx: &mut Transaction<'_, Sqlite>, name: &str, coordinates: Coordinates) -> Result<City> {
    let row: CityRow = sqlx::query_as("INSERT INTO city (name, latitude, longitude) VALUES (?, ?, ?) RETURNING id, name, latitude, longitude")
        .bind(name)
        .bind(coordinates.latitude)
        .bind(coordinates.longitude)
        .fetch_one(tx.deref_mut())
        .await?;

    Ok(row.into())
}

pub async fn read_cities(tx: &mut Transaction<'_, Sqlite>) -> Result<Vec<City>> {
    let rows: Vec<CityRow> = sqlx::query_as("SELECT id, name, latitude, longitude FROM city ORDER BY id")
        .fetch_all(tx.deref_mut())
        .await?;

    Ok(rows.into_iter().map(City::from).collect())
}

/// Deletes the city with the given id. Returns false if there was no such city.
pub async fn delete_city(tx: &mut Transaction<'_, Sqlite>, id: CityId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM city WHERE id=?")
        .bind(id)
        .execute(tx.deref_mut())
        .await?;

    Ok(result.rows_affected() > 0)
}
