use std::str::FromStr;

use anyhow::{Context, Result};
use nearcity_geo::Coordinates;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

use crate::nearcity::{db, City, CityId};

/// Persistent collection of cities. Cheap to clone, all clones share the same pool.
#[derive(Clone)]
pub struct CityStore {
    db: SqlitePool,
}

impl CityStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Connects to the sqlite database at `url`, creating it if needed, and
    /// brings the schema up to date.
    pub async fn open(url: &str) -> Result<Self> {
        info!("Open database {:?}", url);

        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("parse database url {:?}", url))?
            .create_if_missing(true);

        let db = SqlitePoolOptions::new().connect_with(options).await?;

        let store = Self::new(db);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(city = %name, ? coordinates))]
    pub async fn create(&self, name: &str, coordinates: Coordinates) -> Result<City> {
        let mut tx = self.db.begin().await?;
        let city = db::insert_city(&mut tx, name, coordinates).await?;
        tx.commit().await?;

        debug!("Stored city {:?} with id {}", city.name, city.id);
        Ok(city)
    }

    #[instrument(skip_all)]
    pub async fn list(&self) -> Result<Vec<City>> {
        let mut tx = self.db.begin().await?;
        let cities = db::read_cities(&mut tx).await?;
        tx.commit().await?;

        Ok(cities)
    }

    /// Removes the city with the given id. Returns false if it did not exist.
    #[instrument(skip_all, fields(% id))]
    pub async fn delete(&self, id: CityId) -> Result<bool> {
        let mut tx = self.db.begin().await?;
        let deleted = db::delete_city(&mut tx, id).await?;
        tx.commit().await?;

        Ok(deleted)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A store backed by a private in-memory database.
    pub async fn memory_store() -> CityStore {
        // every connection to sqlite::memory: opens its own database, so keep exactly one around
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let store = CityStore::new(db);
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn create_assigns_ids() {
        let store = memory_store().await;

        let berlin = store.create("Berlin", Coordinates::new(52.52, 13.405)).await.unwrap();
        let paris = store.create("Paris", Coordinates::new(48.8566, 2.3522)).await.unwrap();

        assert_ne!(berlin.id, paris.id);
        assert_eq!(berlin.name, "Berlin");
        assert_eq!(berlin.latitude, 52.52);
        assert_eq!(berlin.longitude, 13.405);
    }

    #[tokio::test]
    async fn list_returns_cities_in_insertion_order() {
        let store = memory_store().await;
        assert!(store.list().await.unwrap().is_empty());

        let a = store.create("A", Coordinates::new(0.0, 0.0)).await.unwrap();
        let b = store.create("B", Coordinates::new(0.0, 10.0)).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn delete_removes_city() {
        let store = memory_store().await;

        let a = store.create("A", Coordinates::new(0.0, 0.0)).await.unwrap();
        let b = store.create("B", Coordinates::new(0.0, 10.0)).await.unwrap();

        assert!(store.delete(a.id).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![b.clone()]);

        // second delete finds nothing
        assert!(!store.delete(a.id).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn delete_unknown_id_changes_nothing() {
        let store = memory_store().await;
        let a = store.create("A", Coordinates::new(0.0, 0.0)).await.unwrap();

        assert!(!store.delete(CityId::from(a.id.0 + 100)).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![a]);
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let store = memory_store().await;

        let a = store.create("A", Coordinates::new(0.0, 0.0)).await.unwrap();
        store.delete(a.id).await.unwrap();

        let b = store.create("B", Coordinates::new(1.0, 1.0)).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
