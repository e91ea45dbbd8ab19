use std::num::NonZeroUsize;

use itertools::Itertools;
use ordered_float::OrderedFloat;

/// Mean earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Number of neighbors returned when the caller does not ask for a specific count.
pub const DEFAULT_COUNT: NonZeroUsize = match NonZeroUsize::new(2) {
    Some(count) => count,
    None => unreachable!(),
};

/// A point on the earth's surface, in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine(*self, *other, EARTH_RADIUS_KM)
    }
}

/// Anything that sits at a fixed position.
pub trait Located {
    fn coordinates(&self) -> Coordinates;
}

impl Located for Coordinates {
    fn coordinates(&self) -> Coordinates {
        *self
    }
}

/// Great-circle distance between two points on a sphere with the given radius.
pub fn haversine(from: Coordinates, to: Coordinates, radius: f64) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_long = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos() * to.latitude.to_radians().cos() * (d_long / 2.0).sin().powi(2);

    // rounding can push `a` just past 1 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    radius * c
}

#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor<T> {
    pub item: T,
    pub distance: f64,
}

/// Ranks `items` by their distance to `query` and returns the closest `count` of them.
///
/// Items at equal distance keep their input order. Returns `None` if there
/// was nothing to rank at all.
pub fn nearest<T: Located>(
    query: Coordinates,
    items: impl IntoIterator<Item=T>,
    count: NonZeroUsize,
    radius: f64,
) -> Option<Vec<Neighbor<T>>> {
    let mut items = items.into_iter().peekable();
    items.peek()?;

    let neighbors = items
        .map(|item| {
            let distance = haversine(query, item.coordinates(), radius);
            Neighbor { item, distance }
        })
        .sorted_by_key(|neighbor| OrderedFloat(neighbor.distance))
        .take(count.get())
        .collect_vec();

    Some(neighbors)
}
