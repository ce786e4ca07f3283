// SPDX-License-Identifier: MIT

//! WGS84 coordinates and great-circle distance.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

/// Great-circle distance in meters on a spherical Earth (haversine).
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}

/// A latitude/longitude box used to pre-filter dynamic-zone candidates
/// before the exact distance check.
///
/// Zones in this domain are small (<= 1 km) and far from the poles, so
/// longitude wrap-around and pole proximity are not handled.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Meters per degree of latitude on the spherical Earth model.
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

impl BoundingBox {
    /// Degree box covering a circle of `radius_meters` around `center`.
    pub fn around(center: Coordinate, radius_meters: f64) -> Self {
        let dlat = radius_meters / METERS_PER_DEGREE_LAT;
        let dlng = radius_meters / (METERS_PER_DEGREE_LAT * center.lat.to_radians().cos().abs());
        Self {
            min_lat: center.lat - dlat,
            max_lat: center.lat + dlat,
            min_lng: center.lng - dlng,
            max_lng: center.lng + dlng,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }
}
