pub mod geometry;

use serde::{Deserialize, Serialize};

pub use geometry::{closest_path, closest_path_with_distance, distance_to_segment, haversine_m};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Surface rating of a way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Good,
    Medium,
    Bad,
    #[default]
    Unrated,
}

/// A rideable map way: an OSM way id and its polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: i64,
    pub path: Vec<Coordinate>,
    #[serde(default)]
    pub quality: Quality,
}

impl Way {
    pub fn new(id: i64, path: Vec<Coordinate>) -> Self {
        Self {
            id,
            path,
            quality: Quality::Unrated,
        }
    }

    /// Consecutive coordinate pairs. Empty for ways with fewer than two points.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.path.windows(2).map(|pair| Segment {
            start: pair[0],
            end: pair[1],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Coordinate,
    pub end: Coordinate,
}

impl Segment {
    pub fn distance_to(&self, point: Coordinate) -> f64 {
        distance_to_segment(point, self.start, self.end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
