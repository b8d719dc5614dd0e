use serde::Deserialize;

use crate::error::ClientError;
use crate::models::{Coordinate, Way};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

const SERVICE: &str = "Overpass";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.lat >= self.min_lat
            && coord.lat <= self.max_lat
            && coord.lon >= self.min_lon
            && coord.lon <= self.max_lon
    }

    /// Square box of half-side `radius_m` around `center`, clamped to valid degrees.
    pub fn around(center: Coordinate, radius_m: f64) -> Self {
        // Approximate: 1 degree latitude ≈ 111 km
        let lat_margin = radius_m / 111_000.0;
        let cos_lat = center.lat.to_radians().cos().abs().max(0.1);
        let lon_margin = radius_m / (111_000.0 * cos_lat);

        Self {
            min_lat: (center.lat - lat_margin).max(-90.0),
            max_lat: (center.lat + lat_margin).min(90.0),
            min_lon: (center.lon - lon_margin).clamp(-180.0, 180.0),
            max_lon: (center.lon + lon_margin).clamp(-180.0, 180.0),
        }
    }

    /// Overpass QL bbox filter order: south, west, north, east.
    fn to_overpass(self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

/// Rideable ways inside `bbox`: dedicated cycleways, roads carrying any
/// `cycleway` tag, and paths or footways open to bicycles.
pub fn build_query(bbox: BoundingBox) -> String {
    let b = bbox.to_overpass();
    format!(
        r#"[out:json][timeout:25];
(
  way["highway"="cycleway"]({b});
  way["cycleway"~"."]({b});
  way["highway"~"^(path|footway)$"]["bicycle"="yes"]({b});
);
out geom;"#
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    geometry: Option<Vec<Option<GeometryPoint>>>,
}

#[derive(Debug, Deserialize)]
struct GeometryPoint {
    lat: f64,
    lon: f64,
}

impl OverpassResponse {
    fn into_ways(self) -> Vec<Way> {
        self.elements
            .into_iter()
            .filter(|el| el.kind == "way")
            .filter_map(|el| {
                // Nodes missing from the extract come back as null entries
                let path = el
                    .geometry?
                    .into_iter()
                    .flatten()
                    .map(|p| Coordinate { lat: p.lat, lon: p.lon })
                    .collect();
                Some(Way::new(el.id, path))
            })
            .collect()
    }
}

/// Parse an Overpass `out geom` JSON document into unrated ways.
pub fn parse_ways(body: &str) -> Result<Vec<Way>, serde_json::Error> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    Ok(response.into_ways())
}

#[derive(Debug, Clone)]
pub struct OverpassClient {
    http: reqwest::Client,
    url: String,
}

impl Default for OverpassClient {
    fn default() -> Self {
        Self::new(DEFAULT_OVERPASS_URL)
    }
}

impl OverpassClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub async fn fetch_ways(&self, bbox: BoundingBox) -> Result<Vec<Way>, ClientError> {
        let query = build_query(bbox);
        tracing::debug!("Fetching ways from {}: {query}", self.url);

        let response = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query)
            .send()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))?;

        let response: OverpassResponse = ClientError::check(SERVICE, response)?
            .json()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))?;

        let ways = response.into_ways();
        tracing::info!("Overpass returned {} ways", ways.len());
        Ok(ways)
    }
}
