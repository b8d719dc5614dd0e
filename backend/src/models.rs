use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use skatemap_shared::{ApiError, Coordinate, Quality, Way};

/// A rating as it travels over HTTP.
///
/// `quality` uses the numeric wire format (see [`quality_score`]); a missing
/// or `null` quality resets the way to unrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WayQuality {
    pub way_id: i64,
    #[serde(default, with = "quality_score")]
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl WayQuality {
    pub fn new(way_id: i64, quality: Quality) -> Self {
        Self {
            way_id,
            quality,
            timestamp: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn at(mut self, location: Coordinate) -> Self {
        self.latitude = Some(location.lat);
        self.longitude = Some(location.lon);
        self
    }

    /// Where the rating was submitted from, if both halves are present.
    pub fn location(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate { lat, lon }),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match (self.latitude, self.longitude) {
            (None, None) => Ok(()),
            (Some(_), Some(_)) => match self.location() {
                Some(location) if location.is_valid() => Ok(()),
                _ => Err(format!(
                    "way {}: coordinates out of range ({:?}, {:?})",
                    self.way_id, self.latitude, self.longitude
                )),
            },
            _ => Err(format!(
                "way {}: latitude and longitude must be given together",
                self.way_id
            )),
        }
    }
}

/// Numeric wire/database format of [`Quality`]: `1` good, `0` medium,
/// `-1` bad, `null` unrated.
pub mod quality_score {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    use super::Quality;

    pub fn to_score(quality: Quality) -> Option<i16> {
        match quality {
            Quality::Good => Some(1),
            Quality::Medium => Some(0),
            Quality::Bad => Some(-1),
            Quality::Unrated => None,
        }
    }

    pub fn from_score(score: Option<i16>) -> Result<Quality, i16> {
        match score {
            Some(1) => Ok(Quality::Good),
            Some(0) => Ok(Quality::Medium),
            Some(-1) => Ok(Quality::Bad),
            None => Ok(Quality::Unrated),
            Some(other) => Err(other),
        }
    }

    pub fn serialize<S: Serializer>(quality: &Quality, serializer: S) -> Result<S::Ok, S::Error> {
        to_score(*quality).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Quality, D::Error> {
        let score = Option::<i16>::deserialize(deserializer)?;
        from_score(score)
            .map_err(|other| D::Error::custom(format!("unknown quality score {other}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scores_match_wire_format() {
        let entries: Vec<WayQuality> = serde_json::from_value(json!([
            {"wayId": 1, "quality": 1},
            {"wayId": 2, "quality": 0},
            {"wayId": 3, "quality": -1},
            {"wayId": 4, "quality": null},
            {"wayId": 5}
        ]))
        .unwrap();

        let qualities: Vec<Quality> = entries.iter().map(|e| e.quality).collect();
        assert_eq!(
            qualities,
            vec![
                Quality::Good,
                Quality::Medium,
                Quality::Bad,
                Quality::Unrated,
                Quality::Unrated
            ]
        );
    }

    #[test]
    fn test_unknown_score_is_rejected() {
        let result = serde_json::from_value::<WayQuality>(json!({"wayId": 1, "quality": 2}));
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_unrated_as_null() {
        let value = serde_json::to_value(WayQuality::new(7, Quality::Unrated)).unwrap();
        assert_eq!(
            value,
            json!({"wayId": 7, "quality": null, "latitude": null, "longitude": null})
        );
    }

    #[test]
    fn test_validate_coordinates() {
        let base = WayQuality::new(1, Quality::Good);
        assert!(base.validate().is_ok());
        assert!(base
            .clone()
            .at(Coordinate { lat: 55.67, lon: 13.07 })
            .validate()
            .is_ok());
        assert!(base
            .clone()
            .at(Coordinate { lat: 95.0, lon: 13.07 })
            .validate()
            .is_err());

        let half = WayQuality {
            latitude: Some(55.67),
            ..base
        };
        assert!(half.validate().is_err());
    }

    #[test]
    fn test_score_round_trip_for_every_level() {
        for quality in [Quality::Good, Quality::Medium, Quality::Bad, Quality::Unrated] {
            assert_eq!(quality_score::from_score(quality_score::to_score(quality)), Ok(quality));
        }
        assert_eq!(quality_score::from_score(Some(3)), Err(3));
    }
}
