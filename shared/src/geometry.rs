use crate::{Coordinate, Way};

/// Mean Earth radius, in meters, used by web map libraries.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `h` just past 1 for near-antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Distance in meters from `point` to the closed segment `[start, end]`.
///
/// The closest point is found by projecting in degree space (longitude as X,
/// latitude as Y), which only holds at city scale: poles and the antimeridian
/// are not handled. The reported distance is the haversine distance between
/// `point` and that closest point.
///
/// A zero-length segment behaves as the single point `start`.
pub fn distance_to_segment(point: Coordinate, start: Coordinate, end: Coordinate) -> f64 {
    let line_x = end.lon - start.lon;
    let line_y = end.lat - start.lat;
    let length_sq = line_x * line_x + line_y * line_y;

    if length_sq == 0.0 {
        return haversine_m(point, start);
    }

    let point_x = point.lon - start.lon;
    let point_y = point.lat - start.lat;
    let t = (point_x * line_x + point_y * line_y) / length_sq;

    let closest = if t < 0.0 {
        start
    } else if t > 1.0 {
        end
    } else {
        start.interpolate(end, t)
    };

    haversine_m(point, closest)
}

/// The way whose nearest segment is closest to `point`, along with that
/// distance in meters.
///
/// Ways with fewer than two coordinates have no segments and are skipped.
/// Only a strictly smaller distance replaces the current best, so on ties the
/// earliest way in `ways` wins.
pub fn closest_path_with_distance(point: Coordinate, ways: &[Way]) -> Option<(&Way, f64)> {
    let (best, distance) = ways
        .iter()
        .flat_map(|way| way.segments().map(move |segment| (way, segment)))
        .fold((None, f64::INFINITY), |(best, min), (way, segment)| {
            let distance = segment.distance_to(point);
            if distance < min {
                (Some(way), distance)
            } else {
                (best, min)
            }
        });

    best.map(|way| (way, distance))
}

/// The way closest to `point`, or `None` if no way has a segment.
pub fn closest_path(point: Coordinate, ways: &[Way]) -> Option<&Way> {
    closest_path_with_distance(point, ways).map(|(way, _)| way)
}
