//! Geometry to distance reduction.
//!
//! Turns any supported [`Geometry`] into a single comparable distance from a
//! reference coordinate, and into a single representative position for
//! display. Both reductions are approximations kept for numeric
//! compatibility with existing consumers:
//!
//! - polygon position is the vertex mean of the outer ring, not an
//!   area-weighted centroid
//! - polygon distance is the distance to the nearest outer-ring vertex; edges
//!   are not considered

use tracing::debug;

use crate::models::{Coordinate, Geometry, Position};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance in kilometres between two coordinates.
///
/// Uses the haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
///
/// # Example
///
/// ```
/// use geofeed_core::geometry::haversine_km;
/// use geofeed_core::Coordinate;
///
/// // One degree of latitude is roughly 111.2 km
/// let dist = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
/// assert!((dist - 111.2).abs() < 0.1);
/// ```
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Best single (latitude, longitude) for displaying a geometry.
///
/// - Point: the point itself, un-swapped from wire order.
/// - GeometryCollection: the first member that yields a position.
/// - Polygon: vertex mean of the outer ring.
/// - Unsupported: `None`.
///
/// # Example
///
/// ```
/// use geofeed_core::geometry::extract_coordinates;
/// use geofeed_core::{Coordinate, Geometry};
///
/// let point = Geometry::point(151.0, -30.0);
/// assert_eq!(extract_coordinates(&point), Some(Coordinate::new(-30.0, 151.0)));
/// assert_eq!(extract_coordinates(&Geometry::Unsupported), None);
/// ```
pub fn extract_coordinates(geometry: &Geometry) -> Option<Coordinate> {
    match geometry {
        Geometry::Point { coordinates } => position_to_coordinate(coordinates),
        Geometry::GeometryCollection { geometries } => {
            geometries.iter().find_map(extract_coordinates)
        }
        Geometry::Polygon { coordinates } => {
            let centroid = coordinates.first().and_then(|ring| vertex_mean(ring));
            debug!("Centroid of polygon is {:?}", centroid);
            centroid
        }
        Geometry::Unsupported => {
            debug!("No coordinates for unsupported geometry");
            None
        }
    }
}

/// Distance in kilometres from `reference` to `geometry`.
///
/// - Point: haversine distance.
/// - GeometryCollection: minimum over every member.
/// - Polygon: minimum over the outer ring's vertices.
/// - Unsupported: `f64::INFINITY`.
///
/// # Example
///
/// ```
/// use geofeed_core::geometry::distance_to;
/// use geofeed_core::{Coordinate, Geometry};
///
/// let home = Coordinate::new(-31.0, 151.0);
/// let dist = distance_to(home, &Geometry::point(149.1234, -37.2345));
/// assert!((dist - 714.4).abs() < 0.1);
/// assert_eq!(distance_to(home, &Geometry::Unsupported), f64::INFINITY);
/// ```
pub fn distance_to(reference: Coordinate, geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Point { coordinates } => distance_to_position(reference, coordinates),
        Geometry::GeometryCollection { geometries } => geometries
            .iter()
            .map(|member| distance_to(reference, member))
            .fold(f64::INFINITY, f64::min),
        Geometry::Polygon { coordinates } => coordinates
            .first()
            .map_or(f64::INFINITY, |ring| distance_to_ring(reference, ring)),
        Geometry::Unsupported => {
            debug!("No distance for unsupported geometry");
            f64::INFINITY
        }
    }
}

/// Swaps a wire position into a coordinate. Positions need at least two values.
fn position_to_coordinate(position: &[f64]) -> Option<Coordinate> {
    match position {
        [longitude, latitude, ..] => Some(Coordinate::new(*latitude, *longitude)),
        _ => None,
    }
}

fn distance_to_position(reference: Coordinate, position: &[f64]) -> f64 {
    position_to_coordinate(position).map_or(f64::INFINITY, |c| haversine_km(reference, c))
}

fn distance_to_ring(reference: Coordinate, ring: &[Position]) -> f64 {
    ring.iter()
        .map(|vertex| distance_to_position(reference, vertex))
        .fold(f64::INFINITY, f64::min)
}

/// Arithmetic mean of all vertex latitudes and longitudes, closing vertex included.
fn vertex_mean(ring: &[Position]) -> Option<Coordinate> {
    let vertices: Vec<Coordinate> = ring
        .iter()
        .filter_map(|vertex| position_to_coordinate(vertex))
        .collect();
    if vertices.is_empty() {
        return None;
    }
    let count = vertices.len() as f64;
    let latitude = vertices.iter().map(|c| c.latitude).sum::<f64>() / count;
    let longitude = vertices.iter().map(|c| c.longitude).sum::<f64>() / count;
    Some(Coordinate::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 0.1;

    fn square() -> Geometry {
        Geometry::polygon(&[
            (151.0, -30.0),
            (151.5, -30.0),
            (151.5, -30.5),
            (151.0, -30.5),
            (151.0, -30.0),
        ])
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_extract_coordinates_from_point() {
        let coordinate = extract_coordinates(&Geometry::point(151.0, -30.0)).unwrap();
        assert_eq!(coordinate.latitude, -30.0);
        assert_eq!(coordinate.longitude, 151.0);
    }

    #[test]
    fn test_extract_coordinates_ignores_altitude() {
        let point = Geometry::Point {
            coordinates: vec![151.0, -30.0, 25.0],
        };
        assert_eq!(
            extract_coordinates(&point),
            Some(Coordinate::new(-30.0, 151.0))
        );
    }

    #[test]
    fn test_extract_coordinates_from_short_position() {
        let point = Geometry::Point {
            coordinates: vec![151.0],
        };
        assert_eq!(extract_coordinates(&point), None);
        assert_eq!(distance_to(Coordinate::new(0.0, 0.0), &point), f64::INFINITY);
    }

    #[test]
    fn test_extract_coordinates_from_geometry_collection() {
        let collection = Geometry::collection(vec![Geometry::point(151.0, -30.0)]);
        assert_eq!(
            extract_coordinates(&collection),
            Some(Coordinate::new(-30.0, 151.0))
        );
    }

    #[test]
    fn test_extract_coordinates_from_collection_takes_first_usable_member() {
        let collection = Geometry::collection(vec![
            Geometry::Unsupported,
            Geometry::collection(vec![]),
            Geometry::point(150.0, -35.0),
            Geometry::point(151.0, -30.0),
        ]);
        assert_eq!(
            extract_coordinates(&collection),
            Some(Coordinate::new(-35.0, 150.0))
        );
    }

    #[test]
    fn test_extract_coordinates_from_polygon() {
        let centroid = extract_coordinates(&square()).unwrap();
        assert_close(centroid.latitude, -30.2);
        assert_close(centroid.longitude, 151.2);
        // Vertex mean counts the closing vertex twice.
        assert_eq!(centroid.latitude, -30.2);
        assert_eq!(centroid.longitude, 151.2);
    }

    #[test]
    fn test_extract_coordinates_from_empty_polygon() {
        let polygon = Geometry::Polygon {
            coordinates: vec![],
        };
        assert_eq!(extract_coordinates(&polygon), None);
        assert_eq!(
            distance_to(Coordinate::new(0.0, 0.0), &polygon),
            f64::INFINITY
        );
    }

    #[test]
    fn test_polygon_inner_rings_are_ignored() {
        let mut polygon = square();
        if let Geometry::Polygon { coordinates } = &mut polygon {
            coordinates.push(vec![vec![150.0, -31.0], vec![150.0, -31.0]]);
        }
        let home = Coordinate::new(-31.0, 150.0);
        assert_close(distance_to(home, &polygon), 110.6);
        assert_eq!(extract_coordinates(&polygon), extract_coordinates(&square()));
    }

    #[test]
    fn test_extract_coordinates_from_unsupported_geometry() {
        assert_eq!(extract_coordinates(&Geometry::Unsupported), None);
    }

    #[test]
    fn test_distance_to_point() {
        let home = Coordinate::new(-31.0, 150.0);
        assert_close(distance_to(home, &Geometry::point(151.0, -30.0)), 146.8);
    }

    #[test]
    fn test_distance_to_far_point() {
        let home = Coordinate::new(-31.0, 151.0);
        assert_close(distance_to(home, &Geometry::point(149.1234, -37.2345)), 714.4);
    }

    #[test]
    fn test_distance_to_geometry_collection() {
        let home = Coordinate::new(-31.0, 150.0);
        let collection = Geometry::collection(vec![Geometry::point(151.0, -30.0)]);
        assert_close(distance_to(home, &collection), 146.8);
    }

    #[test]
    fn test_distance_to_geometry_collection_is_minimum_over_members() {
        let home = Coordinate::new(-31.0, 150.0);
        // The nearest member comes last, so every member has to be scanned.
        let collection = Geometry::collection(vec![
            Geometry::point(151.0, -30.0),
            Geometry::Unsupported,
            square(),
        ]);
        assert_close(distance_to(home, &collection), 110.6);
    }

    #[test]
    fn test_distance_to_polygon() {
        let home = Coordinate::new(-31.0, 150.0);
        assert_close(distance_to(home, &square()), 110.6);
    }

    #[test]
    fn test_distance_to_polygon_ignores_edges() {
        // Home sits right under the middle of the southern edge; the nearest
        // vertex is a corner, so the distance is larger than to the edge.
        let home = Coordinate::new(-30.6, 151.25);
        let distance = distance_to(home, &square());
        let to_corner = haversine_km(home, Coordinate::new(-30.5, 151.0));
        assert!((distance - to_corner).abs() < 1e-9);
        assert!(distance > haversine_km(home, Coordinate::new(-30.5, 151.25)));
    }

    #[test]
    fn test_distance_to_unsupported_geometry() {
        let home = Coordinate::new(-31.0, 150.0);
        assert_eq!(distance_to(home, &Geometry::Unsupported), f64::INFINITY);
    }

    #[test]
    fn test_haversine_is_symmetric_and_zero_on_identity() {
        let a = Coordinate::new(-31.0, 151.0);
        let b = Coordinate::new(-37.2345, 149.1234);
        assert_eq!(haversine_km(a, a), 0.0);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }
}
