//! Coordinate projection module
//!
//! Projects geographic bounding boxes (latitude/longitude) onto the
//! Web Mercator tile grid used by slippy-map tile servers, and
//! estimates surface area for user display.

mod types;

pub use types::{
    CoordError, GeoBoundingBox, TileCoord, TileRange, EARTH_RADIUS_KM, MAX_LAT, MAX_LON, MAX_ZOOM,
    MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Converts a longitude to a tile column at the given zoom level.
///
/// The result is clamped into `[0, 2^zoom - 1]` so edge longitudes
/// (exactly 180°) stay on the grid.
#[inline]
fn lon_to_x(lon: f64, zoom: u8) -> u32 {
    let n = 2.0_f64.powi(zoom as i32);
    let x = ((lon + 180.0) / 360.0 * n).floor();
    let max = n - 1.0;
    x.clamp(0.0, max) as u32
}

/// Converts a latitude to a tile row at the given zoom level.
///
/// The latitude is clamped to the Web Mercator limit (±85.05112878°)
/// before projection, so poleward inputs behave as if clamped.
#[inline]
fn lat_to_y(lat: f64, zoom: u8) -> u32 {
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let n = 2.0_f64.powi(zoom as i32);
    let lat_rad = lat * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();
    let max = n - 1.0;
    y.clamp(0.0, max) as u32
}

/// Projects a bounding box at a zoom level into an inclusive tile range.
///
/// Longitude is converted linearly; latitude via the standard Mercator
/// transform with each edge independently clamped to ±85.05112878°.
///
/// # Arguments
///
/// * `bbox` - Geographic bounding box (south ≤ north)
/// * `zoom` - Zoom level (0 to 18)
///
/// # Returns
///
/// The inclusive tile range, or an error for an unsupported zoom level.
pub fn tile_range(bbox: &GeoBoundingBox, zoom: u8) -> Result<TileRange, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let xa = lon_to_x(bbox.west, zoom);
    let xb = lon_to_x(bbox.east, zoom);
    // east < west is not meaningful here (no wraparound); orient anyway
    let (x_min, x_max) = (xa.min(xb), xa.max(xb));

    // North latitude maps to the smaller row index
    let y_min = lat_to_y(bbox.north, zoom);
    let y_max = lat_to_y(bbox.south, zoom);

    Ok(TileRange {
        zoom,
        x_min,
        x_max,
        y_min,
        y_max,
    })
}

/// Estimates the surface area of a bounding box in square kilometres.
///
/// Uses the spherical-cap approximation
/// `R² · Δλ(rad) · |sin(φ_north) − sin(φ_south)|` with `R = 6371 km`.
/// This is a display estimate only; nothing else depends on it.
pub fn area_km2(bbox: &GeoBoundingBox) -> f64 {
    let delta_lon_rad = (bbox.east - bbox.west).abs() * PI / 180.0;
    let sin_north = (bbox.north * PI / 180.0).sin();
    let sin_south = (bbox.south * PI / 180.0).sin();
    EARTH_RADIUS_KM * EARTH_RADIUS_KM * delta_lon_rad * (sin_north - sin_south).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn algarve_bbox() -> GeoBoundingBox {
        GeoBoundingBox::new(37.0, -8.6, 37.2, -8.4).unwrap()
    }

    #[test]
    fn test_tile_range_at_zoom_12() {
        let range = tile_range(&algarve_bbox(), 12).unwrap();
        assert_eq!(range.x_min, 1950);
        assert_eq!(range.x_max, 1952);
        assert_eq!(range.y_min, 1591);
        assert_eq!(range.y_max, 1594);
        assert_eq!(range.count(), 12);
    }

    #[test]
    fn test_tile_range_at_zoom_13() {
        let range = tile_range(&algarve_bbox(), 13).unwrap();
        assert_eq!(range.x_min, 3900);
        assert_eq!(range.x_max, 3904);
        assert_eq!(range.y_min, 3182);
        assert_eq!(range.y_max, 3188);
        assert_eq!(range.count(), 35);
    }

    #[test]
    fn test_whole_world_at_zoom_zero_is_one_tile() {
        let bbox = GeoBoundingBox::new(-90.0, -180.0, 90.0, 180.0).unwrap();
        let range = tile_range(&bbox, 0).unwrap();
        assert_eq!(range.count(), 1);
        assert_eq!((range.x_min, range.y_min), (0, 0));
    }

    #[test]
    fn test_polar_latitude_projects_as_clamped() {
        // north = 90 must produce the same range as north at the
        // Mercator limit
        let polar = GeoBoundingBox::new(50.0, -10.0, 90.0, 10.0).unwrap();
        let clamped = GeoBoundingBox::new(50.0, -10.0, MAX_LAT, 10.0).unwrap();

        for zoom in [0, 4, 9, 14] {
            let a = tile_range(&polar, zoom).unwrap();
            let b = tile_range(&clamped, zoom).unwrap();
            assert_eq!(a, b, "zoom {} ranges should match", zoom);
        }
    }

    #[test]
    fn test_south_pole_clamps_independently() {
        let deep = GeoBoundingBox::new(-90.0, 0.0, -80.0, 1.0).unwrap();
        let clamped = GeoBoundingBox::new(MIN_LAT, 0.0, -80.0, 1.0).unwrap();
        let a = tile_range(&deep, 10).unwrap();
        let b = tile_range(&clamped, 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_zoom_beyond_maximum() {
        let result = tile_range(&algarve_bbox(), 19);
        assert!(matches!(result, Err(CoordError::InvalidZoom(19))));
    }

    #[test]
    fn test_east_edge_longitude_stays_on_grid() {
        let bbox = GeoBoundingBox::new(-10.0, 170.0, 10.0, 180.0).unwrap();
        let range = tile_range(&bbox, 6).unwrap();
        assert!(range.x_max < 64);
    }

    #[test]
    fn test_area_estimate_equator_band() {
        // 1° x 1° at the equator is roughly 111 km x 111 km
        let bbox = GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let area = area_km2(&bbox);
        assert!((area - 12364.0).abs() < 50.0, "got {}", area);
    }

    #[test]
    fn test_area_estimate_shrinks_toward_pole() {
        let equator = GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let arctic = GeoBoundingBox::new(70.0, 0.0, 71.0, 1.0).unwrap();
        assert!(area_km2(&arctic) < area_km2(&equator));
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_range_within_grid_bounds(
                south in -85.0..84.0_f64,
                west in -180.0..179.0_f64,
                dlat in 0.0..1.0_f64,
                dlon in 0.0..1.0_f64,
                zoom in 0u8..=18
            ) {
                let bbox = GeoBoundingBox::new(south, west, south + dlat, west + dlon).unwrap();
                let range = tile_range(&bbox, zoom).unwrap();

                let max_tile = 2u32.pow(zoom as u32);
                prop_assert!(range.x_max < max_tile);
                prop_assert!(range.y_max < max_tile);
                prop_assert!(range.x_min <= range.x_max);
                prop_assert!(range.y_min <= range.y_max);
            }

            #[test]
            fn test_count_matches_enumeration(
                south in -85.0..84.0_f64,
                west in -180.0..179.0_f64,
                dlat in 0.0..0.5_f64,
                dlon in 0.0..0.5_f64,
                zoom in 0u8..=12
            ) {
                let bbox = GeoBoundingBox::new(south, west, south + dlat, west + dlon).unwrap();
                let range = tile_range(&bbox, zoom).unwrap();

                prop_assert_eq!(range.coords().count() as u64, range.count());
            }

            #[test]
            fn test_projection_is_deterministic(
                south in -85.0..84.0_f64,
                west in -180.0..179.0_f64,
                zoom in 0u8..=18
            ) {
                let bbox = GeoBoundingBox::new(south, west, south + 0.3, west + 0.3).unwrap();
                let a = tile_range(&bbox, zoom).unwrap();
                let b = tile_range(&bbox, zoom).unwrap();
                prop_assert_eq!(a, b);
            }

            #[test]
            fn test_longitude_monotonic(
                lat in 0.0..1.0_f64,
                lon1 in -180.0..-90.0_f64,
                lon2 in -90.0..0.0_f64,
                zoom in 10u8..=15
            ) {
                // For a fixed latitude, a box further east never
                // projects to a smaller column
                let a = GeoBoundingBox::new(lat, lon1, lat, lon1).unwrap();
                let b = GeoBoundingBox::new(lat, lon2, lat, lon2).unwrap();
                let ra = tile_range(&a, zoom).unwrap();
                let rb = tile_range(&b, zoom).unwrap();
                prop_assert!(ra.x_min < rb.x_min);
            }

            #[test]
            fn test_poleward_latitudes_behave_as_clamped(
                north in 85.06..90.0_f64,
                west in -180.0..179.0_f64,
                zoom in 0u8..=18
            ) {
                let wild = GeoBoundingBox::new(50.0, west, north, west + 0.5).unwrap();
                let tame = GeoBoundingBox::new(50.0, west, MAX_LAT, west + 0.5).unwrap();
                prop_assert_eq!(
                    tile_range(&wild, zoom).unwrap(),
                    tile_range(&tame, zoom).unwrap()
                );
            }
        }
    }
}
