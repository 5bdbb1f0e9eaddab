//! Spherical Web Mercator (EPSG:3857).

use crate::domain::model::{GeoBounds, Location, ProjectedBounds};

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_78;

pub fn mercator_x_m(lng_deg: f64) -> f64 {
    EARTH_RADIUS_M * lng_deg.to_radians()
}

pub fn mercator_y_m(lat_deg: f64) -> f64 {
    let lat = lat_deg
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    EARTH_RADIUS_M * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln()
}

pub fn inverse_mercator_lng_deg(x_m: f64) -> f64 {
    (x_m / EARTH_RADIUS_M).to_degrees()
}

pub fn inverse_mercator_lat_deg(y_m: f64) -> f64 {
    let lat = 2.0 * (y_m / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2;
    lat.to_degrees()
}

pub fn project(location: &Location) -> (f64, f64) {
    (
        mercator_x_m(location.longitude),
        mercator_y_m(location.latitude),
    )
}

/// Geographic extent covered by a projected rectangle.
pub fn unproject_bounds(bounds: &ProjectedBounds) -> GeoBounds {
    GeoBounds {
        min_lat: inverse_mercator_lat_deg(bounds.min_y),
        max_lat: inverse_mercator_lat_deg(bounds.max_y),
        min_lng: inverse_mercator_lng_deg(bounds.min_x),
        max_lng: inverse_mercator_lng_deg(bounds.max_x),
    }
}
