//! Planar map coordinates and the ellipsoidal Mercator projection.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis in metres.
pub const R_MAJOR: f64 = 6_378_137.0;
/// WGS84 semi-minor axis in metres.
pub const R_MINOR: f64 = 6_356_752.3142;

const MAX_ITERATIONS: usize = 15;
const TOLERANCE: f64 = 1e-7;

fn eccentricity() -> f64 {
    (1.0 - (R_MINOR / R_MAJOR).powi(2)).sqrt()
}

/// A point in projected map space. Units are metres along the Mercator plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Coordinate) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Moves towards `target` by at most `speed` on each axis. An axis that
    /// already matches the target does not move.
    pub fn step_toward(&mut self, target: &Coordinate, speed: f64) {
        self.x += clamped_delta(self.x, target.x, speed);
        self.y += clamped_delta(self.y, target.y, speed);
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }
}

fn clamped_delta(from: f64, to: f64, speed: f64) -> f64 {
    let gap = to - from;
    if gap == 0.0 {
        return 0.0;
    }
    speed.min(gap.abs()) * gap.signum()
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Forward ellipsoidal Mercator projection.
pub fn project(lat: f64, lon: f64) -> Coordinate {
    let e = eccentricity();
    let phi = lat.to_radians();
    let con = e * phi.sin();
    let ts = (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - con) / (1.0 + con)).powf(e / 2.0);
    Coordinate {
        x: R_MAJOR * lon.to_radians(),
        y: -R_MAJOR * ts.ln(),
    }
}

/// Inverse ellipsoidal Mercator projection.
///
/// Latitude is refined by fixed-point iteration from the spherical estimate.
/// The loop stops once an update moves by no more than `1e-7` radians or
/// after 15 iterations, whichever comes first; the last estimate is returned
/// either way.
pub fn inverse_project(position: &Coordinate) -> GeoPoint {
    let lon = position.x.to_degrees() / R_MAJOR;
    let e = eccentricity();
    let half_e = e / 2.0;
    let ts = (-position.y / R_MAJOR).exp();

    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..MAX_ITERATIONS {
        let con = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan();
        let delta = next - phi;
        phi = next;
        if delta.abs() <= TOLERANCE {
            break;
        }
    }

    GeoPoint {
        lat: phi.to_degrees(),
        lon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_recovers_degrees() {
        for lat in (-80..=80).step_by(10) {
            for lon in (-180..=180).step_by(15) {
                let (lat, lon) = (lat as f64 + 0.37, lon as f64 - 0.21);
                let geo = inverse_project(&project(lat, lon));
                assert!((geo.lat - lat).abs() < 1e-6, "lat {lat} came back {}", geo.lat);
                assert!((geo.lon - lon).abs() < 1e-6, "lon {lon} came back {}", geo.lon);
            }
        }
    }

    #[test]
    fn origin_maps_to_equator_and_prime_meridian() {
        let geo = inverse_project(&Coordinate::new(0.0, 0.0));
        assert!(geo.lat.abs() < 1e-12);
        assert!(geo.lon.abs() < 1e-12);
    }

    #[test]
    fn longitude_is_linear_in_x() {
        let geo = inverse_project(&Coordinate::new(R_MAJOR * std::f64::consts::PI, 0.0));
        assert!((geo.lon - 180.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_y_still_returns_an_estimate() {
        let geo = inverse_project(&Coordinate::new(0.0, 1.0e9));
        assert!(geo.lat.is_finite());
        assert!(geo.lat <= 90.0);
    }

    #[test]
    fn step_toward_clamps_each_axis() {
        let mut position = Coordinate::new(0.0, 0.0);
        position.step_toward(&Coordinate::new(100.0, -5.0), 30.0);
        assert_eq!(position, Coordinate::new(30.0, -5.0));
        position.step_toward(&Coordinate::new(30.0, -5.0), 30.0);
        assert_eq!(position, Coordinate::new(30.0, -5.0));
    }
}
