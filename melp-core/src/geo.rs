//! Geographic helpers for the radius search
//!
//! Restaurants are stored as WGS84 degrees (EPSG:4326). Distances for the
//! radius search are measured after reprojecting into Web Mercator
//! (EPSG:3857), whose units are meters on a plane. The database performs
//! the reprojection itself (`ST_Transform(..., 3857)`). The projection
//! helpers here reproduce it in memory, for placing points at known
//! projected distances (test fixtures) and for reasoning about a radius;
//! request validation only uses the coordinate bounds.
//!
//! Web Mercator meters are only true ground meters at the equator; away
//! from it they are stretched by `1 / cos(lat)`. The radius is always
//! interpreted in projected meters.

use serde::{Deserialize, Serialize};

use crate::validation::{require_range, ValidationError};

/// WGS84 semi-major axis used by EPSG:3857
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude at which Web Mercator becomes a square (`atan(sinh(pi))`).
///
/// PostGIS projects anything inside (-90, 90), but EPSG:3857's area of use
/// ends here and projected meters blow up toward the poles, so restaurant
/// coordinates are kept within this band.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_6;

/// Maximum longitude magnitude
pub const MAX_LONGITUDE: f64 = 180.0;

/// A validated WGS84 position that Web Mercator can project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A point in EPSG:3857, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting anything the projection can't handle.
    ///
    /// # Example
    /// ```
    /// use melp_core::geo::Coordinates;
    ///
    /// assert!(Coordinates::new(40.7128, -74.0060).is_ok());
    /// assert!(Coordinates::new(89.0, 0.0).is_err()); // beyond Web Mercator
    /// ```
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        validate_lat("lat", lat)?;
        validate_lng("lng", lng)?;
        Ok(Self { lat, lng })
    }

    /// Project into Web Mercator.
    pub fn to_web_mercator(self) -> ProjectedPoint {
        let x = EARTH_RADIUS_M * self.lng.to_radians();
        let y = EARTH_RADIUS_M
            * (std::f64::consts::FRAC_PI_4 + self.lat.to_radians() / 2.0)
                .tan()
                .ln();
        ProjectedPoint { x, y }
    }

    /// Inverse projection from Web Mercator.
    pub fn from_web_mercator(point: ProjectedPoint) -> Self {
        let lng = (point.x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (point.y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
            .to_degrees();
        Self { lat, lng }
    }

    /// Planar distance in projected meters, as `ST_Distance` on 3857 geometries.
    pub fn projected_distance(self, other: Coordinates) -> f64 {
        let a = self.to_web_mercator();
        let b = other.to_web_mercator();
        (a.x - b.x).hypot(a.y - b.y)
    }

    /// Coordinates displaced by `(dx, dy)` projected meters.
    pub fn offset_projected(self, dx: f64, dy: f64) -> Self {
        let p = self.to_web_mercator();
        Self::from_web_mercator(ProjectedPoint {
            x: p.x + dx,
            y: p.y + dy,
        })
    }
}

pub(crate) fn validate_lat(field: &'static str, lat: f64) -> Result<(), ValidationError> {
    require_range(field, lat, -MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
}

pub(crate) fn validate_lng(field: &'static str, lng: f64) -> Result<(), ValidationError> {
    require_range(field, lng, -MAX_LONGITUDE, MAX_LONGITUDE)
}

/// Query parameters for the radius statistics endpoint.
///
/// `radius` is in meters of the EPSG:3857 projection.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RadiusQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

impl RadiusQuery {
    /// Validate into a query origin and radius.
    pub fn validate(&self) -> Result<(Coordinates, f64), ValidationError> {
        validate_lat("latitude", self.latitude)?;
        validate_lng("longitude", self.longitude)?;
        if !self.radius.is_finite() {
            return Err(ValidationError::NotFinite { field: "radius" });
        }
        if self.radius < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "radius",
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok((
            Coordinates {
                lat: self.latitude,
                lng: self.longitude,
            },
            self.radius,
        ))
    }
}

/// Rating statistics for restaurants inside a radius.
///
/// Never carries undefined values: an empty match set is all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RadiusStats {
    pub count: i64,
    pub avg: f64,
    #[serde(rename = "std")]
    pub stddev: f64,
}

impl RadiusStats {
    /// Build from SQL aggregates, where `AVG`/`STDDEV` are NULL for empty
    /// (or, for `STDDEV`, single-row) groups.
    pub fn from_aggregates(count: i64, avg: Option<f64>, stddev: Option<f64>) -> Self {
        if count == 0 {
            return Self::default();
        }
        Self {
            count,
            avg: avg.unwrap_or(0.0),
            stddev: stddev.unwrap_or(0.0),
        }
    }

    /// Compute the same statistics in memory: mean and sample standard
    /// deviation, matching PostgreSQL's `avg` and `stddev`.
    pub fn from_ratings(ratings: &[i32]) -> Self {
        let n = ratings.len();
        if n == 0 {
            return Self::default();
        }
        let mean = ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / n as f64;
        let stddev = if n > 1 {
            let ss: f64 = ratings
                .iter()
                .map(|&r| (f64::from(r) - mean).powi(2))
                .sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            0.0
        };
        Self {
            count: n as i64,
            avg: mean,
            stddev,
        }
    }
}
