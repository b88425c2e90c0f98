use serde::{Deserialize, Serialize};

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;
/// One full turn of longitude.
pub const FULL_TURN: f64 = 360.0;

/// Wrap a longitude into the canonical `[-180, 180)` range.
pub fn wrap_longitude(lng: f64) -> f64 {
    (lng - MIN_LONGITUDE).rem_euclid(FULL_TURN) + MIN_LONGITUDE
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Same point with its longitude wrapped into `[-180, 180)`.
    pub fn wrapped(&self) -> Self {
        Self::new(self.latitude, wrap_longitude(self.longitude))
    }
}

/// Axis-aligned geographic rectangle.
///
/// Longitudes are kept in a continuous frame: a viewport straddling the
/// antimeridian is written as e.g. `170..190` rather than `170..-170`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub north_east: GeoPoint,
    pub south_west: GeoPoint,
}

impl Viewport {
    pub const fn new(south_west: GeoPoint, north_east: GeoPoint) -> Self {
        Self {
            north_east,
            south_west,
        }
    }

    /// Build from raw edges, ordering the latitudes so north ≥ south.
    /// Longitudes are taken as given.
    pub fn from_edges(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(
            GeoPoint::new(south.min(north), west),
            GeoPoint::new(south.max(north), east),
        )
    }

    /// Whole-world rectangle for the given latitude band.
    pub fn full_globe(south: f64, north: f64) -> Self {
        Self::from_edges(south, MIN_LONGITUDE, north, MAX_LONGITUDE)
    }

    pub fn south(&self) -> f64 {
        self.south_west.latitude
    }

    pub fn north(&self) -> f64 {
        self.north_east.latitude
    }

    pub fn west(&self) -> f64 {
        self.south_west.longitude
    }

    pub fn east(&self) -> f64 {
        self.north_east.longitude
    }

    pub fn width(&self) -> f64 {
        self.east() - self.west()
    }

    pub fn height(&self) -> f64 {
        self.north() - self.south()
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south() + self.north()) / 2.0,
            (self.west() + self.east()) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.north_east.is_finite() && self.south_west.is_finite()
    }

    pub fn covers_globe(&self) -> bool {
        self.width() >= FULL_TURN
    }

    /// Inclusive containment on both axes, without any wrapping.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.south()..=self.north()).contains(&point.latitude)
            && (self.west()..=self.east()).contains(&point.longitude)
    }

    /// True when both longitude edges lie inside `[-180, 180]`.
    pub fn is_within_world(&self) -> bool {
        let world = MIN_LONGITUDE..=MAX_LONGITUDE;
        world.contains(&self.west()) && world.contains(&self.east())
    }

    pub fn shifted(&self, longitude_offset: f64) -> Self {
        Self::new(
            GeoPoint::new(self.south(), self.west() + longitude_offset),
            GeoPoint::new(self.north(), self.east() + longitude_offset),
        )
    }

    pub fn padded(&self, margin: f64) -> Self {
        Self::new(
            GeoPoint::new(self.south() - margin, self.west() - margin),
            GeoPoint::new(self.north() + margin, self.east() + margin),
        )
    }

    /// Grow to include `point`.
    pub fn extend(&mut self, point: &GeoPoint) {
        self.south_west.latitude = self.south_west.latitude.min(point.latitude);
        self.south_west.longitude = self.south_west.longitude.min(point.longitude);
        self.north_east.latitude = self.north_east.latitude.max(point.latitude);
        self.north_east.longitude = self.north_east.longitude.max(point.longitude);
    }
}
