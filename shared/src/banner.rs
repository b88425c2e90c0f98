use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, Viewport};

pub type BannerId = i64;

/// Padding added around a banner's extent so a fitted map never clips the
/// outermost portals.
pub const BOUNDS_MARGIN: f64 = 0.0001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub number_of_missions: u32,
    /// Missions keyed by their position in the banner. Summary objects
    /// returned by area queries leave this empty.
    #[serde(default)]
    pub missions: BTreeMap<u32, Mission>,
    pub start_latitude: f64,
    pub start_longitude: f64,
    #[serde(default, alias = "lenghtMeters")]
    pub length_meters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub poi: Poi,
    pub objective: Objective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    #[serde(rename = "hack")]
    Hack,
    #[serde(rename = "install a mod")]
    InstallMod,
    #[serde(rename = "capture or upgrade")]
    CaptureOrUpgrade,
    #[serde(rename = "create link")]
    CreateLink,
    #[serde(rename = "create field")]
    CreateField,
    #[serde(rename = "passphrase")]
    Passphrase,
    #[serde(rename = "fieldTrip")]
    FieldTrip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub picture: String,
    #[serde(rename = "type")]
    pub kind: PoiKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoiKind {
    Portal,
    FieldTrip,
}

impl Poi {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

impl Mission {
    /// Smallest rectangle containing every step's POI, or `None` without steps.
    pub fn bounds(&self) -> Option<Viewport> {
        let mut points = self.steps.iter().map(|step| step.poi.point());
        let first = points.next()?;
        let mut bounds = Viewport::new(first, first);
        for point in points {
            bounds.extend(&point);
        }
        Some(bounds)
    }
}

impl Banner {
    pub fn start_point(&self) -> GeoPoint {
        GeoPoint::new(self.start_latitude, self.start_longitude)
    }

    /// Copy of this banner moved by `offset` degrees of longitude. The start
    /// point and every mission POI move together so the extent stays in one
    /// frame.
    pub fn with_longitude_offset(&self, offset: f64) -> Self {
        let mut shifted = self.clone();
        shifted.start_longitude += offset;
        for step in shifted.missions.values_mut().flat_map(|m| m.steps.iter_mut()) {
            step.poi.longitude += offset;
        }
        shifted
    }

    /// Geographic extent of the banner (start point plus every mission POI),
    /// padded by [`BOUNDS_MARGIN`].
    pub fn bounds(&self) -> Option<Viewport> {
        let start = self.start_point();
        if !start.is_finite() {
            return None;
        }

        let mut bounds = Viewport::new(start, start);
        for mission_bounds in self.missions.values().filter_map(Mission::bounds) {
            bounds.extend(&mission_bounds.south_west);
            bounds.extend(&mission_bounds.north_east);
        }

        if !bounds.is_finite() {
            return None;
        }
        Some(bounds.padded(BOUNDS_MARGIN))
    }
}
