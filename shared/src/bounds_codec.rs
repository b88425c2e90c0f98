//! Deep-link encoding of the map view.
//!
//! A link either pins an explicit rectangle (`bounds=minLat,minLng,maxLat,maxLng`)
//! or a center and zoom (`lat`, `lng`, `zoom`). The explicit rectangle wins when
//! both are present. Once the user moves the map the link is rewritten to the
//! center form and `bounds` is dropped.

use thiserror::Error;
use tracing::warn;
use url::form_urlencoded;

use crate::geo::{FULL_TURN, GeoPoint, Viewport};

pub const BOUNDS_PARAM: &str = "bounds";
pub const LAT_PARAM: &str = "lat";
pub const LNG_PARAM: &str = "lng";
pub const ZOOM_PARAM: &str = "zoom";

pub const MIN_ZOOM: u8 = 3;
pub const DEFAULT_ZOOM: u8 = MIN_ZOOM;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeepLink {
    Bounds(Viewport),
    Center { center: GeoPoint, zoom: u8 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("expected 4 comma-separated values, got {0}")]
    WrongArity(usize),
    #[error("invalid coordinate {0:?}")]
    InvalidNumber(String),
}

/// Parse a query string (with or without the leading `?`).
///
/// Never fails: unusable parameters are logged and skipped, and `None` means
/// the caller should fall back to its default view.
pub fn parse(query: &str) -> Option<DeepLink> {
    let params = query_pairs(query);

    if let Some(raw) = first_value(&params, BOUNDS_PARAM).filter(|raw| !raw.is_empty()) {
        match parse_bounds(raw) {
            Ok(viewport) => return Some(DeepLink::Bounds(viewport)),
            Err(e) => warn!(bounds = raw, error = %e, "ignoring invalid bounds parameter"),
        }
    }

    let lat = first_value(&params, LAT_PARAM).and_then(parse_coordinate);
    let lng = first_value(&params, LNG_PARAM).and_then(parse_coordinate);
    let (Some(lat), Some(lng)) = (lat, lng) else {
        if first_value(&params, LAT_PARAM).is_some() || first_value(&params, LNG_PARAM).is_some() {
            warn!(query, "ignoring incomplete or invalid lat/lng parameters");
        }
        return None;
    };

    let zoom = match first_value(&params, ZOOM_PARAM) {
        None => DEFAULT_ZOOM,
        Some(raw) => parse_zoom(raw).unwrap_or_else(|| {
            warn!(zoom = raw, "ignoring invalid zoom parameter");
            DEFAULT_ZOOM
        }),
    };

    Some(DeepLink::Center {
        center: GeoPoint::new(lat, lng),
        zoom,
    })
}

/// Parse `minLat,minLng,maxLat,maxLng`, correcting a pair that wraps the
/// antimeridian.
pub fn parse_bounds(raw: &str) -> Result<Viewport, BoundsError> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 4 {
        return Err(BoundsError::WrongArity(parts.len()));
    }

    let mut values = [0.0_f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = parse_coordinate(part).ok_or_else(|| BoundsError::InvalidNumber((*part).to_owned()))?;
    }
    let [min_lat, min_lng, max_lat, max_lng] = values;
    let (min_lng, max_lng) = correct_antimeridian(min_lng, max_lng);

    Ok(Viewport::from_edges(min_lat, min_lng, max_lat, max_lng))
}

/// Turn a wrapping longitude pair (`max < min`) into a continuous span by
/// moving the edge with the smaller magnitude a full turn toward the other.
pub fn correct_antimeridian(min_lng: f64, max_lng: f64) -> (f64, f64) {
    if max_lng >= min_lng {
        return (min_lng, max_lng);
    }
    if max_lng.abs() < min_lng.abs() {
        (min_lng - FULL_TURN, max_lng)
    } else {
        (min_lng, max_lng + FULL_TURN)
    }
}

/// Rewrite `query` for a live view: set `lat`/`lng`/`zoom`, drop `bounds`,
/// keep every other parameter in place.
pub fn serialize(query: &str, center: GeoPoint, zoom: u8) -> String {
    let mut params: Vec<(String, String)> = query_pairs(query)
        .into_iter()
        .filter(|(key, _)| !matches!(key.as_str(), BOUNDS_PARAM | LAT_PARAM | LNG_PARAM | ZOOM_PARAM))
        .collect();
    params.push((LAT_PARAM.to_owned(), center.latitude.to_string()));
    params.push((LNG_PARAM.to_owned(), center.longitude.to_string()));
    params.push((ZOOM_PARAM.to_owned(), zoom.to_string()));
    encode(&params)
}

/// `minLat,minLng,maxLat,maxLng` for an explicit-bounds link.
pub fn format_bounds(viewport: &Viewport) -> String {
    format!(
        "{},{},{},{}",
        viewport.south(),
        viewport.west(),
        viewport.north(),
        viewport.east()
    )
}

/// Shareable query pinning exactly `viewport`.
pub fn share_query(viewport: &Viewport) -> String {
    encode(&[(BOUNDS_PARAM.to_owned(), format_bounds(viewport))])
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

fn first_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, value)| value.as_str())
}

fn encode(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_zoom(raw: &str) -> Option<u8> {
    let zoom = parse_coordinate(raw)?;
    if zoom < 0.0 {
        return None;
    }
    Some((zoom.round().min(f64::from(u8::MAX)) as u8).max(MIN_ZOOM))
}
