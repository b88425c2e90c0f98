use crate::geo::{
    FULL_TURN, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE, Viewport,
    wrap_longitude,
};

/// One rectangle to send to the banner source.
///
/// `bound` always lies inside `[-180, 180]`. Banners returned for it must
/// have `longitude_offset` added to their start longitude to land back in the
/// viewport's continuous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryRect {
    pub bound: Viewport,
    pub longitude_offset: f64,
}

impl QueryRect {
    pub fn is_shifted(&self) -> bool {
        self.longitude_offset != 0.0
    }
}

/// Split a viewport into the rectangles that cover it in the queryable
/// `[-180, 180]` world.
///
/// A viewport inside ±180 maps to itself. One crossing the antimeridian is
/// cut at ±180 and the overhanging slice is moved back by a full turn. A
/// viewport at least 360° wide becomes a single whole-world rectangle. The
/// rectangles never overlap and the unshifted one, if any, comes first.
pub fn decompose(viewport: &Viewport) -> Vec<QueryRect> {
    if !viewport.is_finite() {
        return Vec::new();
    }

    let south = viewport.south().clamp(MIN_LATITUDE, MAX_LATITUDE);
    let north = viewport.north().clamp(MIN_LATITUDE, MAX_LATITUDE);
    let west = viewport.west();
    let mut east = viewport.east();
    if east < west {
        east += FULL_TURN;
    }

    if east - west >= FULL_TURN {
        return vec![QueryRect {
            bound: Viewport::full_globe(south, north),
            longitude_offset: 0.0,
        }];
    }

    if east == west {
        let lng = wrap_longitude(west);
        return vec![QueryRect {
            bound: Viewport::from_edges(south, lng, north, lng),
            longitude_offset: west - lng,
        }];
    }

    // World copy n spans [-180 + 360n, 180 + 360n]; only copies sharing a
    // positive-width slice with [west, east] are queried.
    let first_copy = ((west - MIN_LONGITUDE) / FULL_TURN).floor() as i64;
    let last_copy = ((east - MIN_LONGITUDE) / FULL_TURN).ceil() as i64 - 1;

    let mut rects: Vec<QueryRect> = (first_copy..=last_copy)
        .filter_map(|copy| {
            let offset = copy as f64 * FULL_TURN;
            let slice_west = west.max(MIN_LONGITUDE + offset) - offset;
            let slice_east = east.min(MAX_LONGITUDE + offset) - offset;
            (slice_east > slice_west).then(|| QueryRect {
                bound: Viewport::from_edges(south, slice_west, north, slice_east),
                longitude_offset: offset,
            })
        })
        .collect();

    rects.sort_by(|a, b| a.longitude_offset.abs().total_cmp(&b.longitude_offset.abs()));
    rects
}
