use std::f64::consts::PI;

use banner_map_shared::bounds_codec::{self, DEFAULT_ZOOM, DeepLink, MIN_ZOOM};
use banner_map_shared::{Banner, BannerId, GeoPoint, Viewport};
use tracing::debug;

use crate::config::{DEFAULT_MAP_HEIGHT_PX, DEFAULT_MAP_WIDTH_PX, MAX_ZOOM, ZOOM_TO_BANNER_MAX_ZOOM};

pub const TILE_SIZE: f64 = 256.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

impl Default for MapSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_MAP_WIDTH_PX,
            height: DEFAULT_MAP_HEIGHT_PX,
        }
    }
}

/// Center, integer zoom and pixel size of the map, projected with spherical
/// Web Mercator on 256 px tiles. Longitudes are never wrapped, so a view over
/// the antimeridian reports bounds like `170..190`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    center: GeoPoint,
    zoom: u8,
    size: MapSize,
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

fn project(point: &GeoPoint, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = point
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let sin = lat.sin();
    let x = (point.longitude + 180.0) / 360.0 * size;
    let y = (0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * PI)) * size;
    (x, y)
}

fn unproject(x: f64, y: f64, zoom: f64) -> GeoPoint {
    let size = world_size(zoom);
    let n = PI - 2.0 * PI * y / size;
    GeoPoint::new(n.sinh().atan().to_degrees(), x / size * 360.0 - 180.0)
}

impl MapView {
    pub fn new(center: GeoPoint, zoom: u8, size: MapSize) -> Self {
        Self {
            center,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            size,
        }
    }

    /// View showing all of `viewport` at the highest zoom in
    /// `MIN_ZOOM..=max_zoom` that fits it.
    pub fn fit(viewport: &Viewport, size: MapSize, max_zoom: u8) -> Self {
        let (west, north) = project(&GeoPoint::new(viewport.north(), viewport.west()), 0.0);
        let (east, south) = project(&GeoPoint::new(viewport.south(), viewport.east()), 0.0);
        let center = unproject((west + east) / 2.0, (north + south) / 2.0, 0.0);

        let scale = (f64::from(size.width) / (east - west)).min(f64::from(size.height) / (south - north));
        let zoom = if scale.is_finite() {
            scale.log2().floor().clamp(f64::from(MIN_ZOOM), f64::from(max_zoom)) as u8
        } else {
            max_zoom
        };
        Self::new(center, zoom, size)
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn size(&self) -> MapSize {
        self.size
    }

    pub fn bounds(&self) -> Viewport {
        let zoom = f64::from(self.zoom);
        let (x, y) = project(&self.center, zoom);
        let half_w = f64::from(self.size.width) / 2.0;
        let half_h = f64::from(self.size.height) / 2.0;
        Viewport::new(
            unproject(x - half_w, y + half_h, zoom),
            unproject(x + half_w, y - half_h, zoom),
        )
    }
}

/// Inputs that decide whether the map has to redraw its markers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderProps {
    pub banners: Vec<Banner>,
    pub selected_banner_id: Option<BannerId>,
    pub zoom_request_id: Option<u64>,
}

/// Redraw only when the ordered banner list differs structurally, the
/// selection changed, or a new zoom-to-banner request arrived.
pub fn needs_render(previous: &RenderProps, next: &RenderProps) -> bool {
    previous.zoom_request_id != next.zoom_request_id
        || previous.selected_banner_id != next.selected_banner_id
        || previous.banners != next.banners
}

#[derive(Debug, Default)]
pub struct RenderGuard {
    last: Option<RenderProps>,
}

impl RenderGuard {
    /// Returns true and remembers `next` when it warrants a redraw.
    pub fn should_render(&mut self, next: &RenderProps) -> bool {
        let render = self
            .last
            .as_ref()
            .is_none_or(|previous| needs_render(previous, next));
        if render {
            self.last = Some(next.clone());
        }
        render
    }
}

/// Sole owner of the map view. Everything else reads viewports derived from it.
#[derive(Debug)]
pub struct ViewportTracker {
    view: MapView,
    query: String,
    guard: RenderGuard,
}

impl ViewportTracker {
    /// Resolve the first view from a deep link: explicit bounds, then
    /// `lat`/`lng`/`zoom`, then the world view at the minimum zoom.
    pub fn from_query(query: &str, size: MapSize) -> Self {
        let view = match bounds_codec::parse(query) {
            Some(DeepLink::Bounds(bounds)) => MapView::fit(&bounds, size, MAX_ZOOM),
            Some(DeepLink::Center { center, zoom }) => MapView::new(center, zoom, size),
            None => {
                debug!(query, "no usable view in link, using default view");
                MapView::new(GeoPoint::new(0.0, 0.0), DEFAULT_ZOOM, size)
            }
        };
        Self {
            view,
            query: query.strip_prefix('?').unwrap_or(query).to_owned(),
            guard: RenderGuard::default(),
        }
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn viewport(&self) -> Viewport {
        self.view.bounds()
    }

    pub fn pan_to(&mut self, center: GeoPoint) {
        self.view = MapView::new(center, self.view.zoom, self.view.size);
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.view = MapView::new(self.view.center, zoom, self.view.size);
    }

    pub fn resize(&mut self, size: MapSize) {
        self.view = MapView::new(self.view.center, self.view.zoom, size);
    }

    /// Finish a pan/zoom gesture: rewrite the link to the live view and
    /// return the viewport to aggregate.
    pub fn settle(&mut self) -> Viewport {
        self.query = bounds_codec::serialize(&self.query, self.view.center, self.view.zoom);
        self.view.bounds()
    }

    /// Fit the view to a banner's extent, capped at the zoom-to-banner
    /// maximum, and settle. `None` when the banner has no usable extent.
    pub fn fit_banner(&mut self, banner: &Banner) -> Option<Viewport> {
        let bounds = banner.bounds()?;
        self.view = MapView::fit(&bounds, self.view.size, ZOOM_TO_BANNER_MAX_ZOOM);
        Some(self.settle())
    }

    pub fn should_render(&mut self, props: &RenderProps) -> bool {
        self.guard.should_render(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::banner;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn world_view_bounds_at_minimum_zoom() {
        let view = MapView::new(GeoPoint::new(0.0, 0.0), 3, MapSize::default());
        let bounds = view.bounds();
        assert!(close(bounds.west(), -112.5));
        assert!(close(bounds.east(), 112.5));
        assert!(close(bounds.north(), -bounds.south()));
        assert!(bounds.north() > 0.0 && bounds.north() < MAX_MERCATOR_LATITUDE);
    }

    #[test]
    fn view_over_antimeridian_keeps_continuous_longitudes() {
        let view = MapView::new(GeoPoint::new(0.0, 180.0), 3, MapSize::default());
        let bounds = view.bounds();
        assert!(close(bounds.west(), 67.5));
        assert!(close(bounds.east(), 292.5));
    }

    #[test]
    fn zoom_is_clamped_to_supported_range() {
        let size = MapSize::default();
        assert_eq!(MapView::new(GeoPoint::new(0.0, 0.0), 0, size).zoom(), MIN_ZOOM);
        assert_eq!(MapView::new(GeoPoint::new(0.0, 0.0), 30, size).zoom(), MAX_ZOOM);
    }

    #[test]
    fn fit_picks_largest_zoom_that_shows_bounds() {
        let target = Viewport::from_edges(10.0, 170.0, 20.0, 190.0);
        let view = MapView::fit(&target, MapSize::default(), MAX_ZOOM);
        assert_eq!(view.zoom(), 6);
        assert!(close(view.center().longitude, 180.0));

        let bounds = view.bounds();
        assert!(bounds.west() <= target.west() && bounds.east() >= target.east());
        assert!(bounds.south() <= target.south() && bounds.north() >= target.north());
    }

    #[test]
    fn fit_of_a_point_uses_max_zoom() {
        let point = Viewport::from_edges(1.0, 1.0, 1.0, 1.0);
        assert_eq!(MapView::fit(&point, MapSize::default(), 15).zoom(), 15);
    }

    #[test]
    fn explicit_bounds_win_over_center() {
        let tracker = ViewportTracker::from_query(
            "lat=48&lng=2&zoom=12&bounds=10,170,20,-170",
            MapSize::default(),
        );
        assert_eq!(tracker.view().zoom(), 6);
        assert!(close(tracker.view().center().longitude, 180.0));
    }

    #[test]
    fn center_link_is_used_without_bounds() {
        let tracker = ViewportTracker::from_query("?lat=48.5&lng=2.25&zoom=12", MapSize::default());
        assert_eq!(tracker.view().center(), GeoPoint::new(48.5, 2.25));
        assert_eq!(tracker.view().zoom(), 12);
    }

    #[test]
    fn unusable_link_falls_back_to_default_view() {
        let tracker = ViewportTracker::from_query("bounds=oops&zoom=9", MapSize::default());
        assert_eq!(tracker.view().center(), GeoPoint::new(0.0, 0.0));
        assert_eq!(tracker.view().zoom(), DEFAULT_ZOOM);
    }

    #[test]
    fn settle_rewrites_link_and_drops_bounds() {
        let mut tracker =
            ViewportTracker::from_query("tab=map&bounds=10,170,20,-170", MapSize::default());
        tracker.pan_to(GeoPoint::new(-33.5, 151.25));
        tracker.set_zoom(9);
        let viewport = tracker.settle();

        assert_eq!(tracker.query(), "tab=map&lat=-33.5&lng=151.25&zoom=9");
        assert_eq!(viewport, tracker.viewport());
        assert!(viewport.contains(&GeoPoint::new(-33.5, 151.25)));
    }

    #[test]
    fn fit_banner_caps_zoom_and_settles() {
        let mut tracker = ViewportTracker::from_query("", MapSize::default());
        let viewport = tracker
            .fit_banner(&banner(1, "Tiny", 51.5, -0.12))
            .expect("finite banner");
        assert_eq!(tracker.view().zoom(), ZOOM_TO_BANNER_MAX_ZOOM);
        assert!(viewport.contains(&GeoPoint::new(51.5, -0.12)));
        assert!(tracker.query().contains("zoom=15"));
    }

    #[test]
    fn render_guard_ignores_identical_props() {
        let mut guard = RenderGuard::default();
        let props = RenderProps {
            banners: vec![banner(1, "A", 0.0, 0.0)],
            selected_banner_id: None,
            zoom_request_id: None,
        };
        assert!(guard.should_render(&props));
        assert!(!guard.should_render(&props.clone()));
    }

    #[test]
    fn render_guard_reacts_to_each_trigger() {
        let base = RenderProps {
            banners: vec![banner(1, "A", 0.0, 0.0), banner(2, "B", 0.0, 0.0)],
            selected_banner_id: None,
            zoom_request_id: None,
        };

        let mut reordered = base.clone();
        reordered.banners.reverse();
        assert!(needs_render(&base, &reordered));

        let mut moved = base.clone();
        moved.banners[0].start_longitude = 360.0;
        assert!(needs_render(&base, &moved));

        let selected = RenderProps {
            selected_banner_id: Some(2),
            ..base.clone()
        };
        assert!(needs_render(&base, &selected));

        let zoomed = RenderProps {
            zoom_request_id: Some(1),
            ..base.clone()
        };
        assert!(needs_render(&base, &zoomed));
        assert!(!needs_render(&base, &base.clone()));
    }
}
