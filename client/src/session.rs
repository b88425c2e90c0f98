//! The coordinator that owns the map state and drives aggregation.
//!
//! State lives behind a lock that is never held across a data-source call.
//! Each aggregation and detail fetch takes a generation ticket before
//! suspending; when it resumes, a ticket that is no longer current means a
//! newer request superseded it and the response is dropped.

use std::sync::Arc;

use banner_map_shared::{Banner, BannerId, GeoPoint, Viewport, decompose};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::aggregate::BannerAggregator;
use crate::config::{event_buffer, zoom_settle_delay};
use crate::generation::RequestGeneration;
use crate::selection::{Effect, Selection, Status};
use crate::source::BannerSource;
use crate::tracker::{MapSize, RenderProps, ViewportTracker};

#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    BannersChanged {
        banners: Arc<Vec<Banner>>,
        status: Status,
    },
    SelectionChanged {
        selected_banner_id: Option<BannerId>,
        frozen_viewport: Option<Viewport>,
        status: Status,
    },
    UrlChanged {
        query: String,
    },
    /// The marker layer must redraw with these props.
    Render(RenderProps),
    /// The view was moved to show a banner.
    FitBounds {
        viewport: Viewport,
    },
}

#[derive(Debug)]
struct SessionState {
    tracker: ViewportTracker,
    selection: Selection,
    aggregation: RequestGeneration,
    selection_fetch: RequestGeneration,
    /// Full banner behind the current selection. Area queries only return
    /// summaries without missions.
    selected_detail: Option<Banner>,
    banners: Arc<Vec<Banner>>,
    status: Status,
    zoom_request_id: Option<u64>,
}

impl SessionState {
    fn render_props(&self) -> RenderProps {
        RenderProps {
            banners: self.banners.as_ref().clone(),
            selected_banner_id: self.selection.selected_banner_id(),
            zoom_request_id: self.zoom_request_id,
        }
    }

    fn pinned_detail(&self) -> Option<Banner> {
        let pinned = self.selection.pinned_banner()?;
        self.selected_detail
            .as_ref()
            .filter(|detail| detail.id == pinned)
            .cloned()
    }

    fn selection_event(&self) -> MapEvent {
        MapEvent::SelectionChanged {
            selected_banner_id: self.selection.selected_banner_id(),
            frozen_viewport: self.selection.frozen_viewport(),
            status: self.selection.status(),
        }
    }
}

pub struct MapSession<S: ?Sized> {
    aggregator: BannerAggregator<S>,
    state: RwLock<SessionState>,
    events: broadcast::Sender<MapEvent>,
}

impl<S: BannerSource + ?Sized> MapSession<S> {
    /// Build a session whose first view comes from the deep-link `query`.
    pub fn new(source: Arc<S>, query: &str, size: MapSize) -> Self {
        let (events, _) = broadcast::channel(event_buffer());
        Self {
            aggregator: BannerAggregator::new(source),
            state: RwLock::new(SessionState {
                tracker: ViewportTracker::from_query(query, size),
                selection: Selection::Idle,
                aggregation: RequestGeneration::default(),
                selection_fetch: RequestGeneration::default(),
                selected_detail: None,
                banners: Arc::new(Vec::new()),
                status: Status::Initial,
                zoom_request_id: None,
            }),
            events,
        }
    }

    /// Receive every event published from now on. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<MapEvent> {
        self.events.subscribe()
    }

    /// Settle the initial view, exactly as if the user had just moved the map.
    pub async fn start(&self) {
        self.settle_with(|_| {}).await;
    }

    /// A pan or zoom gesture finished with the map at `center`/`zoom`.
    pub async fn on_viewport_settled(&self, center: GeoPoint, zoom: u8) {
        self.settle_with(|tracker| {
            tracker.pan_to(center);
            tracker.set_zoom(zoom);
        })
        .await;
    }

    /// The map container changed size.
    pub async fn on_resized(&self, size: MapSize) {
        self.settle_with(|tracker| tracker.resize(size)).await;
    }

    async fn settle_with(&self, update: impl FnOnce(&mut ViewportTracker)) {
        let query = {
            let mut state = self.state.write().await;
            update(&mut state.tracker);
            let viewport = state.tracker.settle();
            debug!(?viewport, "viewport settled");
            state.tracker.query().to_owned()
        };
        self.publish(MapEvent::UrlChanged { query });
        self.refresh().await;
    }

    /// Re-aggregate banners for the current viewport and selection. Only the
    /// most recently started refresh may publish its result.
    pub async fn refresh(&self) {
        let (ticket, rects, pinned) = {
            let mut state = self.state.write().await;
            let live = state.tracker.viewport();
            let viewport = state.selection.aggregation_viewport(live);
            let rects = decompose(&viewport);
            let pinned = state.pinned_detail();
            let ticket = state.aggregation.issue();
            state.status = Status::Loading;
            self.publish(MapEvent::BannersChanged {
                banners: Arc::clone(&state.banners),
                status: Status::Loading,
            });
            (ticket, rects, pinned)
        };

        let result = self.aggregator.aggregate(&rects, pinned.as_ref()).await;

        let mut state = self.state.write().await;
        if !state.aggregation.is_current(ticket) {
            debug!(?ticket, "discarding stale aggregation result");
            return;
        }
        match result {
            Ok(banners) => {
                debug!(count = banners.len(), "aggregation applied");
                state.banners = Arc::new(banners);
                state.status = Status::Ready;
            }
            Err(e) => {
                warn!(error = %e, "aggregation failed");
                state.banners = Arc::new(Vec::new());
                state.status = Status::Error;
            }
        }
        self.publish(MapEvent::BannersChanged {
            banners: Arc::clone(&state.banners),
            status: state.status,
        });
        self.publish_render(&mut state);
    }

    /// Toggle the selection of `banner_id`. A new selection freezes the
    /// current viewport until its detail arrives.
    pub async fn select(&self, banner_id: BannerId) {
        let (effect, ticket) = {
            let mut state = self.state.write().await;
            let live = state.tracker.viewport();
            let (next, effect) = state.selection.select(banner_id, live);
            state.selection = next;
            let ticket = match effect {
                Effect::FetchDetail(_) => Some(state.selection_fetch.issue()),
                Effect::Cleared => {
                    state.selection_fetch.invalidate();
                    state.selected_detail = None;
                    None
                }
                Effect::None => None,
            };
            if effect != Effect::None {
                self.publish(state.selection_event());
            }
            (effect, ticket)
        };

        match (effect, ticket) {
            (Effect::FetchDetail(id), Some(ticket)) => {
                let outcome = self.aggregator.source().fetch_banner_detail(id).await;
                {
                    let mut state = self.state.write().await;
                    if !state.selection_fetch.is_current(ticket) {
                        debug!(banner_id = id, "discarding stale banner detail");
                        return;
                    }
                    state.selection = state.selection.resolve(id, outcome.is_ok());
                    state.selected_detail = match outcome {
                        Ok(detail) => Some(detail),
                        Err(e) => {
                            warn!(banner_id = id, error = %e, "banner detail fetch failed");
                            None
                        }
                    };
                    info!(banner_id = id, status = ?state.selection.status(), "selection resolved");
                    self.publish(state.selection_event());
                }
                // The freeze is over either way; the list follows the live
                // viewport again.
                self.refresh().await;
            }
            (Effect::Cleared, _) => self.refresh().await,
            _ => {}
        }
    }

    /// Clear the selection and go back to the live viewport.
    pub async fn deselect(&self) {
        let effect = {
            let mut state = self.state.write().await;
            let (next, effect) = state.selection.deselect();
            state.selection = next;
            if effect == Effect::Cleared {
                state.selection_fetch.invalidate();
                state.selected_detail = None;
                self.publish(state.selection_event());
            }
            effect
        };
        if effect == Effect::Cleared {
            self.refresh().await;
        }
    }

    /// Animate the map to a banner in the current list after the layout
    /// settle delay. Returns the new viewport, or `None` for a banner that
    /// is not listed or has no usable extent.
    pub async fn zoom_to_banner(&self, banner_id: BannerId) -> Option<Viewport> {
        let banner = {
            let mut state = self.state.write().await;
            let banner = state.banners.iter().find(|b| b.id == banner_id).cloned()?;
            state.zoom_request_id = Some(state.zoom_request_id.map_or(1, |id| id.saturating_add(1)));
            self.publish_render(&mut state);
            banner
        };

        tokio::time::sleep(zoom_settle_delay()).await;

        let (viewport, query) = {
            let mut state = self.state.write().await;
            let viewport = state.tracker.fit_banner(&banner)?;
            (viewport, state.tracker.query().to_owned())
        };
        self.publish(MapEvent::FitBounds { viewport });
        self.publish(MapEvent::UrlChanged { query });
        self.refresh().await;
        Some(viewport)
    }

    pub async fn banners(&self) -> Arc<Vec<Banner>> {
        Arc::clone(&self.state.read().await.banners)
    }

    pub async fn status(&self) -> Status {
        self.state.read().await.status
    }

    pub async fn selection(&self) -> Selection {
        self.state.read().await.selection
    }

    /// Full detail of the selected banner, missions included.
    pub async fn selected_banner(&self) -> Option<Banner> {
        self.state.read().await.pinned_detail()
    }

    pub async fn query(&self) -> String {
        self.state.read().await.tracker.query().to_owned()
    }

    /// The live viewport, ignoring any frozen selection viewport.
    pub async fn viewport(&self) -> Viewport {
        self.state.read().await.tracker.viewport()
    }

    fn publish_render(&self, state: &mut SessionState) {
        let props = state.render_props();
        if state.tracker.should_render(&props) {
            self.publish(MapEvent::Render(props));
        }
    }

    fn publish(&self, event: MapEvent) {
        // No subscribers is fine: the session state is still queryable.
        let _ = self.events.send(event);
    }
}
