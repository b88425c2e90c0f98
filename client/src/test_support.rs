//! Fakes shared by the engine tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use banner_map_shared::{Banner, BannerId, Mission, Objective, Poi, PoiKind, Step, Viewport};
use tokio::sync::oneshot;

use crate::error::MapError;
use crate::source::{BannerSource, MemoryBannerSource, SourceFuture};

pub(crate) fn banner(id: BannerId, title: &str, latitude: f64, longitude: f64) -> Banner {
    Banner {
        id,
        title: title.to_owned(),
        number_of_missions: 6,
        missions: BTreeMap::new(),
        start_latitude: latitude,
        start_longitude: longitude,
        length_meters: 1_000.0,
    }
}

/// Copy of `summary` with one mission whose single portal sits at `poi`.
pub(crate) fn detailed(summary: &Banner, poi: (f64, f64)) -> Banner {
    let mut detail = summary.clone();
    detail.missions.insert(
        0,
        Mission {
            id: format!("{}-0", summary.id),
            title: format!("{} 1/1", summary.title),
            picture: String::new(),
            steps: vec![Step {
                poi: Poi {
                    id: format!("{}-poi", summary.id),
                    title: "Portal".to_owned(),
                    latitude: poi.0,
                    longitude: poi.1,
                    picture: String::new(),
                    kind: PoiKind::Portal,
                },
                objective: Objective::Hack,
            }],
        },
    );
    detail
}

/// In-memory source whose calls can be recorded, failed, or held open until
/// the test releases them.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    inner: MemoryBannerSource,
    queries: Mutex<Vec<Viewport>>,
    detail_calls: AtomicUsize,
    details: Mutex<HashMap<BannerId, Banner>>,
    query_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    detail_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    fail_queries: AtomicBool,
    fail_details: AtomicBool,
}

impl ScriptedSource {
    pub(crate) fn new(banners: Vec<Banner>) -> Self {
        Self {
            inner: MemoryBannerSource::new(banners),
            ..Self::default()
        }
    }

    /// The next query call waits until the returned sender fires or drops.
    pub(crate) fn hold_next_query(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.query_gates.lock().expect("gate lock").push_back(rx);
        tx
    }

    pub(crate) fn hold_next_detail(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.detail_gates.lock().expect("gate lock").push_back(rx);
        tx
    }

    /// Answer detail calls for `detail.id` with `detail` instead of the summary.
    pub(crate) fn set_detail(&self, detail: Banner) {
        self.details.lock().expect("detail lock").insert(detail.id, detail);
    }

    pub(crate) fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_details(&self, fail: bool) {
        self.fail_details.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn queries(&self) -> Vec<Viewport> {
        self.queries.lock().expect("query log lock").clone()
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

impl BannerSource for ScriptedSource {
    fn query_banners<'a>(&'a self, bound: &'a Viewport) -> SourceFuture<'a, Vec<Banner>> {
        Box::pin(async move {
            self.queries.lock().expect("query log lock").push(*bound);
            let gate = self.query_gates.lock().expect("gate lock").pop_front();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_queries.load(Ordering::SeqCst) {
                return Err(MapError::QueryFailure("scripted failure".to_owned()));
            }
            self.inner.query_banners(bound).await
        })
    }

    fn fetch_banner_detail(&self, id: BannerId) -> SourceFuture<'_, Banner> {
        Box::pin(async move {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.detail_gates.lock().expect("gate lock").pop_front();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_details.load(Ordering::SeqCst) {
                return Err(MapError::DetailFetchFailure {
                    id,
                    reason: "scripted failure".to_owned(),
                });
            }
            let detail = self.details.lock().expect("detail lock").get(&id).cloned();
            match detail {
                Some(detail) => Ok(detail),
                None => self.inner.fetch_banner_detail(id).await,
            }
        })
    }
}
