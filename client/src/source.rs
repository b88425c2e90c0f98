use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use banner_map_shared::{Banner, BannerId, Viewport};

use crate::error::{MapError, Result};

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The spatial data source answering banner queries.
///
/// Bounds handed to `query_banners` always lie inside `[-180, 180]`;
/// antimeridian handling happens before the call.
pub trait BannerSource: Send + Sync {
    /// Summary banners whose start point lies inside `bound`.
    fn query_banners<'a>(&'a self, bound: &'a Viewport) -> SourceFuture<'a, Vec<Banner>>;

    /// One banner including its missions.
    fn fetch_banner_detail(&self, id: BannerId) -> SourceFuture<'_, Banner>;
}

impl<S: BannerSource + ?Sized> BannerSource for Arc<S> {
    fn query_banners<'a>(&'a self, bound: &'a Viewport) -> SourceFuture<'a, Vec<Banner>> {
        (**self).query_banners(bound)
    }

    fn fetch_banner_detail(&self, id: BannerId) -> SourceFuture<'_, Banner> {
        (**self).fetch_banner_detail(id)
    }
}

/// Serves banners from memory, e.g. a JSON fixture exported from the API.
#[derive(Debug, Clone, Default)]
pub struct MemoryBannerSource {
    banners: Vec<Banner>,
}

impl MemoryBannerSource {
    pub fn new(banners: Vec<Banner>) -> Self {
        Self { banners }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Vec<Banner>>(json)
            .map(Self::new)
            .map_err(|e| MapError::MalformedInput(format!("banner fixture: {e}")))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            MapError::MalformedInput(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.banners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banners.is_empty()
    }

    fn within(&self, bound: &Viewport) -> Result<Vec<Banner>> {
        if !bound.is_within_world() {
            return Err(MapError::QueryFailure(format!(
                "bound {bound:?} outside [-180, 180]"
            )));
        }
        Ok(self
            .banners
            .iter()
            .filter(|banner| bound.contains(&banner.start_point()))
            .cloned()
            .collect())
    }

    fn detail(&self, id: BannerId) -> Result<Banner> {
        self.banners
            .iter()
            .find(|banner| banner.id == id)
            .cloned()
            .ok_or_else(|| MapError::DetailFetchFailure {
                id,
                reason: "unknown banner".to_owned(),
            })
    }
}

impl BannerSource for MemoryBannerSource {
    fn query_banners<'a>(&'a self, bound: &'a Viewport) -> SourceFuture<'a, Vec<Banner>> {
        Box::pin(async move { self.within(bound) })
    }

    fn fetch_banner_detail(&self, id: BannerId) -> SourceFuture<'_, Banner> {
        Box::pin(async move { self.detail(id) })
    }
}
