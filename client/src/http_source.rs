use banner_map_shared::{Banner, BannerId, Viewport};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{self, BANNERS_PATH, USER_AGENT};
use crate::error::{MapError, Result};
use crate::source::{BannerSource, SourceFuture};

/// Banner source backed by the Bannergress REST API.
#[derive(Debug, Clone)]
pub struct HttpBannerSource {
    client: reqwest::Client,
    banners_url: Url,
}

impl HttpBannerSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut banners_url = Url::parse(base_url)
            .map_err(|e| MapError::MalformedInput(format!("API base URL {base_url:?}: {e}")))?;
        {
            let mut segments = banners_url.path_segments_mut().map_err(|_| {
                MapError::MalformedInput(format!("API base URL {base_url:?} cannot have a path"))
            })?;
            segments.pop_if_empty().extend(BANNERS_PATH.split('/'));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config::http_timeout())
            .connect_timeout(config::connect_timeout())
            .build()
            .map_err(|e| MapError::Client(e.to_string()))?;

        Ok(Self {
            client,
            banners_url,
        })
    }

    /// Source pointed at `BANNER_API_URL`, or the public API.
    pub fn from_env() -> Result<Self> {
        Self::new(&config::api_base_url())
    }

    fn area_url(&self, bound: &Viewport) -> Url {
        let mut url = self.banners_url.clone();
        url.query_pairs_mut()
            .append_pair("minLatitude", &bound.south().to_string())
            .append_pair("maxLatitude", &bound.north().to_string())
            .append_pair("minLongitude", &bound.west().to_string())
            .append_pair("maxLongitude", &bound.east().to_string());
        url
    }

    fn detail_url(&self, id: BannerId) -> Url {
        let mut url = self.banners_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&id.to_string());
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("status {}", status.as_u16()));
        }
        response.json::<T>().await.map_err(|e| e.to_string())
    }
}

impl BannerSource for HttpBannerSource {
    fn query_banners<'a>(&'a self, bound: &'a Viewport) -> SourceFuture<'a, Vec<Banner>> {
        Box::pin(async move {
            if !bound.is_within_world() {
                return Err(MapError::QueryFailure(format!(
                    "bound {bound:?} outside [-180, 180]"
                )));
            }
            let url = self.area_url(bound);
            debug!(%url, "querying banners");
            self.get_json::<Vec<Banner>>(url).await.map_err(|reason| {
                warn!(bound = ?bound, reason = %reason, "banner area request failed");
                MapError::QueryFailure(reason)
            })
        })
    }

    fn fetch_banner_detail(&self, id: BannerId) -> SourceFuture<'_, Banner> {
        Box::pin(async move {
            let url = self.detail_url(id);
            debug!(%url, "fetching banner detail");
            self.get_json::<Banner>(url)
                .await
                .map_err(|reason| MapError::DetailFetchFailure { id, reason })
        })
    }
}
