use std::sync::Arc;

use banner_map_shared::geo::FULL_TURN;
use banner_map_shared::{Banner, QueryRect, extend_sorted, merge_banners};
use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::error::Result;
use crate::source::BannerSource;

/// Runs the query rectangles for one viewport and folds the answers into a
/// single title-ordered banner list in the viewport's longitude frame.
pub struct BannerAggregator<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> Clone for BannerAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: BannerSource + ?Sized> BannerAggregator<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query every rectangle concurrently and merge the results.
    ///
    /// A `pinned` banner detail always ends up in the list. When the viewport
    /// already returned its summary, the detail replaces it in that summary's
    /// longitude frame. Any failing query fails the whole aggregation; partial
    /// results are never returned.
    pub async fn aggregate(
        &self,
        rects: &[QueryRect],
        pinned: Option<&Banner>,
    ) -> Result<Vec<Banner>> {
        let sets = try_join_all(rects.iter().map(|rect| self.query_rect(rect))).await?;
        let mut merged = merge_banners(sets);

        let Some(detail) = pinned else {
            return Ok(merged);
        };
        let detail = match merged.iter().position(|banner| banner.id == detail.id) {
            Some(index) => {
                let summary = merged.remove(index);
                let turns = ((summary.start_longitude - detail.start_longitude) / FULL_TURN).round();
                detail.with_longitude_offset(turns * FULL_TURN)
            }
            None => {
                debug!(banner_id = detail.id, "pinned banner outside viewport");
                detail.clone()
            }
        };
        Ok(extend_sorted(merged, vec![detail]))
    }

    async fn query_rect(&self, rect: &QueryRect) -> Result<Vec<Banner>> {
        let banners = self
            .source
            .query_banners(&rect.bound)
            .await
            .inspect_err(|e| warn!(bound = ?rect.bound, error = %e, "banner query failed"))?;
        debug!(
            bound = ?rect.bound,
            offset = rect.longitude_offset,
            count = banners.len(),
            "banner query returned"
        );

        if !rect.is_shifted() {
            return Ok(banners);
        }
        Ok(banners
            .iter()
            .map(|banner| banner.with_longitude_offset(rect.longitude_offset))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use banner_map_shared::{BannerId, Viewport, decompose};

    use super::*;
    use crate::error::MapError;
    use crate::test_support::{ScriptedSource, banner};

    fn aggregator(banners: Vec<Banner>) -> (Arc<ScriptedSource>, BannerAggregator<ScriptedSource>) {
        let source = Arc::new(ScriptedSource::new(banners));
        (Arc::clone(&source), BannerAggregator::new(source))
    }

    fn rect(west: f64, east: f64, longitude_offset: f64) -> QueryRect {
        QueryRect {
            bound: Viewport::from_edges(-10.0, west, 10.0, east),
            longitude_offset,
        }
    }

    fn titles(banners: &[Banner]) -> Vec<&str> {
        banners.iter().map(|b| b.title.as_str()).collect()
    }

    #[tokio::test]
    async fn banner_in_two_rects_appears_once() {
        let (_, aggregator) = aggregator(vec![banner(42, "Answer", 0.0, 5.0)]);
        let merged = aggregator
            .aggregate(&[rect(0.0, 10.0, 0.0), rect(4.0, 6.0, 0.0)], None)
            .await
            .expect("aggregation succeeds");
        assert_eq!(merged.iter().filter(|b| b.id == 42).count(), 1);
    }

    #[tokio::test]
    async fn result_is_title_ordered_across_rects() {
        let (_, aggregator) = aggregator(vec![
            banner(1, "Zebra", 0.0, -175.0),
            banner(2, "Alpha", 0.0, 175.0),
            banner(3, "Mango", 0.0, 178.0),
        ]);
        let viewport = Viewport::from_edges(-10.0, 170.0, 10.0, 190.0);
        let merged = aggregator
            .aggregate(&decompose(&viewport), None)
            .await
            .expect("aggregation succeeds");
        assert_eq!(titles(&merged), vec!["Alpha", "Mango", "Zebra"]);
    }

    #[tokio::test]
    async fn shifted_rect_moves_results_into_viewport_frame() {
        let (_, aggregator) = aggregator(vec![
            banner(1, "Far East", 0.0, 175.0),
            banner(2, "Near West", 0.0, -175.0),
        ]);
        let viewport = Viewport::from_edges(-10.0, -190.0, 10.0, -170.0);
        let merged = aggregator
            .aggregate(&decompose(&viewport), None)
            .await
            .expect("aggregation succeeds");

        let longitudes: Vec<(BannerId, f64)> =
            merged.iter().map(|b| (b.id, b.start_longitude)).collect();
        assert_eq!(longitudes, vec![(1, -185.0), (2, -175.0)]);
        assert!(merged.iter().all(|b| viewport.contains(&b.start_point())));
    }

    #[tokio::test]
    async fn wrapped_slice_matches_direct_query_up_to_shift() {
        let world = vec![
            banner(1, "A", 0.0, 171.0),
            banner(2, "B", 5.0, 179.5),
            banner(3, "C", 0.0, 160.0),
            banner(4, "D", 0.0, -175.0),
        ];
        let (_, aggregator) = aggregator(world);

        let direct = aggregator
            .aggregate(&[rect(170.0, 180.0, 0.0)], None)
            .await
            .expect("direct query");
        let wrapped = aggregator
            .aggregate(&decompose(&Viewport::from_edges(-10.0, -190.0, 10.0, -170.0)), None)
            .await
            .expect("wrapped query");

        let slice: Vec<Banner> = wrapped
            .into_iter()
            .filter(|b| b.start_longitude < -180.0)
            .map(|b| b.with_longitude_offset(360.0))
            .collect();
        assert_eq!(slice, direct);
    }

    #[tokio::test]
    async fn any_failed_query_fails_the_aggregation() {
        let (source, aggregator) = aggregator(vec![banner(1, "A", 0.0, 5.0)]);
        source.fail_queries(true);
        let result = aggregator
            .aggregate(&[rect(0.0, 10.0, 0.0), rect(-180.0, -170.0, 360.0)], None)
            .await;
        assert!(matches!(result, Err(MapError::QueryFailure(_))));
    }

    #[tokio::test]
    async fn pinned_banner_outside_viewport_is_merged_in() {
        let (source, aggregator) = aggregator(vec![banner(1, "Inside", 0.0, 5.0)]);
        let pinned = banner(2, "Elsewhere", 40.0, 100.0);
        let merged = aggregator
            .aggregate(&[rect(0.0, 10.0, 0.0)], Some(&pinned))
            .await
            .expect("aggregation succeeds");
        assert_eq!(titles(&merged), vec!["Elsewhere", "Inside"]);
        assert_eq!(source.detail_calls(), 0);
    }

    #[tokio::test]
    async fn pinned_detail_replaces_summary_in_its_frame() {
        let (source, aggregator) = aggregator(vec![
            banner(1, "Dateline", 0.0, 175.0),
            banner(2, "Alpha", 0.0, -175.0),
        ]);
        let mut detail = banner(1, "Dateline", 0.0, 175.0);
        detail.length_meters = 4_200.0;

        let viewport = Viewport::from_edges(-10.0, -190.0, 10.0, -170.0);
        let merged = aggregator
            .aggregate(&decompose(&viewport), Some(&detail))
            .await
            .expect("aggregation succeeds");

        assert_eq!(titles(&merged), vec!["Alpha", "Dateline"]);
        assert_eq!(merged[1].length_meters, 4_200.0);
        assert_eq!(merged[1].start_longitude, -185.0);
        assert_eq!(source.detail_calls(), 0);
    }

    #[tokio::test]
    async fn no_rects_yields_empty_list() {
        let (source, aggregator) = aggregator(vec![banner(1, "A", 0.0, 5.0)]);
        let merged = aggregator.aggregate(&[], None).await.expect("empty aggregation");
        assert!(merged.is_empty());
        assert!(source.queries().is_empty());
    }
}
