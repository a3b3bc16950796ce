//! The zone reducer: one geometry in, one [`ZoneResult`] out
//!
//! Reduction never fails. Geometry problems are folded into the result as a
//! [`GeometryWarning`] with undefined statistics and zero category counts, so
//! a single malformed polygon cannot abort a batch.

use crate::errors::GeometryWarning;
use crate::raster::RasterContext;
use crate::rasterize::rasterize;
use crate::statistics::{CategoryCounts, PixelSample, Statistic, StatisticRequest};
use geo::Geometry;

/// Statistics and category counts for a single zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneResult {
    /// One entry per requested statistic, in request order.
    pub statistics: Vec<(Statistic, Option<f64>)>,
    /// Present in categorical mode.
    pub categories: Option<CategoryCounts>,
    /// Covered pixels that survived nodata and NaN masking.
    pub valid_pixels: usize,
    pub warning: Option<GeometryWarning>,
}

impl ZoneResult {
    /// Result for a zone that could not be rasterized.
    #[must_use]
    pub fn undefined(request: &StatisticRequest, warning: GeometryWarning) -> Self {
        Self::from_sample(&PixelSample::default(), request, Some(warning))
    }

    fn from_sample(sample: &PixelSample, request: &StatisticRequest, warning: Option<GeometryWarning>) -> Self {
        let statistics = request
            .stats()
            .iter()
            .map(|&stat| (stat, sample.compute(stat)))
            .collect();
        let categories = request
            .is_categorical()
            .then(|| CategoryCounts::tally(sample.values(), request.category_map()));
        Self {
            statistics,
            categories,
            valid_pixels: sample.len(),
            warning,
        }
    }

    /// Value of a requested statistic; `None` if it was not requested.
    #[must_use]
    pub fn statistic(&self, stat: Statistic) -> Option<Option<f64>> {
        self.statistics.iter().find(|(s, _)| *s == stat).map(|(_, v)| *v)
    }

    /// Value of a requested statistic looked up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        name.parse().ok().and_then(|stat| self.statistic(stat))
    }

    #[must_use]
    pub fn category(&self, label: &str) -> Option<u64> {
        self.categories.as_ref().and_then(|c| c.get(label))
    }
}

/// Reduces one zone against the shared raster.
///
/// Implementations must be pure: the same inputs always give the same
/// result, and nothing shared is mutated.
pub trait ZoneReducer: Sync {
    fn reduce(&self, geometry: &Geometry<f64>, raster: &RasterContext, request: &StatisticRequest) -> ZoneResult;
}

/// Rasterize, mask and reduce, in the manner of `rasterstats.zonal_stats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterStatsReducer;

impl ZoneReducer for RasterStatsReducer {
    fn reduce(&self, geometry: &Geometry<f64>, raster: &RasterContext, request: &StatisticRequest) -> ZoneResult {
        match rasterize(geometry, raster, request.coverage()) {
            Ok(coverage) => {
                let sample = PixelSample::collect(coverage.values(raster), raster.nodata());
                ZoneResult::from_sample(&sample, request, None)
            }
            Err(warning) => ZoneResult::undefined(request, warning),
        }
    }
}

/// Reduce a single zone with the default reducer.
#[must_use]
pub fn reduce(geometry: &Geometry<f64>, raster: &RasterContext, request: &StatisticRequest) -> ZoneResult {
    RasterStatsReducer.reduce(geometry, raster, request)
}
