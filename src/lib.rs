//! zonal_stats: per-polygon statistics over a raster band, in parallel
//!
//! For every zone (polygon) of a vector dataset the library rasterizes the
//! zone against the raster's pixel grid, masks nodata, and reduces the
//! covered pixels to summary statistics and/or a categorical histogram.
//! Zones are reduced on a worker pool and the results are merged back into
//! the zone table as new columns, in the original row order.
//!
//! ## Key Features
//!
//! - **Parallel Processing**: zones are fanned out over a Rayon pool built per run
//! - **Statistical Functions**: count, min, max, mean, sum, std, median, majority,
//!   minority, unique, range, nodata, nan and arbitrary percentiles
//! - **Categorical Histograms**: pixel counts per class, relabelled via a code map
//! - **Explicit Coverage Policy**: pixel-centre-in by default, all-touched on request
//! - **Graceful Degradation**: bad or disjoint zones yield undefined statistics,
//!   never a failed batch
//!
//! ## Module Organization
//!
//! - [`raster`]: affine transform and the shared raster band
//! - [`rasterize`]: geometry to pixel coverage
//! - [`statistics`]: statistic vocabulary, reductions and categorical counts
//! - [`reducer`]: the single-zone reducer
//! - [`zones`]: the zone attribute table
//! - [`dispatcher`]: parallel fan-out and ordered reassembly
//! - [`parallel`]: worker pool configuration and cancellation
//! - [`config`], [`data_source`], [`pipeline`]: end-to-end runs around I/O collaborators
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust
//! use geo::polygon;
//! use ndarray::array;
//! use zonal_stats::prelude::*;
//!
//! let band = array![[1.0, 1.0, 2.0], [1.0, 1.0, 2.0], [3.0, 3.0, -1.0]];
//! let raster = RasterContext::new(band, Affine::north_up(0.0, 3.0, 1.0, 1.0), Some(-1.0)).unwrap();
//!
//! let zone = polygon![(x: 0.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 3.0), (x: 0.0, y: 3.0), (x: 0.0, y: 1.0)];
//! let table = ZoneTable::from_geometries(vec![zone.into()]);
//! let request = StatisticRequest::continuous(&["mean", "max"]).unwrap();
//!
//! let table = Dispatcher::new(ParallelConfig::with_workers(2))
//!     .run(table, &raster, &request)
//!     .unwrap();
//! assert_eq!(table.float("mean").unwrap(), &[Some(1.0)]);
//! ```

pub mod config;
pub mod data_source;
pub mod dispatcher;
pub mod errors;
pub mod logging;
pub mod parallel;
pub mod pipeline;
pub mod raster;
pub mod rasterize;
pub mod reducer;
pub mod statistics;
pub mod zones;

pub use dispatcher::{run, DispatchReport, Dispatcher};
pub use errors::{GeometryWarning, InputError, OutputError, ProcessingError, Result, ZonalError};
pub use reducer::{reduce, ZoneResult};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::ZonalConfig;
    pub use crate::data_source::{RasterReader, VectorReader, ZoneTableWriter};
    pub use crate::dispatcher::{DispatchReport, Dispatcher};
    pub use crate::errors::{GeometryWarning, Result, ZonalError};
    pub use crate::parallel::{CancellationToken, ParallelConfig};
    pub use crate::pipeline::{run_pipeline, PipelineOutcome};
    pub use crate::raster::{Affine, RasterContext};
    pub use crate::rasterize::{CoverageRule, DEFAULT_COVERAGE_RULE};
    pub use crate::reducer::{RasterStatsReducer, ZoneReducer, ZoneResult};
    pub use crate::statistics::{CategoryMap, Statistic, StatisticRequest};
    pub use crate::zones::{Column, ZoneTable};
}
