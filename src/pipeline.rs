//! End-to-end run: read inputs, dispatch, hand the table to the writer
//!
//! Writer failure does not discard the computed table. It is reported in
//! [`PipelineOutcome::output`], separately from the fatal errors returned by
//! [`run_pipeline`].

use crate::config::ZonalConfig;
use crate::data_source::{RasterReader, VectorReader, ZoneTableWriter};
use crate::dispatcher::Dispatcher;
use crate::errors::{GeometryWarning, OutputError, Result};
use crate::parallel::{get_parallel_info, CancellationToken};
use crate::zones::ZoneTable;
use tracing::{error, info};

/// What an end-to-end run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub table: ZoneTable,
    pub warnings: Vec<(usize, GeometryWarning)>,
    pub output: std::result::Result<(), OutputError>,
}

impl PipelineOutcome {
    #[must_use]
    pub fn written(&self) -> bool {
        self.output.is_ok()
    }
}

/// Run one configured batch.
///
/// # Errors
///
/// Input and processing failures, and cancellation. Writer failures are
/// returned inside the outcome instead.
pub fn run_pipeline<V, R, W>(
    config: &ZonalConfig,
    vectors: V,
    rasters: R,
    writer: W,
    cancel: Option<CancellationToken>,
) -> Result<PipelineOutcome>
where
    V: VectorReader,
    R: RasterReader,
    W: ZoneTableWriter,
{
    let request = config.request()?;
    let parallel = config.parallel();
    get_parallel_info().log_info();

    let zones = vectors.read_zones(&config.vector_path)?;
    info!(path = %config.vector_path.display(), zones = zones.len(), "🚀 loaded zones");
    let raster = rasters.read_band(&config.raster_path)?;
    info!(
        path = %config.raster_path.display(),
        shape = ?raster.values().shape(),
        nodata = ?raster.nodata(),
        "🚀 loaded raster band"
    );

    let mut dispatcher = Dispatcher::new(parallel);
    if let Some(token) = cancel {
        dispatcher = dispatcher.with_cancellation(token);
    }
    let report = dispatcher.run_with_report(zones, &raster, &request)?;

    let output = writer.write_zones(&report.table, &config.output_path);
    match &output {
        Ok(()) => info!(path = %config.output_path.display(), "✅ saved zonal statistics"),
        Err(e) => error!(path = %config.output_path.display(), error = %e, "failed to write zonal statistics"),
    }

    Ok(PipelineOutcome {
        table: report.table,
        warnings: report.warnings,
        output,
    })
}
