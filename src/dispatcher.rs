//! Parallel dispatch of zones to reducers and reassembly of the results
//!
//! A run validates the zone table, builds a worker pool scoped to the run,
//! fans zone indices out in contiguous chunks, places every result back at
//! its zone index, and only then merges result columns into the table.
//! The raster and the geometries are shared read-only by reference; the
//! table is mutated only after every worker has finished.

use crate::errors::{GeometryWarning, ProcessingError, Result, ZonalError};
use crate::parallel::{CancellationToken, ParallelConfig};
use crate::raster::RasterContext;
use crate::reducer::{RasterStatsReducer, ZoneReducer, ZoneResult};
use crate::statistics::StatisticRequest;
use crate::zones::{Column, ZoneTable};
use geo::Geometry;
use rayon::prelude::*;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Augmented table plus the zones that degraded to undefined results.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub table: ZoneTable,
    pub warnings: Vec<(usize, GeometryWarning)>,
}

/// Fans zones out over a worker pool and merges results into the table.
#[derive(Debug, Clone)]
pub struct Dispatcher<R = RasterStatsReducer> {
    reducer: R,
    parallel: ParallelConfig,
    cancel: Option<CancellationToken>,
}

impl Dispatcher<RasterStatsReducer> {
    #[must_use]
    pub fn new(parallel: ParallelConfig) -> Self {
        Self::with_reducer(RasterStatsReducer, parallel)
    }
}

impl<R: ZoneReducer> Dispatcher<R> {
    #[must_use]
    pub fn with_reducer(reducer: R, parallel: ParallelConfig) -> Self {
        Self {
            reducer,
            parallel,
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Compute the request for every zone and return the augmented table.
    ///
    /// # Errors
    ///
    /// [`ZonalError::Input`] for an unusable table, worker count or set of
    /// output column names,
    /// [`ZonalError::Processing`] if any zone's worker fails, and
    /// [`ZonalError::Cancelled`] if the token fires. No table is returned
    /// on error.
    pub fn run(&self, table: ZoneTable, raster: &RasterContext, request: &StatisticRequest) -> Result<ZoneTable> {
        self.run_with_report(table, raster, request).map(|report| report.table)
    }

    /// Like [`Dispatcher::run`], also reporting per-zone geometry warnings.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::run`].
    pub fn run_with_report(
        &self,
        mut table: ZoneTable,
        raster: &RasterContext,
        request: &StatisticRequest,
    ) -> Result<DispatchReport> {
        let geometries = table.validate()?;
        request.validate_columns()?;
        let results = self.reduce_all(geometries, raster, request)?;

        let warnings: Vec<(usize, GeometryWarning)> = results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.warning.clone().map(|w| (i, w)))
            .collect();
        for (zone, warning) in &warnings {
            warn!(zone, %warning, "zone reduced to undefined statistics");
        }

        merge_results(&mut table, &results, request)?;
        Ok(DispatchReport { table, warnings })
    }

    /// Reduce every geometry, returning results aligned with the input order.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::run`].
    pub fn reduce_all(
        &self,
        geometries: &[Geometry<f64>],
        raster: &RasterContext,
        request: &StatisticRequest,
    ) -> Result<Vec<ZoneResult>> {
        let zones = geometries.len();
        let workers = self.parallel.workers()?;
        let chunk_size = self.parallel.chunk_size_for(zones, workers);
        let pool = self.parallel.build_pool()?;

        info!(
            "⚡ Reducing {zones} zones across {workers} workers (chunk size {chunk_size})"
        );

        let indices: Vec<usize> = (0..zones).collect();
        let chunks: Vec<Vec<(usize, ZoneResult)>> = pool.install(|| {
            indices
                .par_chunks(chunk_size)
                .map(|chunk| self.reduce_chunk(chunk, geometries, raster, request))
                .collect::<Result<_>>()
        })?;
        drop(pool);

        reassemble(zones, chunks.into_iter().flatten())
    }

    fn reduce_chunk(
        &self,
        chunk: &[usize],
        geometries: &[Geometry<f64>],
        raster: &RasterContext,
        request: &StatisticRequest,
    ) -> Result<Vec<(usize, ZoneResult)>> {
        debug!(first = ?chunk.first(), len = chunk.len(), "reducing chunk");
        chunk
            .iter()
            .map(|&zone| {
                if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                    return Err(ZonalError::Cancelled);
                }
                let result = catch_unwind(AssertUnwindSafe(|| {
                    self.reducer.reduce(&geometries[zone], raster, request)
                }))
                .map_err(|payload| ProcessingError::WorkerPanicked {
                    zone,
                    message: panic_message(payload.as_ref()),
                })?;
                Ok((zone, result))
            })
            .collect()
    }
}

/// Place each result at its zone index; every slot must be filled exactly once.
fn reassemble(zones: usize, tagged: impl IntoIterator<Item = (usize, ZoneResult)>) -> Result<Vec<ZoneResult>> {
    let mut slots: Vec<Option<ZoneResult>> = vec![None; zones];
    for (zone, result) in tagged {
        if let Some(slot) = slots.get_mut(zone) {
            *slot = Some(result);
        }
    }
    let found = slots.iter().filter(|s| s.is_some()).count();
    if found != zones {
        return Err(ProcessingError::MissingResults { expected: zones, found }.into());
    }
    Ok(slots.into_iter().flatten().collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Add one column per requested statistic and, in categorical mode, one per
/// category label, overwriting columns of the same name.
///
/// Statistic columns come first, then mapped labels in code order, then any
/// codes absent from the map (ascending), zero-filled for zones without them.
///
/// # Errors
///
/// Fails if two added columns would share a name, or if `results` is not
/// aligned with the table's rows.
pub fn merge_results(table: &mut ZoneTable, results: &[ZoneResult], request: &StatisticRequest) -> Result<()> {
    request.validate_columns()?;
    for &stat in request.stats() {
        let values = results.iter().map(|r| r.statistic(stat).flatten());
        let column = if stat.is_counting() {
            Column::Integer(values.map(|v| v.map(|n| n as i64)).collect())
        } else {
            Column::Float(values.collect())
        };
        table.set_column(request.column_name(&stat.name()), column)?;
    }

    if !request.is_categorical() {
        return Ok(());
    }

    for label in request.category_map().labels() {
        let counts = results
            .iter()
            .map(|r| Some(r.category(label).unwrap_or(0) as i64))
            .collect();
        table.set_column(request.column_name(label), Column::Integer(counts))?;
    }

    let unmapped: BTreeSet<i64> = results
        .iter()
        .filter_map(|r| r.categories.as_ref())
        .flat_map(|c| c.unmapped_codes())
        .collect();
    if !unmapped.is_empty() {
        debug!(codes = ?unmapped, "adding columns for codes outside the category map");
    }
    for code in unmapped {
        let counts = results
            .iter()
            .map(|r| Some(r.categories.as_ref().map_or(0, |c| c.unmapped_count(code)) as i64))
            .collect();
        table.set_column(request.column_name(&code.to_string()), Column::Integer(counts))?;
    }
    Ok(())
}

/// Run a batch with the default reducer on `worker_count` workers.
///
/// # Errors
///
/// See [`Dispatcher::run`].
pub fn run(
    table: ZoneTable,
    raster: &RasterContext,
    request: &StatisticRequest,
    worker_count: usize,
) -> Result<ZoneTable> {
    Dispatcher::new(ParallelConfig::with_workers(worker_count)).run(table, raster, request)
}
