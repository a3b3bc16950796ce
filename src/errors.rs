//! Centralized error handling for zonal statistics
//!
//! Errors fall into three fatal families plus one non-fatal warning:
//!
//! - [`InputError`]: malformed or missing inputs, rejected before any work is dispatched
//! - [`ProcessingError`]: a worker failed mid-batch; no partial table is returned
//! - [`OutputError`]: the writer collaborator failed after the table was materialized
//! - [`GeometryWarning`]: a single zone could not be rasterized; the batch continues

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for zonal statistics operations
#[derive(Error, Debug)]
pub enum ZonalError {
    /// Bad or missing input, fatal to the whole call
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// A worker failed while reducing a zone
    #[error("processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// The downstream writer failed
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// The caller cancelled the batch before every zone was reduced
    #[error("zonal statistics run was cancelled")]
    Cancelled,
}

/// Malformed or missing required input.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("zone table contains no rows")]
    EmptyZoneTable,

    #[error("zone table has no 'geometry' column")]
    MissingGeometryColumn,

    #[error("column 'geometry' does not hold geometries")]
    GeometryColumnType,

    #[error("column '{column}' has {found} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("unknown statistic '{0}'")]
    UnknownStatistic(String),

    #[error("output column '{0}' would be written by more than one statistic or label")]
    ColumnCollision(String),

    #[error("percentile {0} is outside 0..=100")]
    InvalidPercentile(f64),

    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    #[error("affine transform is not invertible")]
    NonInvertibleTransform,

    #[error("failed to read '{path}': {message}")]
    Read { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the parallel machinery itself.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("worker failed while reducing zone {zone}: {message}")]
    WorkerPanicked { zone: usize, message: String },

    #[error("failed to build worker pool: {0}")]
    PoolBuild(String),

    #[error("collected {found} zone results, expected {expected}")]
    MissingResults { expected: usize, found: usize },
}

/// Failure reported by the writer collaborator.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write '{path}': {message}")]
    Write { path: PathBuf, message: String },
}

/// Non-fatal problem with a single zone's geometry.
///
/// The zone still gets a row in the output, with undefined statistics and
/// zero category counts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryWarning {
    #[error("geometry is empty")]
    Empty,

    #[error("geometry is invalid: {0}")]
    Invalid(String),

    #[error("geometry does not overlap the raster")]
    Disjoint,

    #[error("unsupported geometry type '{0}'")]
    Unsupported(&'static str),
}

impl From<rayon::ThreadPoolBuildError> for ZonalError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        ZonalError::Processing(ProcessingError::PoolBuild(error.to_string()))
    }
}

impl From<serde_json::Error> for ZonalError {
    fn from(error: serde_json::Error) -> Self {
        ZonalError::Input(InputError::Config(error))
    }
}

impl From<std::io::Error> for ZonalError {
    fn from(error: std::io::Error) -> Self {
        ZonalError::Input(InputError::Io(error))
    }
}

/// Result type alias for zonal statistics operations
pub type Result<T> = std::result::Result<T, ZonalError>;
