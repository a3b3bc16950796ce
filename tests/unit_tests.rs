//! Unit tests for the public API of zonal_stats
//!
//! These cover error reporting, parallel configuration, the single-zone
//! reducer and the end-to-end pipeline with in-memory collaborators.

use approx::assert_relative_eq;
use geo::{polygon, Geometry};
use ndarray::array;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, NamedTempFile};
use zonal_stats::{
    errors::{InputError, OutputError, ProcessingError, ZonalError},
    logging::init_logging,
    parallel::{get_parallel_info, ParallelConfig},
    prelude::*,
};

fn square(x0: f64, y0: f64, size: f64) -> Geometry<f64> {
    polygon![
        (x: x0, y: y0),
        (x: x0 + size, y: y0),
        (x: x0 + size, y: y0 + size),
        (x: x0, y: y0 + size),
        (x: x0, y: y0)
    ]
    .into()
}

fn ramp_raster() -> RasterContext {
    // 0..16 row-major, origin (0, 4), unit pixels
    let values = ndarray::Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f64);
    RasterContext::new(values, Affine::north_up(0.0, 4.0, 1.0, 1.0), None).unwrap()
}

#[test]
fn test_error_types() {
    let input = ZonalError::from(InputError::UnknownStatistic("mode".to_string()));
    assert!(format!("{input}").contains("unknown statistic 'mode'"));

    let crash = ZonalError::from(ProcessingError::WorkerPanicked {
        zone: 3,
        message: "boom".to_string(),
    });
    assert!(format!("{crash}").contains("zone 3"));

    let output = OutputError::Write {
        path: PathBuf::from("out.shp"),
        message: "disk full".to_string(),
    };
    assert!(format!("{output}").contains("out.shp"));

    assert_eq!(format!("{}", GeometryWarning::Disjoint), "geometry does not overlap the raster");
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::default();
    assert!(default_config.num_workers.is_none());
    assert!(default_config.workers().unwrap() > 0);

    let config_4 = ParallelConfig::with_workers(4);
    assert_eq!(config_4.num_workers, Some(4));

    let all_cores_config = ParallelConfig::all_cores();
    assert!(all_cores_config.num_workers.unwrap() > 0);

    // oversubscription is allowed
    let many = ParallelConfig::with_workers(get_parallel_info().available_cores * 2 + 1);
    assert!(many.build_pool().is_ok());
}

#[test]
fn test_parallel_info() {
    let info = get_parallel_info();
    assert!(info.available_cores > 0);
    assert!(info.physical_cores > 0);
    assert!(info.available_parallelism > 0);
    info.log_info();
}

#[test]
fn test_single_zone_reduction() {
    let raster = ramp_raster();
    let request = StatisticRequest::continuous(&[
        "count",
        "mean",
        "median",
        "std",
        "range",
        "percentile_75",
        "unique",
    ])
    .unwrap();

    // Lower-left 2x2 block: 8, 9, 12, 13
    let result = zonal_stats::reduce(&square(0.0, 0.0, 2.0), &raster, &request);

    assert_eq!(result.valid_pixels, 4);
    assert_eq!(result.get("count"), Some(Some(4.0)));
    assert_eq!(result.get("mean"), Some(Some(10.5)));
    assert_eq!(result.get("median"), Some(Some(10.5)));
    assert_relative_eq!(result.get("std").flatten().unwrap(), 2.0616, epsilon = 1e-4);
    assert_eq!(result.get("range"), Some(Some(5.0)));
    assert_relative_eq!(result.get("percentile_75").flatten().unwrap(), 12.25);
    assert_eq!(result.get("unique"), Some(Some(4.0)));
}

#[test]
fn test_nan_pixels_are_excluded() {
    let values = array![[1.0, f64::NAN], [3.0, 5.0]];
    let raster = RasterContext::new(values, Affine::north_up(0.0, 2.0, 1.0, 1.0), Some(5.0)).unwrap();
    let request = StatisticRequest::continuous(&["mean", "count", "nan", "nodata"]).unwrap();

    let result = zonal_stats::reduce(&square(0.0, 0.0, 2.0), &raster, &request);

    assert_eq!(result.get("mean"), Some(Some(2.0)));
    assert_eq!(result.get("count"), Some(Some(2.0)));
    assert_eq!(result.get("nan"), Some(Some(1.0)));
    assert_eq!(result.get("nodata"), Some(Some(1.0)));
}

#[test]
fn test_multipolygon_and_holes() {
    let raster = ramp_raster();
    let request = StatisticRequest::continuous(&["count", "sum"]).unwrap();

    let ring = polygon!(
        exterior: [(x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 3.0), (x: 0.0, y: 3.0), (x: 0.0, y: 0.0)],
        interiors: [[(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 2.0), (x: 1.0, y: 1.0)]],
    );
    let with_hole = zonal_stats::reduce(&ring.into(), &raster, &request);
    assert_eq!(with_hole.get("count"), Some(Some(8.0)));

    let parts: Geometry<f64> = geo::MultiPolygon::new(vec![
        polygon![(x: 0.0, y: 3.0), (x: 1.0, y: 3.0), (x: 1.0, y: 4.0), (x: 0.0, y: 4.0), (x: 0.0, y: 3.0)],
        polygon![(x: 3.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 1.0), (x: 3.0, y: 1.0), (x: 3.0, y: 0.0)],
    ])
    .into();
    let split = zonal_stats::reduce(&parts, &raster, &request);
    assert_eq!(split.get("count"), Some(Some(2.0)));
    assert_eq!(split.get("sum"), Some(Some(15.0)));
}

#[test]
fn test_config_from_file() -> Result<()> {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    write!(
        file,
        r#"{{"raster_path": "lc.tif", "vector_path": "basins.gpkg", "output_path": "out.gpkg",
            "workers": 2, "stats": ["mean", "max"], "categorical": false}}"#
    )
    .expect("Failed to write config");

    let config = ZonalConfig::from_json_file(file.path())?;
    assert_eq!(config.parallel().workers()?, 2);
    assert_eq!(config.request()?.stats(), &[Statistic::Mean, Statistic::Max]);

    let missing = ZonalConfig::from_json_file(tempdir().expect("Failed to create temp dir").path().join("nope.json"));
    assert!(matches!(missing, Err(ZonalError::Input(InputError::Read { .. }))));
    Ok(())
}

struct MemoryVectors(ZoneTable);

impl VectorReader for MemoryVectors {
    fn read_zones(&self, _path: &Path) -> std::result::Result<ZoneTable, InputError> {
        Ok(self.0.clone())
    }
}

struct MemoryRaster(RasterContext);

impl RasterReader for MemoryRaster {
    fn read_band(&self, _path: &Path) -> std::result::Result<RasterContext, InputError> {
        Ok(self.0.clone())
    }
}

struct MissingRaster;

impl RasterReader for MissingRaster {
    fn read_band(&self, path: &Path) -> std::result::Result<RasterContext, InputError> {
        Err(InputError::Read {
            path: path.to_path_buf(),
            message: "no such file".to_string(),
        })
    }
}

#[derive(Default)]
struct RecordingWriter {
    written: RefCell<Vec<(PathBuf, usize)>>,
}

impl ZoneTableWriter for RecordingWriter {
    fn write_zones(&self, table: &ZoneTable, path: &Path) -> std::result::Result<(), OutputError> {
        self.written.borrow_mut().push((path.to_path_buf(), table.len()));
        Ok(())
    }
}

struct FailingWriter;

impl ZoneTableWriter for FailingWriter {
    fn write_zones(&self, _table: &ZoneTable, path: &Path) -> std::result::Result<(), OutputError> {
        Err(OutputError::Write {
            path: path.to_path_buf(),
            message: "read-only filesystem".to_string(),
        })
    }
}

fn pipeline_config() -> ZonalConfig {
    ZonalConfig::from_json_str(
        r#"{"raster_path": "ramp.tif", "vector_path": "zones.shp", "output_path": "zonal.shp",
            "workers": 2, "stats": ["sum"]}"#,
    )
    .unwrap()
}

#[test]
fn test_pipeline_writes_augmented_table() -> Result<()> {
    init_logging(false);
    let zones = ZoneTable::from_geometries(vec![square(0.0, 3.0, 1.0), square(20.0, 20.0, 1.0)]);
    let writer = RecordingWriter::default();

    let outcome = run_pipeline(
        &pipeline_config(),
        MemoryVectors(zones),
        MemoryRaster(ramp_raster()),
        &writer,
        None,
    )?;

    assert!(outcome.written());
    assert_eq!(outcome.table.float("sum").unwrap(), &[Some(0.0), None]);
    assert_eq!(outcome.warnings, vec![(1, GeometryWarning::Disjoint)]);
    assert_eq!(*writer.written.borrow(), vec![(PathBuf::from("zonal.shp"), 2)]);
    Ok(())
}

#[test]
fn test_pipeline_reports_output_failure_separately() -> Result<()> {
    let zones = ZoneTable::from_geometries(vec![square(0.0, 0.0, 2.0)]);

    let outcome = run_pipeline(
        &pipeline_config(),
        MemoryVectors(zones),
        MemoryRaster(ramp_raster()),
        FailingWriter,
        None,
    )?;

    assert!(!outcome.written());
    assert!(matches!(outcome.output, Err(OutputError::Write { .. })));
    assert_eq!(outcome.table.float("sum").unwrap(), &[Some(42.0)]);
    Ok(())
}

#[test]
fn test_pipeline_input_failure_is_fatal() {
    let zones = ZoneTable::from_geometries(vec![square(0.0, 0.0, 2.0)]);
    let result = run_pipeline(
        &pipeline_config(),
        MemoryVectors(zones),
        MissingRaster,
        FailingWriter,
        None,
    );
    assert!(matches!(result, Err(ZonalError::Input(InputError::Read { .. }))));
}
