//! Collaborator interfaces for reading zones and rasters and writing results
//!
//! File formats live behind these traits; the core only sees an in-memory
//! [`ZoneTable`] and [`RasterContext`].

use crate::errors::{InputError, OutputError};
use crate::raster::RasterContext;
use crate::zones::ZoneTable;
use std::path::Path;

/// Reads a vector dataset into a zone table.
///
/// Implementations must preserve feature order and return geometries in the
/// same CRS as the raster they will be reduced against.
pub trait VectorReader {
    fn read_zones(&self, path: &Path) -> Result<ZoneTable, InputError>;
}

/// Reads a single raster band with its georeferencing.
pub trait RasterReader {
    fn read_band(&self, path: &Path) -> Result<RasterContext, InputError>;
}

/// Persists an augmented zone table.
///
/// Whether the destination format can hold every added column is the
/// writer's concern.
pub trait ZoneTableWriter {
    fn write_zones(&self, table: &ZoneTable, path: &Path) -> Result<(), OutputError>;
}

impl<T: VectorReader + ?Sized> VectorReader for &T {
    fn read_zones(&self, path: &Path) -> Result<ZoneTable, InputError> {
        (**self).read_zones(path)
    }
}

impl<T: RasterReader + ?Sized> RasterReader for &T {
    fn read_band(&self, path: &Path) -> Result<RasterContext, InputError> {
        (**self).read_band(path)
    }
}

impl<T: ZoneTableWriter + ?Sized> ZoneTableWriter for &T {
    fn write_zones(&self, table: &ZoneTable, path: &Path) -> Result<(), OutputError> {
        (**self).write_zones(table, path)
    }
}
