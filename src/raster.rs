//! Raster band, affine georeferencing and pixel windows
//!
//! A [`RasterContext`] is built once per run and shared read-only by every
//! worker. It owns the single-band value array, the affine transform mapping
//! pixel `(col, row)` to CRS coordinates, and the optional nodata sentinel.

use crate::errors::InputError;
use geo::{Coord, Rect};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Six-coefficient affine transform.
///
/// Follows the rasterio ordering:
/// `x = a * col + b * row + c`, `y = d * col + e * row + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Build from a GDAL geotransform `[c, a, b, f, d, e]`.
    #[must_use]
    pub const fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// North-up grid whose top-left corner sits at `(origin_x, origin_y)`.
    #[must_use]
    pub const fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    /// Map fractional pixel coordinates to CRS coordinates.
    #[must_use]
    pub fn apply(&self, col: f64, row: f64) -> Coord<f64> {
        Coord {
            x: self.a * col + self.b * row + self.c,
            y: self.d * col + self.e * row + self.f,
        }
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Inverse transform, or `None` when the matrix is singular or non-finite.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;
        Some(Self::new(
            ia,
            ib,
            -(ia * self.c + ib * self.f),
            id,
            ie,
            -(id * self.c + ie * self.f),
        ))
    }

    /// CRS coordinate of the centre of pixel `(row, col)`.
    #[must_use]
    pub fn pixel_center(&self, row: usize, col: usize) -> Coord<f64> {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }
}

/// Half-open rectangle of pixels `[row_start, row_end) x [col_start, col_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl PixelWindow {
    #[must_use]
    pub const fn height(&self) -> usize {
        self.row_end - self.row_start
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }
}

/// Immutable raster band shared by all workers of a run.
#[derive(Debug, Clone)]
pub struct RasterContext {
    values: Array2<f64>,
    affine: Affine,
    inverse: Affine,
    nodata: Option<f64>,
}

impl RasterContext {
    /// Bundle a band with its georeferencing.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidRaster`] for an empty band and
    /// [`InputError::NonInvertibleTransform`] for a singular affine.
    pub fn new(values: Array2<f64>, affine: Affine, nodata: Option<f64>) -> Result<Self, InputError> {
        if values.is_empty() {
            return Err(InputError::InvalidRaster(format!(
                "band has shape {:?}",
                values.shape()
            )));
        }
        let inverse = affine.invert().ok_or(InputError::NonInvertibleTransform)?;
        Ok(Self {
            values,
            affine,
            inverse,
            nodata,
        })
    }

    #[must_use]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    #[must_use]
    pub const fn affine(&self) -> &Affine {
        &self.affine
    }

    #[must_use]
    pub const fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// True when `value` equals the nodata sentinel. Always false without one.
    #[must_use]
    pub fn is_nodata(&self, value: f64) -> bool {
        self.nodata.is_some_and(|nd| value == nd)
    }

    /// Fractional `(col, row)` position of a CRS coordinate.
    #[must_use]
    pub fn to_pixel(&self, coord: Coord<f64>) -> (f64, f64) {
        let p = self.inverse.apply(coord.x, coord.y);
        (p.x, p.y)
    }

    /// The `(row, col)` of the pixel containing `coord`, if it lies on the band.
    #[must_use]
    pub fn cell_of(&self, coord: Coord<f64>) -> Option<(usize, usize)> {
        let (col, row) = self.to_pixel(coord);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col.floor() as usize, row.floor() as usize);
        (row < self.height() && col < self.width()).then_some((row, col))
    }

    /// Pixels touched by a CRS bounding box, clipped to the band.
    ///
    /// The window is inclusive of the pixel under the box's far edge, so it
    /// may be one pixel wider than strictly needed; coverage tests discard it.
    #[must_use]
    pub fn window_for(&self, bounds: Rect<f64>) -> Option<PixelWindow> {
        let (min, max) = (bounds.min(), bounds.max());
        let corners = [
            self.to_pixel(Coord { x: min.x, y: min.y }),
            self.to_pixel(Coord { x: min.x, y: max.y }),
            self.to_pixel(Coord { x: max.x, y: min.y }),
            self.to_pixel(Coord { x: max.x, y: max.y }),
        ];

        let (mut col_lo, mut col_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut row_lo, mut row_hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for (col, row) in corners {
            col_lo = col_lo.min(col);
            col_hi = col_hi.max(col);
            row_lo = row_lo.min(row);
            row_hi = row_hi.max(row);
        }
        if ![col_lo, col_hi, row_lo, row_hi].iter().all(|v| v.is_finite()) {
            return None;
        }

        let clip = |lo: f64, hi: f64, len: usize| -> Option<(usize, usize)> {
            let start = lo.floor().max(0.0);
            let end = (hi.floor() + 1.0).min(len as f64);
            (start < end).then(|| (start as usize, end as usize))
        };
        let (row_start, row_end) = clip(row_lo, row_hi, self.height())?;
        let (col_start, col_end) = clip(col_lo, col_hi, self.width())?;

        Some(PixelWindow {
            row_start,
            row_end,
            col_start,
            col_end,
        })
    }
}
