//! Geometry to pixel coverage
//!
//! Turns one zone geometry into a boolean mask over the raster window that
//! its bounding box touches. Which pixels belong to a zone is decided by a
//! [`CoverageRule`]; the default is [`DEFAULT_COVERAGE_RULE`].

use crate::errors::GeometryWarning;
use crate::raster::{Affine, PixelWindow, RasterContext};
use geo::{
    Area, BoundingRect, Contains, Coord, Geometry, Intersects, LineString, Point, Polygon, Rect,
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fraction of a pixel trimmed from each edge before the all-touched test,
/// so a polygon that only shares an edge with a pixel does not claim it.
const EDGE_TOLERANCE: f64 = 1e-9;

/// Pixel-space offset used to break ties for centres lying on a boundary.
/// The row step is half the column step so the probe direction is not
/// parallel to grid-aligned or diagonal edges.
const BOUNDARY_NUDGE: f64 = 1e-6;

/// Rule deciding whether a pixel belongs to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageRule {
    /// The pixel centre lies inside the polygon. A centre exactly on the
    /// boundary is covered only if the polygon lies on its `+col, +row`
    /// side, so zones that tile the plane each claim a shared-edge pixel
    /// exactly once.
    #[default]
    CenterIn,
    /// The pixel's interior intersects the polygon at all.
    AllTouched,
}

/// Coverage rule used unless a request opts into another one.
pub const DEFAULT_COVERAGE_RULE: CoverageRule = CoverageRule::CenterIn;

impl CoverageRule {
    #[must_use]
    pub const fn from_all_touched(all_touched: bool) -> Self {
        if all_touched {
            Self::AllTouched
        } else {
            Self::CenterIn
        }
    }
}

/// Pixels covered by one zone.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub window: PixelWindow,
    /// Same shape as `window`; `true` where the pixel is covered.
    pub mask: Array2<bool>,
}

impl Coverage {
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.mask.iter().filter(|&&covered| covered).count()
    }

    /// Raster values under the covered pixels, in row-major order.
    pub fn values<'a>(&'a self, raster: &'a RasterContext) -> impl Iterator<Item = f64> + 'a {
        let band = raster.values();
        self.mask
            .indexed_iter()
            .filter(|(_, &covered)| covered)
            .map(move |((r, c), _)| band[[self.window.row_start + r, self.window.col_start + c]])
    }
}

#[derive(Default)]
struct Parts {
    polygons: Vec<Polygon<f64>>,
    points: Vec<Point<f64>>,
}

fn collect_parts(geometry: &Geometry<f64>, parts: &mut Parts) -> Result<(), GeometryWarning> {
    match geometry {
        Geometry::Polygon(p) => parts.polygons.push(p.clone()),
        Geometry::MultiPolygon(mp) => parts.polygons.extend(mp.0.iter().cloned()),
        Geometry::Rect(r) => parts.polygons.push(r.to_polygon()),
        Geometry::Triangle(t) => parts.polygons.push(t.to_polygon()),
        Geometry::Point(p) => parts.points.push(*p),
        Geometry::MultiPoint(mp) => parts.points.extend(mp.0.iter().copied()),
        Geometry::GeometryCollection(gc) => {
            for member in &gc.0 {
                collect_parts(member, parts)?;
            }
        }
        Geometry::Line(_) => return Err(GeometryWarning::Unsupported("Line")),
        Geometry::LineString(_) => return Err(GeometryWarning::Unsupported("LineString")),
        Geometry::MultiLineString(_) => return Err(GeometryWarning::Unsupported("MultiLineString")),
    }
    Ok(())
}

fn validate_polygon(polygon: &Polygon<f64>) -> Result<(), GeometryWarning> {
    let exterior = polygon.exterior();
    if exterior.0.is_empty() {
        return Err(GeometryWarning::Empty);
    }
    if exterior.0.len() < 4 {
        return Err(GeometryWarning::Invalid(format!(
            "exterior ring has {} coordinates",
            exterior.0.len()
        )));
    }
    let all_finite = std::iter::once(exterior)
        .chain(polygon.interiors())
        .flat_map(|ring| ring.0.iter())
        .all(|c| c.x.is_finite() && c.y.is_finite());
    if !all_finite {
        return Err(GeometryWarning::Invalid("non-finite coordinate".to_string()));
    }
    if polygon.unsigned_area() == 0.0 {
        return Err(GeometryWarning::Invalid("polygon has zero area".to_string()));
    }
    Ok(())
}

fn merge_bounds(acc: Option<Rect<f64>>, next: Rect<f64>) -> Option<Rect<f64>> {
    Some(match acc {
        None => next,
        Some(r) => Rect::new(
            Coord {
                x: r.min().x.min(next.min().x),
                y: r.min().y.min(next.min().y),
            },
            Coord {
                x: r.max().x.max(next.max().x),
                y: r.max().y.max(next.max().y),
            },
        ),
    })
}

/// Footprint of pixel `(row, col)`, shrunk by [`EDGE_TOLERANCE`] on every side.
fn pixel_footprint(affine: &Affine, row: usize, col: usize) -> Polygon<f64> {
    let (r, c) = (row as f64, col as f64);
    let (lo, hi) = (EDGE_TOLERANCE, 1.0 - EDGE_TOLERANCE);
    let ring = vec![
        affine.apply(c + lo, r + lo),
        affine.apply(c + hi, r + lo),
        affine.apply(c + hi, r + hi),
        affine.apply(c + lo, r + hi),
        affine.apply(c + lo, r + lo),
    ];
    Polygon::new(LineString::from(ring), vec![])
}

fn touches_pixel(polygons: &[Polygon<f64>], affine: &Affine, row: usize, col: usize) -> bool {
    if affine.b == 0.0 && affine.d == 0.0 {
        let (r, c) = (row as f64, col as f64);
        let (lo, hi) = (EDGE_TOLERANCE, 1.0 - EDGE_TOLERANCE);
        let footprint = Rect::new(affine.apply(c + lo, r + lo), affine.apply(c + hi, r + hi));
        polygons.iter().any(|p| p.intersects(&footprint))
    } else {
        let footprint = pixel_footprint(affine, row, col);
        polygons.iter().any(|p| p.intersects(&footprint))
    }
}

fn polygons_cover(polygons: &[Polygon<f64>], affine: &Affine, row: usize, col: usize, rule: CoverageRule) -> bool {
    match rule {
        CoverageRule::CenterIn => {
            let center = Point::from(affine.pixel_center(row, col));
            let (r, c) = (row as f64 + 0.5, col as f64 + 0.5);
            let nudged = Point::from(affine.apply(c + BOUNDARY_NUDGE, r + BOUNDARY_NUDGE / 2.0));
            polygons
                .iter()
                .any(|p| p.contains(&center) || (p.intersects(&center) && p.contains(&nudged)))
        }
        CoverageRule::AllTouched => touches_pixel(polygons, affine, row, col),
    }
}

/// Rasterize `geometry` against the pixel grid of `raster`.
///
/// Polygonal parts follow `rule`; point parts cover the single pixel that
/// contains them.
///
/// # Errors
///
/// Returns a [`GeometryWarning`] when the geometry is empty, invalid, of an
/// unsupported type, or entirely off the raster. Callers treat these as
/// per-zone conditions, not failures.
pub fn rasterize(
    geometry: &Geometry<f64>,
    raster: &RasterContext,
    rule: CoverageRule,
) -> Result<Coverage, GeometryWarning> {
    let mut parts = Parts::default();
    collect_parts(geometry, &mut parts)?;
    if parts.polygons.is_empty() && parts.points.is_empty() {
        return Err(GeometryWarning::Empty);
    }
    for polygon in &parts.polygons {
        validate_polygon(polygon)?;
    }
    if parts.points.iter().any(|p| !p.x().is_finite() || !p.y().is_finite()) {
        return Err(GeometryWarning::Invalid("non-finite coordinate".to_string()));
    }

    let bounds = parts
        .polygons
        .iter()
        .filter_map(|p| p.bounding_rect())
        .chain(parts.points.iter().map(|p| Rect::new(p.0, p.0)))
        .fold(None, merge_bounds)
        .ok_or(GeometryWarning::Empty)?;
    let window = raster.window_for(bounds).ok_or(GeometryWarning::Disjoint)?;

    let point_cells: HashSet<(usize, usize)> = parts.points.iter().filter_map(|p| raster.cell_of(p.0)).collect();
    let affine = raster.affine();
    let mask = Array2::from_shape_fn((window.height(), window.width()), |(r, c)| {
        let (row, col) = (window.row_start + r, window.col_start + c);
        point_cells.contains(&(row, col)) || polygons_cover(&parts.polygons, affine, row, col, rule)
    });

    Ok(Coverage { window, mask })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, MultiPolygon};

    fn grid() -> RasterContext {
        let values = Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f64);
        RasterContext::new(values, Affine::north_up(0.0, 4.0, 1.0, 1.0), None).unwrap()
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1), (x: x0, y: y0)].into()
    }

    #[test]
    fn center_rule_takes_exact_block() {
        let coverage = rasterize(&square(0.0, 2.0, 2.0, 4.0), &grid(), CoverageRule::CenterIn).unwrap();
        assert_eq!(coverage.covered_count(), 4);
        let mut values: Vec<f64> = coverage.values(&grid()).collect();
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![0.0, 1.0, 4.0, 5.0]);
    }

    #[test]
    fn all_touched_grows_coverage_for_off_grid_polygon() {
        let raster = grid();
        let shape = square(0.6, 2.6, 1.4, 3.4);
        let center = rasterize(&shape, &raster, CoverageRule::CenterIn).unwrap();
        let touched = rasterize(&shape, &raster, CoverageRule::AllTouched).unwrap();
        assert_eq!(center.covered_count(), 0);
        assert_eq!(touched.covered_count(), 4);
    }

    #[test]
    fn all_touched_ignores_shared_edges() {
        let touched = rasterize(&square(0.0, 2.0, 2.0, 4.0), &grid(), CoverageRule::AllTouched).unwrap();
        assert_eq!(touched.covered_count(), 4);
    }

    #[test]
    fn shared_edge_through_centres_is_claimed_once() {
        let values = Array2::from_shape_fn((1, 3), |(_, c)| c as f64);
        let raster = RasterContext::new(values, Affine::north_up(0.0, 1.0, 1.0, 1.0), None).unwrap();
        let west = rasterize(&square(0.0, 0.0, 1.5, 1.0), &raster, CoverageRule::CenterIn).unwrap();
        let east = rasterize(&square(1.5, 0.0, 3.0, 1.0), &raster, CoverageRule::CenterIn).unwrap();

        assert_eq!(west.covered_count() + east.covered_count(), 3);
        assert_eq!(west.values(&raster).collect::<Vec<_>>(), vec![0.0]);
        assert_eq!(east.values(&raster).collect::<Vec<_>>(), vec![1.0, 2.0]);
    }

    #[test]
    fn all_touched_on_transposed_grid() {
        let values = Array2::from_elem((2, 2), 1.0);
        let transposed = Affine::new(0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
        let raster = RasterContext::new(values, transposed, None).unwrap();
        let touched = rasterize(&square(0.4, 0.4, 0.6, 0.6), &raster, CoverageRule::AllTouched).unwrap();
        assert_eq!(touched.covered_count(), 1);
    }

    #[test]
    fn disjoint_and_empty_geometries_warn() {
        let raster = grid();
        let far = rasterize(&square(10.0, 10.0, 12.0, 12.0), &raster, DEFAULT_COVERAGE_RULE);
        assert_eq!(far.unwrap_err(), GeometryWarning::Disjoint);

        let empty: Geometry<f64> = MultiPolygon::<f64>::new(vec![]).into();
        assert_eq!(rasterize(&empty, &raster, DEFAULT_COVERAGE_RULE).unwrap_err(), GeometryWarning::Empty);

        let line: Geometry<f64> = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into();
        assert_eq!(
            rasterize(&line, &raster, DEFAULT_COVERAGE_RULE).unwrap_err(),
            GeometryWarning::Unsupported("LineString")
        );
    }

    #[test]
    fn degenerate_polygon_is_invalid() {
        let flat: Geometry<f64> =
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 2.0), (x: 0.0, y: 0.0)].into();
        assert!(matches!(
            rasterize(&flat, &grid(), DEFAULT_COVERAGE_RULE),
            Err(GeometryWarning::Invalid(_))
        ));
    }

    #[test]
    fn point_covers_its_pixel() {
        let raster = grid();
        let coverage = rasterize(&point!(x: 2.5, y: 0.5).into(), &raster, DEFAULT_COVERAGE_RULE).unwrap();
        assert_eq!(coverage.values(&raster).collect::<Vec<_>>(), vec![14.0]);
    }
}
