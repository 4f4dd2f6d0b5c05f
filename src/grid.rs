//! Lattice construction and boundary clipping.

use geo::{BoundingRect, Intersects, Polygon, Rect, coord};
use thiserror::Error;

use crate::convert::DegreeConverter;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("boundary polygon has no extent")]
    EmptyBoundary,
}

/// One axis-aligned rectangle of the lattice, in degrees.
///
/// `id = row * cols + col + 1` over the full lattice, so ids stay stable
/// whether or not neighboring cells survive boundary clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub id: u64,
    pub row: usize,
    pub col: usize,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl GridCell {
    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.left, y: self.bottom },
            coord! { x: self.right, y: self.top },
        )
    }
}

/// The clipped lattice: kept cells in row-major order, plus the lattice
/// parameters needed to bin points arithmetically.
#[derive(Debug, Clone)]
pub struct Grid {
    pub min_lon: f64,
    pub min_lat: f64,
    pub cell_lon: f64,
    pub cell_lat: f64,
    pub cols: usize,
    pub rows: usize,
    pub cells: Vec<GridCell>,
}

/// Lays a row-major rectangular lattice over the boundary's bounding box and
/// keeps the cells whose rectangle intersects the boundary.
///
/// The intersects predicate is inclusive: shared area, a shared edge, or a
/// single shared vertex all keep the cell. Every lattice position consumes
/// an id, kept or not.
pub fn build_grid(
    boundary: &Polygon<f64>,
    converter: &DegreeConverter,
    cell_size_m: f64,
) -> Result<Grid, GridError> {
    let bbox = boundary.bounding_rect().ok_or(GridError::EmptyBoundary)?;

    let min_lon = bbox.min().x;
    let min_lat = bbox.min().y;
    let cell_lon = converter.lon_degrees(cell_size_m);
    let cell_lat = converter.lat_degrees(cell_size_m);

    let cols = ((bbox.max().x - min_lon) / cell_lon).ceil() as usize;
    let rows = ((bbox.max().y - min_lat) / cell_lat).ceil() as usize;

    let mut cells = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            let left = min_lon + col as f64 * cell_lon;
            let bottom = min_lat + row as f64 * cell_lat;
            let cell = GridCell {
                id: (row * cols + col + 1) as u64,
                row,
                col,
                left,
                bottom,
                right: left + cell_lon,
                top: bottom + cell_lat,
            };
            if cell.rect().to_polygon().intersects(boundary) {
                cells.push(cell);
            }
        }
    }

    Ok(Grid {
        min_lon,
        min_lat,
        cell_lon,
        cell_lat,
        cols,
        rows,
        cells,
    })
}
