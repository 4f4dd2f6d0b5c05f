//! Bins listings into kept grid cells and computes per-cell price statistics.

use std::collections::HashMap;

use crate::grid::{Grid, GridCell};
use crate::listings::Listing;

/// Running price statistics for one cell. `mean` is derived on demand so
/// rounding can stay an output-time concern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStats {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub count: u64,
}

impl CellStats {
    fn new(price: f64) -> Self {
        Self {
            min: price,
            max: price,
            sum: price,
            count: 1,
        }
    }

    fn observe(&mut self, price: f64) {
        self.min = self.min.min(price);
        self.max = self.max.max(price);
        self.sum += price;
        self.count += 1;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// A kept cell with at least one listing, the only kind that reaches output.
#[derive(Debug, Clone, Copy)]
pub struct PopulatedCell {
    pub cell: GridCell,
    pub stats: CellStats,
}

/// Bins listings into the grid's kept cells and aggregates their prices.
///
/// Binning is arithmetic: `col = floor((lon - min_lon) / cell_lon)` and
/// likewise for rows. Because cell edges come from the same
/// `origin + k * step` arithmetic, this is the half-open
/// `[left, right) x [bottom, top)` containment test — a listing exactly on
/// a shared edge lands in the cell to its upper/right, never in both.
/// Listings outside the lattice, or inside a discarded cell's footprint,
/// are ignored. Kept cells with no listings are dropped from the result.
pub fn aggregate(grid: &Grid, listings: &[Listing]) -> Vec<PopulatedCell> {
    let index: HashMap<(usize, usize), usize> = grid
        .cells
        .iter()
        .enumerate()
        .map(|(i, cell)| ((cell.row, cell.col), i))
        .collect();

    let mut stats: Vec<Option<CellStats>> = vec![None; grid.cells.len()];

    for listing in listings {
        let Some(position) = lattice_position(grid, listing) else {
            continue;
        };
        let Some(&i) = index.get(&position) else {
            continue;
        };
        if let Some(s) = &mut stats[i] {
            s.observe(listing.price);
        } else {
            stats[i] = Some(CellStats::new(listing.price));
        }
    }

    grid.cells
        .iter()
        .zip(stats)
        .filter_map(|(cell, stats)| {
            stats.map(|stats| PopulatedCell { cell: *cell, stats })
        })
        .collect()
}

fn lattice_position(grid: &Grid, listing: &Listing) -> Option<(usize, usize)> {
    let dx = listing.longitude - grid.min_lon;
    let dy = listing.latitude - grid.min_lat;
    if dx < 0.0 || dy < 0.0 {
        return None;
    }

    let col = (dx / grid.cell_lon).floor() as usize;
    let row = (dy / grid.cell_lat).floor() as usize;
    if col >= grid.cols || row >= grid.rows {
        return None;
    }

    Some((row, col))
}

/// Arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fully-kept 2x2 unit-degree lattice anchored at the origin.
    fn unit_grid() -> Grid {
        let mut cells = Vec::new();
        for row in 0..2usize {
            for col in 0..2usize {
                cells.push(GridCell {
                    id: (row * 2 + col + 1) as u64,
                    row,
                    col,
                    left: col as f64,
                    bottom: row as f64,
                    right: col as f64 + 1.0,
                    top: row as f64 + 1.0,
                });
            }
        }
        Grid {
            min_lon: 0.0,
            min_lat: 0.0,
            cell_lon: 1.0,
            cell_lat: 1.0,
            cols: 2,
            rows: 2,
            cells,
        }
    }

    fn listing(price: f64, lon: f64, lat: f64) -> Listing {
        Listing {
            price,
            longitude: lon,
            latitude: lat,
        }
    }

    #[test]
    fn test_statistics_over_one_cell() {
        let grid = unit_grid();
        let listings = vec![
            listing(50.0, 0.2, 0.2),
            listing(100.0, 0.5, 0.5),
            listing(150.0, 0.8, 0.8),
        ];

        let populated = aggregate(&grid, &listings);

        assert_eq!(populated.len(), 1);
        let stats = populated[0].stats;
        assert_eq!(stats.min, 50.0);
        assert_eq!(stats.max, 150.0);
        assert_eq!(stats.mean(), 100.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn test_empty_cells_are_dropped() {
        let grid = unit_grid();
        let listings = vec![listing(80.0, 1.5, 1.5)];

        let populated = aggregate(&grid, &listings);

        assert_eq!(populated.len(), 1);
        assert_eq!(populated[0].cell.id, 4);
    }

    #[test]
    fn test_shared_edge_counts_once() {
        // A listing exactly on the vertical edge between cells 1 and 2
        // belongs to cell 2 under the half-open convention.
        let grid = unit_grid();
        let listings = vec![listing(60.0, 1.0, 0.5)];

        let populated = aggregate(&grid, &listings);

        assert_eq!(populated.len(), 1);
        assert_eq!(populated[0].cell.id, 2);
        let total: u64 = populated.iter().map(|p| p.stats.count).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_upper_right_lattice_edge_is_exclusive() {
        let grid = unit_grid();
        let listings = vec![listing(60.0, 2.0, 1.0), listing(60.0, 1.0, 2.0)];

        assert!(aggregate(&grid, &listings).is_empty());
    }

    #[test]
    fn test_listings_outside_lattice_are_ignored() {
        let grid = unit_grid();
        let listings = vec![
            listing(60.0, -0.1, 0.5),
            listing(60.0, 0.5, -0.1),
            listing(60.0, 5.0, 5.0),
        ];

        assert!(aggregate(&grid, &listings).is_empty());
    }

    #[test]
    fn test_discarded_cell_footprint_not_counted() {
        // Drop cell 4 from the kept set; a listing in its footprint must
        // not appear anywhere in the result.
        let mut grid = unit_grid();
        grid.cells.retain(|c| c.id != 4);
        let listings = vec![listing(60.0, 1.5, 1.5), listing(70.0, 0.5, 0.5)];

        let populated = aggregate(&grid, &listings);

        assert_eq!(populated.len(), 1);
        assert_eq!(populated[0].cell.id, 1);
    }

    #[test]
    fn test_conservation_across_cells() {
        let grid = unit_grid();
        let listings = vec![
            listing(50.0, 0.5, 0.5),
            listing(60.0, 1.5, 0.5),
            listing(70.0, 0.5, 1.5),
            listing(80.0, 1.5, 1.5),
            listing(90.0, 1.0, 1.0), // on both interior edges: exactly one cell
        ];

        let populated = aggregate(&grid, &listings);

        let total: u64 = populated.iter().map(|p| p.stats.count).sum();
        assert_eq!(total, listings.len() as u64);
    }

    #[test]
    fn test_results_preserve_kept_cell_order() {
        let grid = unit_grid();
        let listings = vec![
            listing(80.0, 1.5, 1.5),
            listing(50.0, 0.5, 0.5),
            listing(60.0, 1.5, 0.5),
        ];

        let populated = aggregate(&grid, &listings);

        let ids: Vec<u64> = populated.iter().map(|p| p.cell.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn test_mean_with_empty_input() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }
}
