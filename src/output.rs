//! GeoJSON assembly and persistence for populated grid cells.

use std::path::{Path, PathBuf};

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::aggregate::{PopulatedCell, mean};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write output file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize feature collection: {0}")]
    Json(#[from] serde_json::Error),
}

/// Collection name shared by the artifact and its filename: `{city}_{cellSizeInt}`.
pub fn collection_name(city: &str, cell_size_m: f64) -> String {
    format!("{}_{}", city, cell_size_m as u64)
}

/// Deterministic artifact path keyed by city and integer cell size.
pub fn output_path(dir: &Path, city: &str, cell_size_m: f64) -> PathBuf {
    dir.join(format!("{}.geojson", collection_name(city, cell_size_m)))
}

/// Assembles the feature collection for every populated cell.
///
/// Prices are rounded to 2 decimals here and nowhere else. Cell bounds are
/// emitted unrounded: the downstream renderer matches shared edges with a
/// floating-point tolerance, and the bounds of adjacent cells come from the
/// same lattice arithmetic.
pub fn build_collection(
    city: &str,
    cell_size_m: f64,
    cells: &[PopulatedCell],
) -> FeatureCollection {
    let features = cells.iter().map(to_feature).collect();

    let mut foreign_members = JsonObject::new();
    foreign_members.insert(
        "name".to_string(),
        json!(collection_name(city, cell_size_m)),
    );
    foreign_members.insert(
        "crs".to_string(),
        json!({
            "type": "name",
            "properties": { "name": "urn:ogc:def:crs:EPSG::4326" }
        }),
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign_members),
    }
}

fn to_feature(populated: &PopulatedCell) -> Feature {
    let cell = &populated.cell;
    let stats = &populated.stats;

    // Closed 5-vertex rectangle: TL -> TR -> BR -> BL -> TL.
    let ring = vec![
        vec![cell.left, cell.top],
        vec![cell.right, cell.top],
        vec![cell.right, cell.bottom],
        vec![cell.left, cell.bottom],
        vec![cell.left, cell.top],
    ];

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), json!(cell.id));
    properties.insert("left".to_string(), json!(cell.left));
    properties.insert("top".to_string(), json!(cell.top));
    properties.insert("right".to_string(), json!(cell.right));
    properties.insert("bottom".to_string(), json!(cell.bottom));
    properties.insert("price_min".to_string(), json!(round2(stats.min)));
    properties.insert("price_max".to_string(), json!(round2(stats.max)));
    properties.insert("price_mean".to_string(), json!(round2(stats.mean())));
    properties.insert("listings_count".to_string(), json!(stats.count));

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
        id: Some(Id::Number(cell.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Writes the collection as pretty-printed JSON, creating parent
/// directories as needed.
pub fn write_collection(
    path: &Path,
    collection: &FeatureCollection,
) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let contents = serde_json::to_string_pretty(collection)?;
    std::fs::write(path, contents).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Run-level statistics over the emitted cells, reported for operator
/// visibility only; never part of the artifact.
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub cells: usize,
    pub total_listings: u64,
    pub avg_listings_per_cell: f64,
    pub min_cell_mean_price: f64,
    pub max_cell_mean_price: f64,
    pub avg_cell_mean_price: f64,
}

pub fn summarize(cells: &[PopulatedCell]) -> RunSummary {
    if cells.is_empty() {
        return RunSummary::default();
    }

    let means: Vec<f64> = cells.iter().map(|c| c.stats.mean()).collect();
    let total_listings: u64 = cells.iter().map(|c| c.stats.count).sum();

    RunSummary {
        cells: cells.len(),
        total_listings,
        avg_listings_per_cell: total_listings as f64 / cells.len() as f64,
        min_cell_mean_price: means.iter().copied().fold(f64::INFINITY, f64::min),
        max_cell_mean_price: means.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg_cell_mean_price: mean(&means),
    }
}

impl RunSummary {
    pub fn report(&self) {
        info!(
            cells = self.cells,
            total_listings = self.total_listings,
            avg_listings_per_cell = self.avg_listings_per_cell,
            min_cell_mean_price = self.min_cell_mean_price,
            max_cell_mean_price = self.max_cell_mean_price,
            avg_cell_mean_price = self.avg_cell_mean_price,
            "Run summary"
        );
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
