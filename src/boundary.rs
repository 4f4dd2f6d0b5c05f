//! GeoJSON parser for city boundary polygons.

use std::path::{Path, PathBuf};

use geo::{LineString, Polygon};
use geojson::{GeoJson, Value};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("failed to read boundary file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed boundary document: {0}")]
    Parse(#[from] geojson::Error),

    #[error("boundary document contains no geometry")]
    Empty,

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(&'static str),

    #[error("degenerate boundary ring: {0}")]
    Ring(String),
}

/// Reads and parses a boundary file into its outer ring polygon.
pub fn load_boundary(path: &Path) -> Result<Polygon<f64>, BoundaryError> {
    let contents = std::fs::read_to_string(path).map_err(|source| BoundaryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_boundary(&contents)
}

/// Parses a GeoJSON document into the outer ring of its boundary polygon.
///
/// The document may be a FeatureCollection (first feature is used), a single
/// Feature, or a bare Geometry. A `MultiPolygon` contributes only its first
/// member polygon; the rest are ignored. Interior rings (holes) are dropped.
///
/// # Errors
///
/// Returns an error if the document is not valid GeoJSON, carries no
/// geometry, or its geometry is neither `Polygon` nor `MultiPolygon`.
pub fn parse_boundary(contents: &str) -> Result<Polygon<f64>, BoundaryError> {
    let document: GeoJson = contents.parse()?;

    let value = match document {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .next()
            .and_then(|feature| feature.geometry)
            .ok_or(BoundaryError::Empty)?
            .value,
        GeoJson::Feature(feature) => feature.geometry.ok_or(BoundaryError::Empty)?.value,
        GeoJson::Geometry(geometry) => geometry.value,
    };

    let outer_ring = match value {
        Value::Polygon(rings) => rings.into_iter().next(),
        Value::MultiPolygon(mut polygons) => {
            if polygons.len() > 1 {
                // Documented limitation: only the first member polygon is used.
                warn!(
                    ignored = polygons.len() - 1,
                    "boundary is a MultiPolygon; using first member only"
                );
            }
            if polygons.is_empty() {
                None
            } else {
                polygons.swap_remove(0).into_iter().next()
            }
        }
        other => return Err(BoundaryError::UnsupportedGeometry(type_name(&other))),
    }
    .ok_or(BoundaryError::Empty)?;

    if outer_ring.len() < 4 {
        return Err(BoundaryError::Ring(format!(
            "outer ring has {} positions, need at least 4",
            outer_ring.len()
        )));
    }

    let mut vertices = Vec::with_capacity(outer_ring.len());
    for position in &outer_ring {
        if position.len() < 2 {
            return Err(BoundaryError::Ring(format!(
                "position has {} ordinates, need at least 2",
                position.len()
            )));
        }
        vertices.push((position[0], position[1]));
    }

    // Polygon::new closes an open exterior ring, so the first == last
    // invariant holds regardless of the source document.
    Ok(Polygon::new(LineString::from(vertices), vec![]))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
